//! Tesseract OCR engine.
//!
//! Shells out to the `tesseract` CLI tool. Handy for credential-free local
//! runs, and the second implementation keeping the engine trait honest.

use std::{
    fs::{File, read_to_string},
    io::Write as _,
};

use tokio::process::Command;

use crate::prelude::*;

use super::{OcrEngine, OcrImage};

/// OCR engine wrapping the `tesseract` CLI tool.
#[derive(Default)]
#[non_exhaustive]
pub struct TesseractOcrEngine {}

impl TesseractOcrEngine {
    /// Create a new `tesseract` engine.
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl OcrEngine for TesseractOcrEngine {
    #[instrument(level = "debug", skip_all, fields(mime_type = %image.mime_type))]
    async fn detect_text(&self, image: &OcrImage) -> Result<String> {
        let extension = mime_guess::get_mime_extensions_str(&image.mime_type)
            .and_then(|extensions| extensions.first())
            .ok_or_else(|| anyhow!("cannot determine extension for {}", image.mime_type))?;

        // Write our input to a temporary file.
        let tmpdir = tempfile::TempDir::with_prefix("tesseract")?;
        let input_path = tmpdir.path().join(format!("input.{}", extension));
        let output_path = tmpdir.path().join("output.txt");
        let mut input_file =
            File::create(&input_path).context("cannot create tesseract input file")?;
        input_file
            .write_all(&image.data)
            .context("cannot write tesseract input file")?;
        input_file
            .flush()
            .context("cannot flush tesseract input file")?;

        // Run tesseract on the input file.
        let output = Command::new("tesseract")
            .arg(input_path)
            .arg(output_path.with_extension(""))
            .output()
            .await
            .context("cannot run tesseract")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("tesseract failed: {}", stderr.trim()));
        }

        // Read the output file.
        read_to_string(&output_path).context("cannot read tesseract output file")
    }
}
