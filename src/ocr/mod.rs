//! OCR engine interface.

use std::sync::Arc;

use crate::prelude::*;

pub mod tesseract;
pub mod vision;

/// An image submitted for text recognition.
pub struct OcrImage {
    /// Raw image bytes.
    pub data: Vec<u8>,

    /// The image's MIME type.
    pub mime_type: String,
}

impl OcrImage {
    /// Build an image from uploaded bytes, sniffing the MIME type when the
    /// upload didn't declare one.
    pub fn new(data: Vec<u8>, declared_mime_type: Option<String>) -> Self {
        let mime_type = declared_mime_type
            .or_else(|| infer::get(&data).map(|kind| kind.mime_type().to_string()))
            .unwrap_or_else(|| "application/octet-stream".to_string());
        Self { data, mime_type }
    }
}

/// Interface to an OCR engine.
#[async_trait]
pub trait OcrEngine: Send + Sync + 'static {
    /// Recognize the text in an image.
    ///
    /// Returns the document's full text with lines separated by `\n`, or an
    /// empty string when the backend finds no text at all. Transport, auth
    /// and quota failures surface as errors.
    async fn detect_text(&self, image: &OcrImage) -> Result<String>;
}

/// Get the OCR engine with the specified name.
pub fn ocr_engine_for_name(name: &str) -> Result<Arc<dyn OcrEngine>> {
    match name {
        "vision" => Ok(Arc::new(vision::VisionOcrEngine::from_env()?)),
        "tesseract" => Ok(Arc::new(tesseract::TesseractOcrEngine::new())),
        _ => Err(anyhow!("unknown OCR engine: {name}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_type_sniffing() {
        let png_magic = b"\x89PNG\r\n\x1a\n".to_vec();
        let image = OcrImage::new(png_magic, None);
        assert_eq!(image.mime_type, "image/png");
    }

    #[test]
    fn test_declared_mime_type_wins() {
        let image = OcrImage::new(vec![0u8; 4], Some("image/jpeg".to_string()));
        assert_eq!(image.mime_type, "image/jpeg");
    }

    #[test]
    fn test_unrecognized_bytes_fall_back_to_octet_stream() {
        let image = OcrImage::new(vec![0u8; 4], None);
        assert_eq!(image.mime_type, "application/octet-stream");
    }

    #[test]
    fn test_unknown_engine_name_is_an_error() {
        assert!(ocr_engine_for_name("daguerreotype").is_err());
    }
}
