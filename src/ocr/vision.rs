//! OCR using the Google Cloud Vision API.
//!
//! Calls the `images:annotate` REST endpoint with a `TEXT_DETECTION` feature
//! request. Requires a `GOOGLE_VISION_API_KEY`. The endpoint may be
//! overridden with `GOOGLE_VISION_API_BASE`, which the tests use to point the
//! engine at a mock server.

use base64::{Engine as _, prelude::BASE64_STANDARD};
use serde::{Deserialize, Serialize};

use crate::prelude::*;

use super::{OcrEngine, OcrImage};

/// The real Vision endpoint.
const DEFAULT_API_BASE: &str = "https://vision.googleapis.com/v1";

/// OCR engine wrapping the Google Cloud Vision API.
pub struct VisionOcrEngine {
    /// HTTP client, shared across requests.
    client: reqwest::Client,

    /// Base URL for the Vision API.
    api_base: String,

    /// API key, sent as a query parameter.
    api_key: String,
}

#[derive(Debug, Serialize)]
struct AnnotateRequest {
    requests: Vec<AnnotateImageRequest>,
}

#[derive(Debug, Serialize)]
struct AnnotateImageRequest {
    image: RequestImage,
    features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
struct RequestImage {
    content: String,
}

#[derive(Debug, Serialize)]
struct Feature {
    r#type: String,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    text_annotations: Vec<TextAnnotation>,
    error: Option<ResponseStatus>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    description: String,
}

#[derive(Debug, Deserialize)]
struct ResponseStatus {
    message: String,
}

impl VisionOcrEngine {
    /// Create a new `vision` engine from environment credentials.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GOOGLE_VISION_API_KEY")
            .context("GOOGLE_VISION_API_KEY must be set to use the `vision` engine")?;
        let api_base = std::env::var("GOOGLE_VISION_API_BASE")
            .unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        Ok(Self::new(api_base, api_key))
    }

    /// Create a new `vision` engine against a specific endpoint.
    pub fn new(api_base: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base,
            api_key,
        }
    }
}

#[async_trait]
impl OcrEngine for VisionOcrEngine {
    #[instrument(level = "debug", skip_all, fields(mime_type = %image.mime_type))]
    async fn detect_text(&self, image: &OcrImage) -> Result<String> {
        let body = AnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: RequestImage {
                    content: BASE64_STANDARD.encode(&image.data),
                },
                features: vec![Feature {
                    r#type: "TEXT_DETECTION".to_string(),
                }],
            }],
        };

        let url = format!("{}/images:annotate", self.api_base);
        let response = self
            .client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await
            .context("cannot reach the Vision API")?
            .error_for_status()
            .context("Vision API request failed")?
            .json::<AnnotateResponse>()
            .await
            .context("cannot parse the Vision API response")?;

        let annotated = response.responses.into_iter().next().unwrap_or_default();
        if let Some(error) = annotated.error {
            return Err(anyhow!("Vision API error: {}", error.message));
        }

        // The first annotation spans the whole image; the rest repeat the
        // same text word by word.
        let text = annotated
            .text_annotations
            .into_iter()
            .next()
            .map(|annotation| annotation.description)
            .unwrap_or_default();
        debug!(%text, "Extracted text");
        Ok(text)
    }
}
