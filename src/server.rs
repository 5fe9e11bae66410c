//! The HTTP server and its upload endpoint.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::{
    fields::ExtractedFields,
    ocr::{OcrEngine, OcrImage},
    payload::ResponsePayload,
    prelude::*,
};

/// Shared state for request handlers.
///
/// The OCR engine is injected here rather than held in a global, so tests can
/// run the router over a fake backend.
#[derive(Clone)]
pub struct AppState {
    pub ocr_engine: Arc<dyn OcrEngine>,
}

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check for container orchestration
        .route("/health", get(health))
        .route("/upload", post(upload))
        // Phone photos of ID cards routinely exceed axum's 2 MB default.
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024))
        // The browser frontend is served from another origin.
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check.
async fn health() -> &'static str {
    "ok"
}

/// A JSON error body with the given status.
fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Accept an uploaded document image and extract identity fields from it.
#[instrument(level = "debug", skip_all)]
async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    // Pull the `file` part out of the form, skipping any other parts.
    let mut image = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("file") => {
                let mime_type = field.content_type().map(str::to_string);
                match field.bytes().await {
                    Ok(bytes) => image = Some(OcrImage::new(bytes.to_vec(), mime_type)),
                    Err(e) => {
                        debug!("cannot read upload: {e}");
                        return error_response(StatusCode::BAD_REQUEST, "Invalid upload");
                    }
                }
                break;
            }
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(e) => {
                debug!("malformed multipart body: {e}");
                return error_response(StatusCode::BAD_REQUEST, "Invalid upload");
            }
        }
    }
    let Some(image) = image else {
        return error_response(StatusCode::BAD_REQUEST, "No file provided");
    };

    let text = match state.ocr_engine.detect_text(&image).await {
        Ok(text) => text,
        Err(e) => {
            error!("OCR failed: {e:#}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Text detection failed");
        }
    };

    let fields = ExtractedFields::parse(&text);
    Json(ResponsePayload::from(fields)).into_response()
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, header},
    };
    use http_body_util::BodyExt as _;
    use serde_json::json;
    use tower::util::ServiceExt as _;

    use super::*;

    /// An OCR engine returning canned results.
    struct FakeOcrEngine {
        result: std::result::Result<String, String>,
    }

    #[async_trait]
    impl OcrEngine for FakeOcrEngine {
        async fn detect_text(&self, _image: &OcrImage) -> Result<String> {
            match &self.result {
                Ok(text) => Ok(text.clone()),
                Err(message) => Err(anyhow!("{message}")),
            }
        }
    }

    fn test_router(result: std::result::Result<&str, &str>) -> Router {
        let engine = FakeOcrEngine {
            result: result.map(str::to_string).map_err(str::to_string),
        };
        create_router(AppState {
            ocr_engine: Arc::new(engine),
        })
    }

    const BOUNDARY: &str = "test-boundary";

    /// Build a multipart upload request with a single named part.
    fn upload_request(field_name: &str) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field_name}\"; filename=\"id.png\"\r\n\
             Content-Type: image/png\r\n\
             \r\n\
             fake image bytes\r\n\
             --{BOUNDARY}--\r\n"
        );
        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_upload_extracts_and_post_processes_fields() {
        let text = "ID 123 456 789\nWORTHINGTON\nJONATHAN CARL\nDOB: 05/12/1990\nSEX: F\n";
        let app = test_router(Ok(text));
        let response = app.oneshot(upload_request("file")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({
                "first_name": "JONATHAN",
                "middle_name": "CARL",
                "last_name": "WORTHINGTO",
                "dob": "05/12/1990",
                "gender": "Female",
                "combined": "JONATHANWO",
            })
        );
    }

    #[tokio::test]
    async fn test_upload_with_no_text_returns_empty_object() {
        let app = test_router(Ok(""));
        let response = app.oneshot(upload_request("file")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({}));
    }

    #[tokio::test]
    async fn test_missing_file_field_is_a_client_error() {
        let app = test_router(Ok("unused"));
        let response = app.oneshot(upload_request("document")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({ "error": "No file provided" }));
    }

    #[tokio::test]
    async fn test_ocr_failure_is_a_server_error() {
        let app = test_router(Err("quota exceeded"));
        let response = app.oneshot(upload_request("file")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Text detection failed" })
        );
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = test_router(Ok("unused"));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
