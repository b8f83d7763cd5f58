use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    Internal(String),
    BadRequest(String),
    UnsafePath(String),
    NotFound(String),
    Download(String),
    Upload(String),
    Search(String),
    Device(String),
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::Internal(_) => "internal_error",
            AppError::BadRequest(_) => "invalid_request",
            AppError::UnsafePath(_) => "unsafe_path",
            AppError::NotFound(_) => "not_found",
            AppError::Download(_) => "download_failed",
            AppError::Upload(_) => "upload_failed",
            AppError::Search(_) => "search_failed",
            AppError::Device(_) => "device_unreachable",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UnsafePath(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Download(_) => StatusCode::BAD_GATEWAY,
            AppError::Upload(_) => StatusCode::BAD_GATEWAY,
            AppError::Search(_) => StatusCode::BAD_GATEWAY,
            AppError::Device(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Internal(e) => {
                tracing::error!("internal error: {e}");
                "internal server error".to_string()
            }
            AppError::Download(e) => {
                tracing::error!("download error: {e}");
                format!("download failed: {e}")
            }
            AppError::Upload(e) => {
                tracing::error!("device upload error: {e}");
                format!("upload to device failed: {e}")
            }
            AppError::Search(e) => {
                tracing::error!("search error: {e}");
                format!("search failed: {e}")
            }
            AppError::Device(e) => {
                tracing::error!("device error: {e}");
                format!("device request failed: {e}")
            }
            AppError::BadRequest(msg) => msg.clone(),
            AppError::UnsafePath(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Internal(msg)
            | AppError::BadRequest(msg)
            | AppError::UnsafePath(msg)
            | AppError::NotFound(msg)
            | AppError::Download(msg)
            | AppError::Upload(msg)
            | AppError::Search(msg)
            | AppError::Device(msg) => write!(f, "{}: {msg}", self.code()),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.message()
            }
        });

        (status, Json(body)).into_response()
    }
}
