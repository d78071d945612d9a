use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use henthub_store::StoreError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub type Result<T> = std::result::Result<T, EmulatorError>;

#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error("Missing path or content")]
    MissingPathOrContent,

    #[error("Missing appId")]
    MissingAppId,

    #[error("Invalid base64 content for '{path}': {message}")]
    InvalidContent { path: String, message: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(std::io::Error),
}

impl EmulatorError {
    pub fn status(&self) -> StatusCode {
        match self {
            EmulatorError::MissingPathOrContent
            | EmulatorError::MissingAppId
            | EmulatorError::InvalidContent { .. } => StatusCode::BAD_REQUEST,
            EmulatorError::Store(StoreError::InvalidPath(_)) => StatusCode::BAD_REQUEST,
            EmulatorError::Store(StoreError::IndexNotFound(_) | StoreError::AppNotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message sent back in the `{error}` body.
    fn client_message(&self) -> String {
        match self {
            EmulatorError::Store(StoreError::EmptyContent(_)) => {
                "Empty file content received".to_string()
            }
            EmulatorError::Store(StoreError::IndexNotFound(_)) => "Manifest not found".to_string(),
            EmulatorError::Store(StoreError::AppNotFound(_)) => {
                "App not found in manifest".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for EmulatorError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("[ERROR] {}", self);
        }
        (status, Json(json!({ "error": self.client_message() }))).into_response()
    }
}
