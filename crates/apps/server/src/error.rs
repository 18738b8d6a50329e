use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use structure::FormatError;

/// Why `/api/protein` could not produce filtered structure text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// No identifier in the request.
    MissingInput,
    /// Upstream answered with a non-success status.
    Upstream { status: u16, reason: String },
    /// Upstream could not be reached or its body could not be read.
    Transport(String),
    /// Upstream body is not a structure file.
    InvalidFormat,
}

impl FetchError {
    pub fn transport(err: impl fmt::Display) -> Self {
        FetchError::Transport(err.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            FetchError::MissingInput => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::MissingInput => write!(f, "Protein ID is required"),
            FetchError::Upstream { reason, .. } => {
                write!(f, "Failed to fetch protein data: {reason}")
            }
            FetchError::Transport(msg) => write!(f, "Failed to fetch protein data: {msg}"),
            FetchError::InvalidFormat => write!(f, "Invalid PDB data received"),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<FormatError> for FetchError {
    fn from(err: FormatError) -> Self {
        match err {
            FormatError::InvalidFormat => FetchError::InvalidFormat,
        }
    }
}

impl IntoResponse for FetchError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.to_string() });
        (self.status_code(), Json(body)).into_response()
    }
}
