//! Error-to-HTTP response conversion for the static asset routes.
//!
//! Responses carry only a status line and a short plain-text body; nothing
//! about the filesystem layout leaks to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use casecraft_common::Error;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct StaticError(pub Error);

impl From<Error> for StaticError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl From<std::io::Error> for StaticError {
    fn from(e: std::io::Error) -> Self {
        Self(Error::Io(e))
    }
}

impl StaticError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            // Rejected paths look exactly like missing files.
            Error::NotFound(_) | Error::InvalidInput(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for StaticError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.0, "Failed to serve static file");
        } else {
            tracing::debug!(error = %self.0, "Static file not served");
        }

        let reason = status.canonical_reason().unwrap_or("Error");
        (status, reason).into_response()
    }
}
