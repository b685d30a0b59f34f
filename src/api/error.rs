//! Error types for the document API client.

use thiserror::Error;

use crate::error::FileReadError;

/// Errors that can occur while talking to the document-management API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport-level failure (connection, TLS, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP error! status: {status} ({url})")]
    Status {
        /// Response status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Response body was not the expected JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A file's bytes could not be loaded for the request body
    #[error(transparent)]
    Read(#[from] FileReadError),

    /// Configured server address could not be parsed
    #[error("Invalid server address: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Configured server address cannot carry a path
    #[error("Server address cannot be used as a base URL: {0}")]
    CannotBeABase(String),
}

impl ApiError {
    /// Status code of a non-success response, if that is what this is.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
