//! Error types shared by the staging engine and its hosts.

use thiserror::Error;

use crate::api::ApiError;

/// A candidate file that failed the acceptance predicate.
///
/// The display text is what the user sees.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// MIME type is not an image type
    #[error("File {name} is not an image file.")]
    NotAnImage {
        /// Name of the rejected file
        name: String,
    },

    /// File exceeds the size ceiling
    #[error("File {name} is too large. Maximum size is {} MB.", .limit / 1_000_000)]
    TooLarge {
        /// Name of the rejected file
        name: String,
        /// Size of the rejected file in bytes
        size: u64,
        /// Ceiling in bytes
        limit: u64,
    },
}

impl Rejection {
    /// Name of the file this rejection refers to.
    pub fn file_name(&self) -> &str {
        match self {
            Rejection::NotAnImage { name } | Rejection::TooLarge { name, .. } => name,
        }
    }
}

/// A staged file's bytes could not be loaded for upload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Could not read file {name}: {reason}")]
pub struct FileReadError {
    /// Name of the unreadable file
    pub name: String,
    /// What the source reported
    pub reason: String,
}

/// The injected transfer operation failed.
#[derive(Error, Debug)]
pub enum TransferError {
    /// Document API request failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Any other uploader failure
    #[error("Transfer failed: {0}")]
    Other(String),
}

impl TransferError {
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

/// Errors returned by [`StagingEngine::submit`](crate::staging::StagingEngine::submit).
#[derive(Error, Debug)]
pub enum SubmitError {
    /// Submit requested with nothing staged
    #[error("Please select files to upload.")]
    EmptySubmission,

    /// A submit is already in flight
    #[error("An upload is already in progress.")]
    Busy,

    /// The uploader rejected the batch
    #[error("Upload failed: {0}")]
    Transfer(#[from] TransferError),
}
