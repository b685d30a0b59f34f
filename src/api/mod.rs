//! Document-management API client.
//!
//! The backend is an external collaborator: the rest of the crate only sees
//! the [`DocumentApi`] trait, so hosts and tests can swap the transport.

mod error;
mod http;
mod model;

use std::rc::Rc;

use async_trait::async_trait;

use crate::error::TransferError;
use crate::staging::{RawFile, Uploader};

pub use error::ApiError;
pub use http::HttpDocumentApi;
pub use model::{AdConfig, ResourceId, ResourceRecord, parse_listing, sort_by_seq};

/// List, delete and upload operations on a station's published resources.
#[async_trait(?Send)]
pub trait DocumentApi {
    /// Fetch the published records, in server order.
    async fn list_resources(&self) -> Result<Vec<ResourceRecord>, ApiError>;

    /// Delete one published record.
    async fn delete_resource(&self, id: &ResourceId) -> Result<(), ApiError>;

    /// Upload a batch of files in one request.
    async fn upload_resources(&self, files: &[RawFile]) -> Result<(), ApiError>;
}

/// Adapts a [`DocumentApi`] to the staging engine's [`Uploader`] seam.
pub struct DocumentUploader {
    api: Rc<dyn DocumentApi>,
}

impl DocumentUploader {
    pub fn new(api: Rc<dyn DocumentApi>) -> Self {
        Self { api }
    }
}

#[async_trait(?Send)]
impl Uploader for DocumentUploader {
    async fn upload(&self, files: &[RawFile]) -> Result<(), TransferError> {
        self.api.upload_resources(files).await?;
        Ok(())
    }
}
