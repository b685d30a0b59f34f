//! Preview handles for staged files.
//!
//! A preview is a transient, revocable URL (an object URL in the browser).
//! Each staged file owns at most one, created the first time it is rendered
//! and revoked exactly once when the file leaves the staging set.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use thiserror::Error;

use super::file::RawFile;

/// Failed to create a preview handle.
#[derive(Error, Debug)]
#[error("Preview unavailable: {0}")]
pub struct PreviewError(pub String);

/// Source of revocable preview URLs.
pub trait PreviewProvider {
    /// Create a renderable URL for the file's bytes.
    fn create(&self, file: &RawFile) -> Result<String, PreviewError>;

    /// Release a URL created by [`create`](Self::create).
    ///
    /// Revoking an unknown or already revoked URL must be a no-op.
    fn revoke(&self, url: &str);
}

/// What the pending list should show for a staged file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewDescriptor {
    /// Thumbnail of the image itself
    Image {
        /// Renderable URL
        url: String,
        /// Alt text (the file name)
        alt: String,
    },
    /// Generic document icon
    Document,
}

/// Lazily created preview handle owned by one staged file.
#[derive(Debug, Default)]
pub(crate) struct PreviewSlot {
    url: Option<String>,
}

impl PreviewSlot {
    /// Return the existing handle or create one.
    pub(crate) fn get_or_create(
        &mut self,
        provider: &dyn PreviewProvider,
        file: &RawFile,
    ) -> Result<String, PreviewError> {
        if let Some(url) = &self.url {
            return Ok(url.clone());
        }

        let url = provider.create(file)?;
        log::debug!("🖼️ Created preview for {}: {}", file.name, url);
        self.url = Some(url.clone());
        Ok(url)
    }

    /// Revoke the handle if one was created. Safe to call repeatedly.
    pub(crate) fn release(&mut self, provider: &dyn PreviewProvider) {
        if let Some(url) = self.url.take() {
            log::debug!("🖼️ Revoking preview {}", url);
            provider.revoke(&url);
        }
    }

    pub(crate) fn is_created(&self) -> bool {
        self.url.is_some()
    }
}

/// In-memory preview provider for native hosts and tests.
///
/// Issues opaque `blob:memory/...` URLs and tracks which ones are still live.
#[derive(Debug, Default)]
pub struct MemoryPreviewProvider {
    next_id: Cell<u64>,
    live: RefCell<HashSet<String>>,
    revoked: Cell<usize>,
}

impl MemoryPreviewProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles created and not yet revoked.
    pub fn live_count(&self) -> usize {
        self.live.borrow().len()
    }

    pub fn is_live(&self, url: &str) -> bool {
        self.live.borrow().contains(url)
    }

    /// Number of successful revocations.
    pub fn revoked_count(&self) -> usize {
        self.revoked.get()
    }
}

impl PreviewProvider for MemoryPreviewProvider {
    fn create(&self, file: &RawFile) -> Result<String, PreviewError> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let url = format!("blob:memory/{}/{}", id, file.name);
        self.live.borrow_mut().insert(url.clone());
        Ok(url)
    }

    fn revoke(&self, url: &str) {
        if self.live.borrow_mut().remove(url) {
            self.revoked.set(self.revoked.get() + 1);
        }
    }
}

/// Object URL provider backed by the browser's `URL.createObjectURL`.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct BlobUrlProvider;

#[cfg(target_arch = "wasm32")]
impl PreviewProvider for BlobUrlProvider {
    fn create(&self, file: &RawFile) -> Result<String, PreviewError> {
        use super::file::FileContents;
        use web_sys::{Blob, BlobPropertyBag, Url};

        let blob = match &file.contents {
            // Browser files are referenced directly, never copied
            FileContents::Blob(blob) => blob.clone(),
            FileContents::Memory(bytes) => {
                let bytes = js_sys::Uint8Array::from(&bytes[..]);
                let parts = js_sys::Array::of1(&bytes);

                let options = BlobPropertyBag::new();
                options.set_type(&file.mime_type);

                Blob::new_with_u8_array_sequence_and_options(&parts, &options)
                    .map_err(|e| PreviewError(format!("{:?}", e)))?
            }
        };

        Url::create_object_url_with_blob(&blob).map_err(|e| PreviewError(format!("{:?}", e)))
    }

    fn revoke(&self, url: &str) {
        if let Err(e) = web_sys::Url::revoke_object_url(url) {
            log::warn!("Failed to revoke object URL {}: {:?}", url, e);
        }
    }
}
