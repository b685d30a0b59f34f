//! File staging: validation, the pending set, previews and submit.

mod engine;
mod file;
mod preview;
mod size;
mod validate;

pub use engine::{StagingEngine, SubmitReceipt, Uploader};
pub use file::{FileContents, FileIdentity, IdentityPolicy, RawFile, StagedFileInfo};
#[cfg(target_arch = "wasm32")]
pub use preview::BlobUrlProvider;
pub use preview::{MemoryPreviewProvider, PreviewDescriptor, PreviewError, PreviewProvider};
pub use size::format_size;
pub use validate::check as check_acceptance;
