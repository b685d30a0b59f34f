//! Station Media - staging and carousel core for the station screen dashboard
//!
//! Operators pick images, review them with previews, and upload them in one
//! batch to a station. Published images play in a looping carousel.
//!
//! - [`staging`]: validation, previews and the single-flight upload engine
//! - [`carousel`]: slide index, navigation and image-failure fallback
//! - [`api`]: the document-management API seam and its HTTP client
//! - [`page`]: wires the three together around a published image list

pub mod api;
pub mod carousel;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod notify;
pub mod page;
pub mod staging;

pub use api::{DocumentApi, HttpDocumentApi};
pub use carousel::CarouselController;
pub use config::AppConfig;
pub use error::{Rejection, SubmitError, TransferError};
pub use notify::{NotificationPort, Severity};
pub use page::PageController;
pub use staging::{RawFile, StagingEngine};

// WASM entry point
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::*;
