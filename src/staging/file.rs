//! Candidate and staged file types.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::FileReadError;

use super::preview::PreviewSlot;

/// Where a file's bytes live.
///
/// Cloning never copies the bytes.
#[derive(Clone)]
pub enum FileContents {
    /// Bytes already in memory
    Memory(Rc<[u8]>),
    /// Browser file handle, read only when the file is uploaded
    #[cfg(target_arch = "wasm32")]
    Blob(web_sys::Blob),
}

/// A file handed over by a file input or drop zone, before validation.
///
/// Validation looks only at the metadata; the bytes are read on upload.
#[derive(Clone)]
pub struct RawFile {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    /// Milliseconds since the Unix epoch, when the source reports it
    pub last_modified: Option<u64>,
    pub contents: FileContents,
}

impl RawFile {
    /// Create an in-memory file whose size is the length of its contents.
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        contents: impl Into<Rc<[u8]>>,
    ) -> Self {
        let contents = contents.into();
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size: contents.len() as u64,
            last_modified: None,
            contents: FileContents::Memory(contents),
        }
    }

    /// Create an in-memory file with a size reported by the source.
    pub fn from_parts(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        size: u64,
        contents: impl Into<Rc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size,
            last_modified: None,
            contents: FileContents::Memory(contents.into()),
        }
    }

    /// Wrap a browser `File` without reading it.
    ///
    /// Name, type, size and modification time come from the handle.
    #[cfg(target_arch = "wasm32")]
    pub fn from_browser_file(file: web_sys::File) -> Self {
        Self {
            name: file.name(),
            mime_type: file.type_(),
            size: file.size() as u64,
            last_modified: Some(file.last_modified() as u64),
            contents: FileContents::Blob(file.into()),
        }
    }

    pub fn with_last_modified(mut self, last_modified: u64) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    /// Check whether the declared MIME type is an image type.
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image")
    }

    /// Load the file's bytes.
    pub async fn read_bytes(&self) -> Result<Rc<[u8]>, FileReadError> {
        match &self.contents {
            FileContents::Memory(bytes) => Ok(bytes.clone()),
            #[cfg(target_arch = "wasm32")]
            FileContents::Blob(blob) => {
                let buffer = wasm_bindgen_futures::JsFuture::from(blob.array_buffer())
                    .await
                    .map_err(|e| FileReadError {
                        name: self.name.clone(),
                        reason: format!("{:?}", e),
                    })?;
                Ok(js_sys::Uint8Array::new(&buffer).to_vec().into())
            }
        }
    }
}

impl fmt::Debug for RawFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.size)
            .field("last_modified", &self.last_modified)
            .finish_non_exhaustive()
    }
}

/// How staged files are keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdentityPolicy {
    /// Key by file name; a later file with the same name replaces the earlier one
    #[default]
    Name,
    /// Key by name, size and modification time
    Composite,
}

impl IdentityPolicy {
    /// Derive the staging key for a file under this policy.
    pub fn identity_of(&self, file: &RawFile) -> FileIdentity {
        match self {
            IdentityPolicy::Name => FileIdentity(file.name.clone()),
            IdentityPolicy::Composite => FileIdentity(format!(
                "{}:{}:{}",
                file.name,
                file.size,
                file.last_modified.unwrap_or(0)
            )),
        }
    }
}

/// Key of a staged file, unique within a staging set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileIdentity(String);

impl FileIdentity {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileIdentity {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

/// A file that passed validation and waits for submit.
#[derive(Debug)]
pub(crate) struct StagedFile {
    pub(crate) identity: FileIdentity,
    /// Distinguishes a replacement from the entry it superseded
    pub(crate) serial: u64,
    pub(crate) raw: RawFile,
    pub(crate) preview: PreviewSlot,
}

impl StagedFile {
    pub(crate) fn new(identity: FileIdentity, serial: u64, raw: RawFile) -> Self {
        Self {
            identity,
            serial,
            raw,
            preview: PreviewSlot::default(),
        }
    }
}

/// Read-only view of a staged file for rendering the pending list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFileInfo {
    pub identity: FileIdentity,
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    /// Display string produced by [`format_size`](super::format_size)
    pub size_label: String,
}

impl From<&StagedFile> for StagedFileInfo {
    fn from(file: &StagedFile) -> Self {
        Self {
            identity: file.identity.clone(),
            name: file.raw.name.clone(),
            mime_type: file.raw.mime_type.clone(),
            size: file.raw.size,
            size_label: super::format_size(file.raw.size),
        }
    }
}
