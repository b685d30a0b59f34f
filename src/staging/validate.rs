//! Acceptance predicate for candidate files.

use crate::config::StagingConfig;
use crate::error::Rejection;

use super::file::RawFile;

/// Check a candidate file against the category and size rules.
///
/// The category rule runs first, so a file failing both is reported as the
/// wrong type.
pub fn check(file: &RawFile, rules: &StagingConfig) -> Result<(), Rejection> {
    if !file.mime_type.starts_with(rules.mime_prefix.as_str()) {
        return Err(Rejection::NotAnImage {
            name: file.name.clone(),
        });
    }

    if file.size > rules.max_file_bytes {
        return Err(Rejection::TooLarge {
            name: file.name.clone(),
            size: file.size,
            limit: rules.max_file_bytes,
        });
    }

    Ok(())
}
