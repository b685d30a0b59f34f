//! Browser entry point and `FileList` conversion.

use wasm_bindgen::prelude::*;
use web_sys::FileList;

use crate::config::AppConfig;
use crate::staging::RawFile;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();

    let config = AppConfig::load_or_create();
    crate::logging::init(config.log_level.to_level_filter());
    log::info!("📥 Station media core loaded");
}

/// Wrap every file of a picker or drop selection.
///
/// Nothing is read here: staging validates the metadata, and only accepted
/// files are read, when they are uploaded.
pub fn files_from_list(list: &FileList) -> Vec<RawFile> {
    let files: Vec<RawFile> = (0..list.length())
        .filter_map(|index| list.get(index))
        .map(RawFile::from_browser_file)
        .collect();

    log::debug!("📥 {} files selected", files.len());
    files
}
