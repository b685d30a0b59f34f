//! Global constants for the station media core

use std::time::Duration;

/// Largest file the staging engine accepts, in bytes (20 MB).
pub const MAX_UPLOAD_BYTES: u64 = 20_000_000;

/// MIME prefix every staged file must carry.
pub const IMAGE_MIME_PREFIX: &str = "image/";

/// Image substituted for a slide whose resource failed to load.
pub const FALLBACK_SLIDE: &str = "/images/banners/1.jpg";

/// Banners shown while the station has nothing published.
pub const PLACEHOLDER_SLIDES: &[&str] = &[
    "/images/banners/1.jpg",
    "/images/banners/2.jpg",
    "/images/banners/3.jpg",
    "/images/banners/4.jpg",
    "/images/banners/5.jpg",
];

/// Default delay between automatic carousel advances.
pub const DEFAULT_AUTOPLAY_INTERVAL: Duration = Duration::from_secs(5);

/// Default document-management server.
pub const DEFAULT_SERVER_ADDRESS: &str = "https://juice-box.info/";

/// Multipart field carrying the station identifier on upload.
pub const STATION_FIELD: &str = "imei";

/// Multipart field carrying each uploaded file.
pub const FILES_FIELD: &str = "files";
