//! Configuration file support.
//!
//! Settings are stored as versioned JSON: in the user's config directory on
//! native builds and in `localStorage` in the browser.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_AUTOPLAY_INTERVAL, DEFAULT_SERVER_ADDRESS, FALLBACK_SLIDE, IMAGE_MIME_PREFIX,
    MAX_UPLOAD_BYTES, PLACEHOLDER_SLIDES,
};
use crate::staging::IdentityPolicy;

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Document-management backend
    #[serde(default)]
    pub server: ServerConfig,

    /// File acceptance rules
    #[serde(default)]
    pub staging: StagingConfig,

    /// Carousel behavior
    #[serde(default)]
    pub carousel: CarouselConfig,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Backend location and the station being managed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the document-management API
    #[serde(default = "default_server_address")]
    pub address: String,

    /// Station identifier (the screen device's IMEI)
    #[serde(default = "default_station_id")]
    pub station_id: String,
}

fn default_server_address() -> String {
    DEFAULT_SERVER_ADDRESS.to_string()
}

fn default_station_id() -> String {
    "1735781913".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_server_address(),
            station_id: default_station_id(),
        }
    }
}

/// Rules the staging engine applies to candidate files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingConfig {
    /// Largest accepted file in bytes
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,

    /// Required MIME type prefix
    #[serde(default = "default_mime_prefix")]
    pub mime_prefix: String,

    /// How staged files are keyed
    #[serde(default)]
    pub identity_policy: IdentityPolicy,
}

fn default_max_file_bytes() -> u64 {
    MAX_UPLOAD_BYTES
}

fn default_mime_prefix() -> String {
    IMAGE_MIME_PREFIX.to_string()
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            mime_prefix: default_mime_prefix(),
            identity_policy: IdentityPolicy::default(),
        }
    }
}

/// Carousel settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarouselConfig {
    /// Advance automatically
    #[serde(default)]
    pub autoplay: bool,

    /// Delay between automatic advances, in milliseconds
    #[serde(default = "default_autoplay_interval_ms")]
    pub autoplay_interval_ms: u64,

    /// Image shown in place of a slide that failed to load
    #[serde(default = "default_fallback_slide")]
    pub fallback_slide: String,

    /// Slides shown while nothing is published
    #[serde(default = "default_placeholder_slides")]
    pub placeholder_slides: Vec<String>,
}

fn default_autoplay_interval_ms() -> u64 {
    DEFAULT_AUTOPLAY_INTERVAL.as_millis() as u64
}

fn default_fallback_slide() -> String {
    FALLBACK_SLIDE.to_string()
}

fn default_placeholder_slides() -> Vec<String> {
    PLACEHOLDER_SLIDES.iter().map(|s| s.to_string()).collect()
}

impl CarouselConfig {
    /// Autoplay interval, or `None` when autoplay is off or the interval is zero.
    pub fn autoplay_interval(&self) -> Option<Duration> {
        (self.autoplay && self.autoplay_interval_ms > 0)
            .then(|| Duration::from_millis(self.autoplay_interval_ms))
    }
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            autoplay: false,
            autoplay_interval_ms: default_autoplay_interval_ms(),
            fallback_slide: default_fallback_slide(),
            placeholder_slides: default_placeholder_slides(),
        }
    }
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            server: ServerConfig::default(),
            staging: StagingConfig::default(),
            carousel: CarouselConfig::default(),
            log_level: LogLevel::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "station-media.json"
    }

    /// Get the default config file path.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<std::path::PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("station-media"))
            .or_else(|| dirs::home_dir().map(|home| home.join(".config").join("station-media")))
            .map(|dir| dir.join(Self::default_filename()))
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        Self::load_from_path(&path)
    }

    /// Try to load configuration from a specific file.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_path(path: &std::path::Path) -> Option<Self> {
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded configuration from {:?}", path);
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse config file {:?}: {}", path, e);
                    None
                }
            },
            Err(e) => {
                log::warn!("Failed to read config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to a specific file, creating parent directories.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_path(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// LocalStorage key for WASM config persistence.
    #[cfg(target_arch = "wasm32")]
    const LOCALSTORAGE_KEY: &'static str = "station-media-config";

    /// Try to load configuration from localStorage (WASM only).
    #[cfg(target_arch = "wasm32")]
    pub fn load_from_local_storage() -> Option<Self> {
        let window = web_sys::window()?;
        let storage = window.local_storage().ok()??;

        match storage.get_item(Self::LOCALSTORAGE_KEY) {
            Ok(Some(json)) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded configuration from localStorage");
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse config from localStorage: {}", e);
                    None
                }
            },
            Ok(None) => {
                log::debug!("No config found in localStorage");
                None
            }
            Err(e) => {
                log::warn!("Failed to read from localStorage: {:?}", e);
                None
            }
        }
    }

    /// Save configuration to localStorage (WASM only).
    #[cfg(target_arch = "wasm32")]
    pub fn save_to_local_storage(&self) -> Result<(), ConfigError> {
        let window = web_sys::window()
            .ok_or_else(|| ConfigError::StorageError("No window object available".to_string()))?;

        let storage = window
            .local_storage()
            .map_err(|e| ConfigError::StorageError(format!("localStorage access error: {:?}", e)))?
            .ok_or_else(|| ConfigError::StorageError("localStorage not available".to_string()))?;

        let json = self.to_json()?;

        storage
            .set_item(Self::LOCALSTORAGE_KEY, &json)
            .map_err(|e| {
                ConfigError::StorageError(format!("Failed to save to localStorage: {:?}", e))
            })?;

        log::info!("Saved configuration to localStorage");
        Ok(())
    }

    /// Load from `path`, writing the defaults there on first run.
    ///
    /// The written file is the template operators edit to point the
    /// dashboard at their server and station.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_or_create_at(path: &std::path::Path) -> Self {
        if let Some(config) = Self::load_from_path(path) {
            return config;
        }
        // Unreadable files are left alone, only missing ones are seeded
        if path.exists() {
            return Self::default();
        }

        let config = Self::default();
        if let Err(e) = config.save_to_path(path) {
            log::warn!("Could not write default configuration: {}", e);
        }
        config
    }

    /// Load from the default path, seeding it with defaults when missing.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_or_create() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_or_create_at(&path),
            None => Self::default(),
        }
    }

    /// Load from localStorage, seeding it with defaults when empty.
    #[cfg(target_arch = "wasm32")]
    pub fn load_or_create() -> Self {
        if let Some(config) = Self::load_from_local_storage() {
            return config;
        }

        let config = Self::default();
        if let Err(e) = config.save_to_local_storage() {
            log::warn!("Could not write default configuration: {}", e);
        }
        config
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Storage error (localStorage in WASM)
    #[error("Storage error: {0}")]
    StorageError(String),
}
