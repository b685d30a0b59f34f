//! Logger setup for native and browser builds.

use log::LevelFilter;

/// Install the platform logger at `level`.
///
/// Safe to call more than once; later calls only adjust the max level.
#[cfg(not(target_arch = "wasm32"))]
pub fn init(level: LevelFilter) {
    if env_logger::builder()
        .filter_level(level)
        .parse_default_env()
        .try_init()
        .is_err()
    {
        log::set_max_level(level);
    }
}

/// Install the platform logger at `level`.
///
/// Safe to call more than once; later calls only adjust the max level.
#[cfg(target_arch = "wasm32")]
pub fn init(level: LevelFilter) {
    let Some(level) = level.to_level() else {
        log::set_max_level(LevelFilter::Off);
        return;
    };

    if console_log::init_with_level(level).is_err() {
        log::set_max_level(level.to_level_filter());
    }
}
