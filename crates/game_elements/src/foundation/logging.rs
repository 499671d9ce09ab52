//! Logging setup and re-exports for scene drivers.

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system for a driver binary.
pub fn init() {
    env_logger::init();
}

/// Initialize logging, tolerating repeated calls (tests, embedded drivers).
pub fn try_init() {
    let _ = env_logger::builder().try_init();
}
