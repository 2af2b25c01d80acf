//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system
///
/// Verbosity follows `RUST_LOG`, e.g. `RUST_LOG=marker_engine=debug`.
pub fn init() {
    env_logger::init();
}

/// Initialize logging for tests, ignoring repeated initialization
pub fn try_init_for_tests() {
    let _ = env_logger::builder().is_test(true).try_init();
}
