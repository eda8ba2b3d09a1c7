//! Tracing/logging setup shared by every binary and test harness.

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use crate::tracing::{LogConfig, LogFormat, LogFormatError};

/// Initialize process-wide logging from `config`.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init(config: &LogConfig) {
    crate::tracing::init(config);
}

/// Initialize process-wide logging from `RUST_LOG` with JSON output.
pub fn init_from_env() {
    crate::tracing::init(&LogConfig::from_env());
}
