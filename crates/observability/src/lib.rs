//! Shared logging setup for the inspection service binaries.

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use crate::tracing::{LogFormat, init_with};

/// Initialize process-wide logging with JSON output and an `info` default filter.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    crate::tracing::init_with(LogFormat::Json, "info");
}
