//! Tracing/logging setup shared by gatekeeper binaries.

/// Initialize process-wide logging.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init(format: LogFormat) {
    tracing::init(format);
}

pub mod tracing;

pub use self::tracing::{LogFormat, ParseLogFormatError};
