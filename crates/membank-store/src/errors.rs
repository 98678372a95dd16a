//! Error handling for membank-store
//!
//! Wraps membank-core ExError with store-specific helpers

use membank_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// SQLite messages meaning a statement named a column the table lacks
const OUT_OF_SYNC_MARKERS: &[&str] = &["no such column", "has no column named"];

/// Create a database error from rusqlite::Error
///
/// Column mismatches are classified as `OutOfSync` so the access facade
/// can repair the table; everything else is `Persistence`.
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    let message = err.to_string();
    let kind = if OUT_OF_SYNC_MARKERS.iter().any(|m| message.contains(m)) {
        ExErrorKind::OutOfSync
    } else {
        ExErrorKind::Persistence
    };
    ExError::new(kind).with_op("sqlite").with_message(message)
}

/// Create a missing-table / missing-snapshot error
pub fn not_found(op: &str, table: &str, reason: impl Into<String>) -> ExError {
    ExError::new(ExErrorKind::NotFound)
        .with_op(op.to_string())
        .with_table(table.to_string())
        .with_message(reason)
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}
