//! membank core - record types, codec and error/logging facilities
//!
//! This crate holds everything that does not touch the database:
//! - Record type model (`RecordType`, `FieldDef`, `Value`, `Record`)
//! - The `Entity` trait bridging Rust structs to records
//! - Record codec (encode with auto-derivation, decode with coercion)
//! - Versioned schema snapshot format
//! - Deferred comparisons for filtering
//! - Canonical error and logging facilities

pub mod codec;
pub mod entity;
pub mod errors;
pub mod filter;
pub mod logging_facility;
pub mod model;
pub mod snapshot;

// Re-export commonly used types
pub use entity::Entity;
pub use errors::{ExError, ExErrorKind, MembankError, Result};
pub use filter::{Comparison, Operator};
pub use model::{FieldDef, FieldType, Record, RecordType, Value};
