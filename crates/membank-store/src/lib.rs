//! Membank Store - SQLite persistence for record types
//!
//! Provides:
//! - Location descriptors and connection setup
//! - Catalog of live table layouts
//! - Schema registry holding one snapshot per table
//! - Table creation and drift synchronization
//! - Row repository with null-aware filtering
//! - Whole-database reset and cleanup

pub mod catalog;
pub mod db;
pub mod errors;
pub mod registry;
pub mod rows;
pub mod sql;
pub mod sync;
pub mod wipe;

// Re-export key types
pub use catalog::{Catalog, ColumnInfo, TableInfo};
pub use db::Locator;
pub use errors::Result;
pub use registry::SchemaRegistry;
pub use rows::{Order, PutOutcome, RowRepo};
pub use sync::TableSynchronizer;
