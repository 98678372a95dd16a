//! Membank Engine - access facade
//!
//! Coordinates the core record model with the SQLite store: typed and
//! dynamic puts and reads, table handles for comparisons, lazy drift
//! repair and whole-store maintenance.
//!
//! ```
//! use membank_engine::Memory;
//!
//! let mut memory = Memory::open("sqlite://:memory:").unwrap();
//! assert!(memory.list("dog").unwrap().is_empty());
//! assert!(memory.get_one("dog", &[]).unwrap().is_none());
//! ```

pub mod memory;
pub mod options;
pub mod query;

pub use memory::Memory;
pub use options::OpenOptions;
pub use query::{FieldRef, TableRef};

pub use membank_store::{Locator, PutOutcome};
