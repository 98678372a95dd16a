//! Typed records: the bridge between Rust structs and stored records

use crate::errors::Result;
use crate::model::{Record, RecordType, Value};

/// A Rust type stored as one flat table
///
/// The table is named after `record_type().name`. Implementations convert
/// to and from [`Record`]; the access facade handles schema registration,
/// identity and drift.
///
/// ```
/// use membank_core::{Entity, FieldDef, Record, RecordType, Value};
/// use membank_core::errors::{MembankError, Result};
///
/// struct Transaction {
///     amount: f64,
///     description: String,
///     id: String,
/// }
///
/// impl Entity for Transaction {
///     fn record_type() -> RecordType {
///         RecordType::new("transaction")
///             .field(FieldDef::real("amount"))
///             .field(FieldDef::text("description"))
///             .field(FieldDef::text("id").derived_by("add_id"))
///     }
///
///     fn to_record(&self) -> Record {
///         Record::new("transaction")
///             .with("amount", self.amount)
///             .with("description", self.description.as_str())
///             .with("id", self.id.as_str())
///     }
///
///     fn from_record(record: &Record) -> Result<Self> {
///         Ok(Self {
///             amount: record.get("amount").and_then(Value::as_f64).unwrap_or_default(),
///             description: record.text("description").unwrap_or_default().to_string(),
///             id: record.text("id").unwrap_or_default().to_string(),
///         })
///     }
///
///     fn derive(&self, method: &str) -> Option<std::result::Result<Value, String>> {
///         match method {
///             "add_id" => Some(Ok(format!("special_id:{}", self.description).into())),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait Entity: Sized {
    /// Shape of the type; its name is the table name
    fn record_type() -> RecordType;

    fn to_record(&self) -> Record;

    /// # Errors
    ///
    /// Implementations fail when a required value is absent or malformed.
    fn from_record(record: &Record) -> Result<Self>;

    /// Run the named derivation method for an empty auto field
    ///
    /// `None` means the type has no such method.
    fn derive(&self, _method: &str) -> Option<std::result::Result<Value, String>> {
        None
    }

    /// Receive the engine-assigned identifier after an insert
    fn assign_id(&mut self, _id: i64) {}
}
