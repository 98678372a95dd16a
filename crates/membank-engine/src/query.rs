//! Table and field handles for building comparisons
//!
//! ```
//! use membank_engine::Memory;
//!
//! let memory = Memory::open_in_memory().unwrap();
//! let heavy = memory.table("dog").field("weight").unwrap().gt(20.0);
//! assert_eq!(heavy.table, "dog");
//! ```

use membank_core::errors::MembankError;
use membank_core::{Comparison, Entity, Operator, RecordType, Value};
use membank_store::errors::Result;

/// Handle on one table, resolving field names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    name: String,
    /// Declared fields; `None` when the table is unknown
    fields: Option<Vec<String>>,
}

impl TableRef {
    pub(crate) fn new(name: impl AsRef<str>, fields: Option<Vec<String>>) -> Self {
        Self {
            name: name.as_ref().to_lowercase(),
            fields,
        }
    }

    /// Handle for a typed entity's table, using its current shape
    pub fn of<E: Entity>() -> Self {
        Self::from_record_type(&E::record_type())
    }

    pub fn from_record_type(record_type: &RecordType) -> Self {
        let mut fields: Vec<String> = record_type.field_names().map(str::to_string).collect();
        if record_type.has_implicit_id() {
            fields.push(membank_core::model::IMPLICIT_ID.to_string());
        }
        Self::new(&record_type.name, Some(fields))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the table exists with a known shape
    pub fn is_known(&self) -> bool {
        self.fields.is_some()
    }

    /// Field handle for building comparisons
    ///
    /// Any name is accepted on an unknown table, since queries against it
    /// return nothing.
    ///
    /// # Errors
    ///
    /// `Validation` when a known table does not hold the field.
    pub fn field(&self, name: &str) -> Result<FieldRef> {
        if let Some(fields) = &self.fields {
            if !fields.iter().any(|f| f == name) {
                return Err(MembankError::UnknownField {
                    table: self.name.clone(),
                    field: name.to_string(),
                }
                .into());
            }
        }
        Ok(FieldRef {
            table: self.name.clone(),
            field: name.to_string(),
        })
    }
}

/// A resolved `table.field`, producing comparisons
#[derive(Debug, Clone)]
pub struct FieldRef {
    table: String,
    field: String,
}

#[allow(clippy::should_implement_trait)]
impl FieldRef {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn name(&self) -> &str {
        &self.field
    }

    pub fn compare(&self, op: Operator, operand: impl Into<Value>) -> Comparison {
        Comparison::new(self.table.clone(), self.field.clone(), op, operand)
    }

    pub fn eq(&self, operand: impl Into<Value>) -> Comparison {
        self.compare(Operator::Eq, operand)
    }

    pub fn ne(&self, operand: impl Into<Value>) -> Comparison {
        self.compare(Operator::Ne, operand)
    }

    pub fn lt(&self, operand: impl Into<Value>) -> Comparison {
        self.compare(Operator::Lt, operand)
    }

    pub fn le(&self, operand: impl Into<Value>) -> Comparison {
        self.compare(Operator::Le, operand)
    }

    pub fn gt(&self, operand: impl Into<Value>) -> Comparison {
        self.compare(Operator::Gt, operand)
    }

    pub fn ge(&self, operand: impl Into<Value>) -> Comparison {
        self.compare(Operator::Ge, operand)
    }
}
