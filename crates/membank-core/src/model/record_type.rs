//! Record type shape: named, ordered, flat field list

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::value::Value;
use crate::errors::{MembankError, Result};

/// Table holding the schema snapshots of every user table
pub const REGISTRY_TABLE: &str = "__meta_dataclasses__";

/// Identifier column added to tables of types without a natural identity
pub const IMPLICIT_ID: &str = "id";

/// Names the access facade uses for its own operations
pub const FACADE_NAMES: &[&str] = &[
    "put",
    "get",
    "get_one",
    "list",
    "select",
    "delete",
    "create",
    "sync",
    "reset",
    "clean_all_data",
    "table",
    "tables",
    "schema",
    "open",
];

/// Semantic type of a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Integer,
    Real,
    Boolean,
    Timestamp,
    /// Another record type; declared types may name it but it is never stored
    Record(String),
}

impl FieldType {
    /// SQLite column type, `None` for nested records
    pub fn sql_type(&self) -> Option<&'static str> {
        match self {
            FieldType::Text | FieldType::Timestamp => Some("TEXT"),
            FieldType::Integer | FieldType::Boolean => Some("INTEGER"),
            FieldType::Real => Some("REAL"),
            FieldType::Record(_) => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::Real => "real",
            FieldType::Boolean => "boolean",
            FieldType::Timestamp => "timestamp",
            FieldType::Record(name) => name,
        }
    }
}

/// One field of a record type
///
/// `key` and `derive` are independent roles: a key field names the record's
/// natural identity, a derived field is filled by the type's derivation
/// method when left empty. A field may carry either, both or none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub key: bool,
    pub derive: Option<String>,
    pub default: Option<Value>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            key: false,
            derive: None,
            default: None,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    pub fn real(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Real)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    pub fn timestamp(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Timestamp)
    }

    /// Mark the field as the natural identity
    pub fn key(mut self) -> Self {
        self.key = true;
        self
    }

    /// Fill the field from the named derivation method when empty
    pub fn derived_by(mut self, method: impl Into<String>) -> Self {
        self.derive = Some(method.into());
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// How records of a type are identified in storage
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Identity<'a> {
    /// A declared field (marked `key`, or literally named `id`)
    Natural(&'a FieldDef),
    /// Engine-assigned `id` column
    Implicit,
}

/// Named flat schema describing one kind of stored record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordType {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

impl RecordType {
    /// Create an empty record type; the name is lower-cased
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().to_lowercase(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn identity(&self) -> Identity<'_> {
        if let Some(key) = self.fields.iter().find(|f| f.key) {
            return Identity::Natural(key);
        }
        match self.get_field(IMPLICIT_ID) {
            Some(field) => Identity::Natural(field),
            None => Identity::Implicit,
        }
    }

    pub fn has_implicit_id(&self) -> bool {
        matches!(self.identity(), Identity::Implicit)
    }

    /// Name of the identity column, declared or implicit
    pub fn identity_column(&self) -> &str {
        match self.identity() {
            Identity::Natural(field) => &field.name,
            Identity::Implicit => IMPLICIT_ID,
        }
    }

    /// Check the shape can be stored as one flat table
    ///
    /// # Errors
    ///
    /// Returns the first violation found: bad or reserved table name, empty
    /// field list, bad or duplicate field name, nested record field, more
    /// than one key field.
    pub fn validate(&self) -> Result<()> {
        check_identifier(&self.name)?;
        if is_reserved(&self.name) {
            return Err(MembankError::ReservedName {
                table: self.name.clone(),
            });
        }
        if self.fields.is_empty() {
            return Err(MembankError::EmptyRecordType {
                table: self.name.clone(),
            });
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            check_identifier(&field.name)?;
            if !seen.insert(field.name.as_str()) {
                return Err(MembankError::DuplicateField {
                    table: self.name.clone(),
                    field: field.name.clone(),
                });
            }
            if let FieldType::Record(nested) = &field.field_type {
                return Err(MembankError::NestedField {
                    table: self.name.clone(),
                    field: field.name.clone(),
                    nested: nested.clone(),
                });
            }
            if let Some(default) = &field.default {
                if default.clone().coerce(&field.field_type).is_none() {
                    return Err(MembankError::TypeMismatch {
                        table: self.name.clone(),
                        field: field.name.clone(),
                        expected: field.field_type.name().to_string(),
                        actual: default.type_name().to_string(),
                    });
                }
            }
        }

        let keys: Vec<String> = self
            .fields
            .iter()
            .filter(|f| f.key)
            .map(|f| f.name.clone())
            .collect();
        if keys.len() > 1 {
            return Err(MembankError::MultipleKeys {
                table: self.name.clone(),
                fields: keys,
            });
        }

        Ok(())
    }
}

/// Names owned by the registry, the access facade or the SQLite engine
pub fn is_reserved(name: &str) -> bool {
    name == REGISTRY_TABLE || FACADE_NAMES.contains(&name) || name.starts_with("sqlite_")
}

fn check_identifier(name: &str) -> Result<()> {
    let invalid = |reason: &str| MembankError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    let first = name.chars().next().ok_or_else(|| invalid("name is empty"))?;
    if first.is_ascii_digit() {
        return Err(invalid("name starts with a digit"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(invalid("only lowercase letters, digits and '_' are allowed"));
    }
    Ok(())
}
