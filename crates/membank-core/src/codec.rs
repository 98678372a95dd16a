//! Record codec: records to rows and back
//!
//! Rows are ordered `(column, value)` pairs in storage form (null, integer,
//! real, text). Encoding fills empty auto fields through the type's
//! derivation method and applies field defaults; decoding coerces storage
//! values back into the declared field types.

use std::collections::HashMap;

use crate::entity::Entity;
use crate::errors::{MembankError, Result};
use crate::model::{Record, RecordType, Value, IMPLICIT_ID};

/// Ordered column/value pairs
pub type Row = Vec<(String, Value)>;

/// Result of encoding one record
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRecord {
    pub table: String,
    /// One entry per declared field, in declaration order
    pub row: Row,
    /// Engine-assigned id already known for the record (implicit identity only)
    pub id: Option<i64>,
}

impl EncodedRecord {
    pub fn value(&self, column: &str) -> Option<&Value> {
        self.row.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }
}

/// Derivation hook: method name to derived value
pub type Deriver<'a> = &'a dyn Fn(&str) -> Option<std::result::Result<Value, String>>;

/// Encode a typed entity
///
/// # Errors
///
/// `Validation`-class errors: invalid shape, unknown field, type mismatch,
/// missing or failing derivation method.
pub fn encode<E: Entity>(entity: &E, record_type: &RecordType) -> Result<EncodedRecord> {
    let record = entity.to_record();
    encode_with(&record, record_type, &|method| entity.derive(method))
}

/// Encode an untyped record; auto fields cannot be derived
///
/// # Errors
///
/// As [`encode`].
pub fn encode_record(record: &Record, record_type: &RecordType) -> Result<EncodedRecord> {
    encode_with(record, record_type, &|_| None)
}

/// Encode a record with an explicit derivation hook
///
/// # Errors
///
/// As [`encode`].
pub fn encode_with(
    record: &Record,
    record_type: &RecordType,
    deriver: Deriver<'_>,
) -> Result<EncodedRecord> {
    record_type.validate()?;
    if record.table() != record_type.name {
        return Err(MembankError::WrongRecordType {
            expected: record_type.name.clone(),
            actual: record.table().to_string(),
        });
    }

    let implicit = record_type.has_implicit_id();
    for name in record.values().keys() {
        if record_type.get_field(name).is_none() && !(implicit && name == IMPLICIT_ID) {
            return Err(MembankError::UnknownField {
                table: record_type.name.clone(),
                field: name.clone(),
            });
        }
    }

    let mut row = Row::with_capacity(record_type.fields.len());
    for field in &record_type.fields {
        let mut value = record.get(&field.name).cloned().unwrap_or(Value::Null);

        if value.is_empty() {
            if let Some(method) = &field.derive {
                let failed = |reason: String| MembankError::DerivationFailed {
                    table: record_type.name.clone(),
                    field: field.name.clone(),
                    method: method.clone(),
                    reason,
                };
                value = match deriver(method) {
                    None => return Err(failed("no such derivation method".to_string())),
                    Some(Err(reason)) => return Err(failed(reason)),
                    Some(Ok(derived)) => derived,
                };
            }
        }
        if value.is_null() {
            if let Some(default) = &field.default {
                value = default.clone();
            }
        }

        let actual = value.type_name();
        let value = value
            .coerce(&field.field_type)
            .ok_or_else(|| MembankError::TypeMismatch {
                table: record_type.name.clone(),
                field: field.name.clone(),
                expected: field.field_type.name().to_string(),
                actual: actual.to_string(),
            })?;
        row.push((field.name.clone(), value.to_storage()));
    }

    Ok(EncodedRecord {
        table: record_type.name.clone(),
        row,
        id: if implicit { record.id() } else { None },
    })
}

/// Decode a storage row into a record of `record_type`
///
/// Columns the type does not declare are dropped, except the implicit `id`.
///
/// # Errors
///
/// `MissingColumn` when a declared field has no column (unresolved drift),
/// `TypeMismatch` when a stored value cannot represent the field type.
pub fn decode(row: Row, record_type: &RecordType) -> Result<Record> {
    let mut columns: HashMap<String, Value> = row.into_iter().collect();
    let mut record = Record::new(&record_type.name);

    if record_type.has_implicit_id() {
        if let Some(id) = columns.remove(IMPLICIT_ID) {
            record.set(IMPLICIT_ID, id);
        }
    }

    for field in &record_type.fields {
        let stored = columns
            .remove(&field.name)
            .ok_or_else(|| MembankError::MissingColumn {
                table: record_type.name.clone(),
                field: field.name.clone(),
            })?;
        let actual = stored.type_name();
        let value = stored
            .coerce(&field.field_type)
            .ok_or_else(|| MembankError::TypeMismatch {
                table: record_type.name.clone(),
                field: field.name.clone(),
                expected: field.field_type.name().to_string(),
                actual: actual.to_string(),
            })?;
        record.set(field.name.clone(), value);
    }

    Ok(record)
}

/// Decode a storage row straight into a typed entity
///
/// # Errors
///
/// As [`decode`], plus whatever `E::from_record` reports.
pub fn decode_entity<E: Entity>(row: Row, record_type: &RecordType) -> Result<E> {
    E::from_record(&decode(row, record_type)?)
}
