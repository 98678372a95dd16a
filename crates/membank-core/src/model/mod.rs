//! Data model: record types, records and their values

pub mod record;
pub mod record_type;
pub mod value;

pub use record::Record;
pub use record_type::{
    is_reserved, FieldDef, FieldType, Identity, RecordType, FACADE_NAMES, IMPLICIT_ID,
    REGISTRY_TABLE,
};
pub use value::Value;
