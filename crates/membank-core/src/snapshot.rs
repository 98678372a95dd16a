//! Schema snapshot format
//!
//! The registry stores each record type as versioned JSON: the format
//! number, the table name and the ordered field list. Equal shapes encode
//! to equal bytes, so re-registering an unchanged type is a no-op write.

use serde::{Deserialize, Serialize};

use crate::errors::{MembankError, Result};
use crate::model::{FieldDef, RecordType};

/// Current snapshot format version
pub const SNAPSHOT_FORMAT: u32 = 1;

#[derive(Serialize, Deserialize)]
struct SchemaSnapshot {
    format: u32,
    name: String,
    fields: Vec<FieldDef>,
}

#[derive(Deserialize)]
struct FormatProbe {
    format: u32,
}

/// Serialize a record type shape
///
/// # Errors
///
/// Fails only if a default value cannot be represented in JSON.
pub fn encode_snapshot(record_type: &RecordType) -> Result<Vec<u8>> {
    let snapshot = SchemaSnapshot {
        format: SNAPSHOT_FORMAT,
        name: record_type.name.clone(),
        fields: record_type.fields.clone(),
    };
    Ok(serde_json::to_vec(&snapshot)?)
}

/// Deserialize the snapshot stored for `table`
///
/// # Errors
///
/// `SnapshotFormat` for versions this build does not read, `SnapshotCorrupt`
/// for anything that is not a snapshot.
pub fn decode_snapshot(table: &str, bytes: &[u8]) -> Result<RecordType> {
    let corrupt = |e: serde_json::Error| MembankError::SnapshotCorrupt {
        table: table.to_string(),
        reason: e.to_string(),
    };
    let probe: FormatProbe = serde_json::from_slice(bytes).map_err(corrupt)?;
    if probe.format != SNAPSHOT_FORMAT {
        return Err(MembankError::SnapshotFormat {
            table: table.to_string(),
            format: probe.format,
        });
    }
    let snapshot: SchemaSnapshot = serde_json::from_slice(bytes).map_err(corrupt)?;
    Ok(RecordType {
        name: snapshot.name,
        fields: snapshot.fields,
    })
}
