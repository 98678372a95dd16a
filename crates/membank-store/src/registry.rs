//! Schema registry
//!
//! Persists the shape of every user table in the reserved registry table,
//! one row per table: `table` (text, identity) and `classload` (snapshot
//! bytes, see [`membank_core::snapshot`]).

use membank_core::model::{RecordType, REGISTRY_TABLE};
use membank_core::snapshot::{decode_snapshot, encode_snapshot};
use rusqlite::{Connection, OptionalExtension};

use crate::errors::{from_rusqlite, not_found, Result};
use crate::sql::quote_ident;

/// Registry of record type snapshots keyed by table name
pub struct SchemaRegistry;

impl SchemaRegistry {
    /// Create the registry table if it is missing
    ///
    /// The registry is created from fixed DDL, never through the record type
    /// path, so it has no snapshot of its own.
    ///
    /// # Errors
    ///
    /// `Persistence` if the table cannot be created.
    pub fn bootstrap(conn: &Connection) -> Result<()> {
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    `table` TEXT PRIMARY KEY NOT NULL,
                    classload BLOB NOT NULL
                )",
                quote_ident(REGISTRY_TABLE)
            ),
            [],
        )
        .map_err(from_rusqlite)?;
        Ok(())
    }

    /// Reconstruct the record type stored for `table`
    ///
    /// # Errors
    ///
    /// `NotFound` if no snapshot exists, `Serialization` if it is unreadable.
    pub fn get_schema(conn: &Connection, table: &str) -> Result<RecordType> {
        let classload: Option<Vec<u8>> = conn
            .query_row(
                &format!(
                    "SELECT classload FROM {} WHERE `table` = ?1",
                    quote_ident(REGISTRY_TABLE)
                ),
                [table],
                |row| row.get(0),
            )
            .optional()
            .map_err(from_rusqlite)?;

        let bytes = classload.ok_or_else(|| {
            not_found(
                "get_schema",
                table,
                format!("No record type registered for table '{}'", table),
            )
        })?;
        Ok(decode_snapshot(table, &bytes)?)
    }

    /// Store or replace the snapshot for `table`
    ///
    /// Writing an unchanged shape leaves the stored bytes unchanged.
    ///
    /// # Errors
    ///
    /// `Serialization` or `Persistence` on failure.
    pub fn put_schema(conn: &Connection, table: &str, record_type: &RecordType) -> Result<()> {
        let classload = encode_snapshot(record_type)?;
        conn.execute(
            &format!(
                "INSERT INTO {} (`table`, classload) VALUES (?1, ?2)
                 ON CONFLICT(`table`) DO UPDATE SET classload = excluded.classload",
                quote_ident(REGISTRY_TABLE)
            ),
            rusqlite::params![table, classload],
        )
        .map_err(from_rusqlite)?;

        tracing::debug!(table, "schema snapshot stored");
        Ok(())
    }

    /// Tables that have a snapshot, in name order
    ///
    /// # Errors
    ///
    /// `Persistence` on failure.
    pub fn registered_tables(conn: &Connection) -> Result<Vec<String>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT `table` FROM {} ORDER BY `table`",
                quote_ident(REGISTRY_TABLE)
            ))
            .map_err(from_rusqlite)?;
        let tables = stmt
            .query_map([], |row| row.get(0))
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<String>, _>>()
            .map_err(from_rusqlite)?;
        Ok(tables)
    }
}
