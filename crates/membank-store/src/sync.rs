//! Table synchronizer
//!
//! Creates tables for new record types and reconciles live tables whose
//! columns drifted from their record type. Each operation runs in one
//! transaction that also writes the registry snapshot, then reloads the
//! catalog.

use membank_core::errors::{ExError, ExErrorKind};
use membank_core::model::{Identity, RecordType, IMPLICIT_ID};
use rusqlite::Connection;

use crate::catalog::{Catalog, TableInfo};
use crate::errors::{from_rusqlite, Result};
use crate::registry::SchemaRegistry;
use crate::sql::{column_def, quote_ident};

/// Keeps tables and their registry snapshots in step with record types
pub struct TableSynchronizer;

impl TableSynchronizer {
    /// DDL for a fresh table of `record_type`
    pub fn create_table_sql(record_type: &RecordType) -> String {
        let mut columns = Vec::with_capacity(record_type.fields.len() + 1);
        let key = match record_type.identity() {
            Identity::Natural(field) => Some(field.name.as_str()),
            Identity::Implicit => {
                columns.push(format!(
                    "{} INTEGER PRIMARY KEY AUTOINCREMENT",
                    quote_ident(IMPLICIT_ID)
                ));
                None
            }
        };
        for field in &record_type.fields {
            let mut def = column_def(field);
            if key == Some(field.name.as_str()) {
                def.push_str(" PRIMARY KEY NOT NULL");
            }
            columns.push(def);
        }
        format!(
            "CREATE TABLE {} ({})",
            quote_ident(&record_type.name),
            columns.join(", ")
        )
    }

    /// Create the table and snapshot for a type seen for the first time
    ///
    /// Returns `false` when the table already exists. Table and snapshot are
    /// written in one transaction: either both exist afterwards or neither.
    ///
    /// # Errors
    ///
    /// `Validation` for shapes that cannot be stored (including reserved
    /// names), `Persistence` on engine failure.
    pub fn ensure_table(
        conn: &mut Connection,
        catalog: &mut Catalog,
        record_type: &RecordType,
    ) -> Result<bool> {
        record_type.validate()?;
        if catalog.contains(&record_type.name) {
            return Ok(false);
        }

        let tx = conn.transaction().map_err(from_rusqlite)?;
        tx.execute(&Self::create_table_sql(record_type), [])
            .map_err(from_rusqlite)?;
        SchemaRegistry::put_schema(&tx, &record_type.name, record_type)?;
        tx.commit().map_err(from_rusqlite)?;

        catalog.refresh(conn)?;
        tracing::info!(table = %record_type.name, "table created");
        Ok(true)
    }

    /// Whether the live columns differ from the record type's fields
    pub fn detect_drift(table: &TableInfo, record_type: &RecordType) -> bool {
        let implicit = record_type.has_implicit_id();
        let missing = record_type
            .field_names()
            .any(|name| !table.has_column(name));
        let extra = table
            .column_names()
            .any(|name| record_type.get_field(name).is_none() && !(implicit && name == IMPLICIT_ID));
        missing || extra
    }

    /// Re-derive the table's shape from `record_type`
    ///
    /// Adds columns for new fields (existing rows take the field default),
    /// drops columns of removed fields, and overwrites the snapshot. Primary
    /// key columns are never dropped. Creates the table when it is missing.
    ///
    /// # Errors
    ///
    /// `Validation` for invalid shapes, `Persistence` on engine failure.
    pub fn synchronize(
        conn: &mut Connection,
        catalog: &mut Catalog,
        record_type: &RecordType,
    ) -> Result<TableInfo> {
        record_type.validate()?;
        let table = match catalog.get(&record_type.name) {
            Some(table) => table.clone(),
            None => {
                Self::ensure_table(conn, catalog, record_type)?;
                return Self::refreshed(catalog, &record_type.name);
            }
        };

        let implicit = record_type.has_implicit_id();
        let tx = conn.transaction().map_err(from_rusqlite)?;
        SchemaRegistry::put_schema(&tx, &record_type.name, record_type)?;

        for field in &record_type.fields {
            if table.has_column(&field.name) {
                continue;
            }
            if field.key {
                tracing::warn!(
                    table = %record_type.name,
                    field = %field.name,
                    "key field added to existing table, stored as plain column"
                );
            }
            tx.execute(
                &format!(
                    "ALTER TABLE {} ADD COLUMN {}",
                    quote_ident(&record_type.name),
                    column_def(field)
                ),
                [],
            )
            .map_err(from_rusqlite)?;
        }

        for column in &table.columns {
            let removed = record_type.get_field(&column.name).is_none()
                && !(implicit && column.name == IMPLICIT_ID);
            if !removed || column.primary_key {
                continue;
            }
            tx.execute(
                &format!(
                    "ALTER TABLE {} DROP COLUMN {}",
                    quote_ident(&record_type.name),
                    quote_ident(&column.name)
                ),
                [],
            )
            .map_err(from_rusqlite)?;
        }

        tx.commit().map_err(from_rusqlite)?;
        catalog.refresh(conn)?;
        tracing::info!(table = %record_type.name, "table synchronized");
        Self::refreshed(catalog, &record_type.name)
    }

    fn refreshed(catalog: &Catalog, table: &str) -> Result<TableInfo> {
        catalog.get(table).cloned().ok_or_else(|| {
            ExError::new(ExErrorKind::Internal)
                .with_op("synchronize")
                .with_table(table)
                .with_message("table missing from catalog after synchronization")
        })
    }
}
