//! Table metadata cache
//!
//! The catalog maps every live table to its column layout. It is owned by
//! the store handle and reloaded wholesale after each schema-changing
//! operation; entries are never patched in place.

use rusqlite::Connection;
use std::collections::BTreeMap;

use crate::errors::{from_rusqlite, Result};
use crate::sql::quote_ident;

/// One live column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub sql_type: String,
    pub primary_key: bool,
}

/// Live layout of one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

impl TableInfo {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// Snapshot of all live tables, engine-internal tables excluded
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: BTreeMap<String, TableInfo>,
}

impl Catalog {
    /// Load the catalog from the database
    ///
    /// # Errors
    ///
    /// `Persistence` if the schema cannot be read.
    pub fn load(conn: &Connection) -> Result<Self> {
        let mut catalog = Self::default();
        catalog.refresh(conn)?;
        Ok(catalog)
    }

    /// Replace every entry with the database's current layout
    ///
    /// # Errors
    ///
    /// `Persistence` if the schema cannot be read; the previous entries are
    /// kept in that case.
    pub fn refresh(&mut self, conn: &Connection) -> Result<()> {
        let mut stmt = conn
            .prepare(
                r"SELECT name FROM sqlite_master
                 WHERE type = 'table' AND name NOT LIKE 'sqlite\_%' ESCAPE '\'
                 ORDER BY name",
            )
            .map_err(from_rusqlite)?;
        let names: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        drop(stmt);

        let mut tables = BTreeMap::new();
        for name in names {
            let columns = load_columns(conn, &name)?;
            tables.insert(name.clone(), TableInfo { name, columns });
        }

        self.tables = tables;
        tracing::debug!(table_count = self.tables.len(), "catalog refreshed");
        Ok(())
    }

    pub fn get(&self, table: &str) -> Option<&TableInfo> {
        self.tables.get(table)
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

fn load_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({})", quote_ident(table)))
        .map_err(from_rusqlite)?;
    let columns = stmt
        .query_map([], |row| {
            let pk: i64 = row.get(5)?;
            Ok(ColumnInfo {
                name: row.get(1)?,
                sql_type: row.get(2)?,
                primary_key: pk > 0,
            })
        })
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;
    Ok(columns)
}
