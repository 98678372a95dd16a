//! Whole-database maintenance: reset and data cleanup

use membank_core::model::REGISTRY_TABLE;
use rusqlite::Connection;

use crate::catalog::Catalog;
use crate::errors::{from_rusqlite, Result};
use crate::registry::SchemaRegistry;
use crate::sql::quote_ident;
use crate::sync::TableSynchronizer;

/// Drop every table, then recreate the empty registry
///
/// # Errors
///
/// `Persistence` on engine failure; nothing is dropped in that case.
pub fn reset(conn: &mut Connection, catalog: &mut Catalog) -> Result<usize> {
    let tables: Vec<String> = catalog.table_names().map(str::to_string).collect();

    let tx = conn.transaction().map_err(from_rusqlite)?;
    for table in &tables {
        tx.execute(&format!("DROP TABLE {}", quote_ident(table)), [])
            .map_err(from_rusqlite)?;
    }
    SchemaRegistry::bootstrap(&tx)?;
    tx.commit().map_err(from_rusqlite)?;

    catalog.refresh(conn)?;
    tracing::info!(table_count = tables.len(), "database reset");
    Ok(tables.len())
}

/// Remove all rows from every user table, keeping tables and snapshots
///
/// Tables are recreated from their snapshot, which also restarts implicit
/// ids. A table without a snapshot is emptied in place.
///
/// # Errors
///
/// `Persistence` or `Serialization` on failure; nothing is removed then.
pub fn clean_all_data(conn: &mut Connection, catalog: &mut Catalog) -> Result<usize> {
    let tables: Vec<String> = catalog
        .table_names()
        .filter(|t| *t != REGISTRY_TABLE)
        .map(str::to_string)
        .collect();
    let registered = SchemaRegistry::registered_tables(conn)?;

    let tx = conn.transaction().map_err(from_rusqlite)?;
    for table in &tables {
        if registered.contains(table) {
            let record_type = SchemaRegistry::get_schema(&tx, table)?;
            tx.execute(&format!("DROP TABLE {}", quote_ident(table)), [])
                .map_err(from_rusqlite)?;
            tx.execute(&TableSynchronizer::create_table_sql(&record_type), [])
                .map_err(from_rusqlite)?;
        } else {
            tracing::warn!(table = %table, "no snapshot, deleting rows in place");
            tx.execute(&format!("DELETE FROM {}", quote_ident(table)), [])
                .map_err(from_rusqlite)?;
        }
    }
    tx.commit().map_err(from_rusqlite)?;

    catalog.refresh(conn)?;
    tracing::info!(table_count = tables.len(), "data cleaned");
    Ok(tables.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::RowRepo;
    use membank_core::model::{FieldDef, RecordType};

    fn setup() -> (Connection, Catalog) {
        let mut conn = Connection::open_in_memory().unwrap();
        SchemaRegistry::bootstrap(&conn).unwrap();
        let mut catalog = Catalog::load(&conn).unwrap();
        let dog = RecordType::new("dog").field(FieldDef::text("breed"));
        TableSynchronizer::ensure_table(&mut conn, &mut catalog, &dog).unwrap();
        conn.execute("INSERT INTO dog (breed) VALUES ('Lab')", [])
            .unwrap();
        (conn, catalog)
    }

    #[test]
    fn test_reset_leaves_only_registry() {
        let (mut conn, mut catalog) = setup();
        assert_eq!(reset(&mut conn, &mut catalog).unwrap(), 2);
        assert_eq!(catalog.table_names().collect::<Vec<_>>(), [REGISTRY_TABLE]);
        assert!(SchemaRegistry::registered_tables(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_clean_keeps_tables_and_snapshots() {
        let (mut conn, mut catalog) = setup();
        conn.execute_batch("CREATE TABLE loose (x TEXT); INSERT INTO loose VALUES ('a');")
            .unwrap();
        catalog.refresh(&conn).unwrap();

        assert_eq!(clean_all_data(&mut conn, &mut catalog).unwrap(), 2);
        assert!(catalog.contains("dog"));
        assert!(catalog.contains("loose"));
        assert_eq!(RowRepo::count(&conn, "dog").unwrap(), 0);
        assert_eq!(RowRepo::count(&conn, "loose").unwrap(), 0);
        assert_eq!(SchemaRegistry::registered_tables(&conn).unwrap(), ["dog"]);
    }
}
