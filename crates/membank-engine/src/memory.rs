//! Access facade over one store
//!
//! `Memory` owns the connection and the catalog of live tables. Every
//! public operation is logged with `log_op_start!` / `log_op_end!` /
//! `log_op_error!`; the store and core layers below only emit debug detail.
//!
//! Writes and reads name their columns explicitly. When the live table
//! lacks a column the store reports `OutOfSync`; the facade then
//! synchronizes the table once and retries once. A second `OutOfSync` is
//! surfaced as `Consistency`.

use std::time::Instant;

use membank_core::codec::{decode, decode_entity, encode, encode_record, EncodedRecord};
use membank_core::errors::{ExError, ExErrorKind};
use membank_core::filter::single_table;
use membank_core::model::{Record, RecordType, Value, IMPLICIT_ID, REGISTRY_TABLE};
use membank_core::{log_op_end, log_op_error, log_op_start, Comparison, Entity};
use membank_store::db::{self, Locator};
use membank_store::errors::{not_found, Result};
use membank_store::{
    wipe, Catalog, Order, PutOutcome, RowRepo, SchemaRegistry, TableSynchronizer,
};
use rusqlite::Connection;

use crate::options::OpenOptions;
use crate::query::TableRef;

/// An open store: typed and dynamic access to record tables
pub struct Memory {
    conn: Connection,
    catalog: Catalog,
    locator: Locator,
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("locator", &self.locator)
            .field("tables", &self.catalog.len())
            .finish()
    }
}

impl Memory {
    /// Open the store at a location descriptor
    ///
    /// # Errors
    ///
    /// `Config` for unusable descriptors, `Persistence` when the engine
    /// cannot open the database.
    pub fn open(url: &str) -> Result<Self> {
        Self::open_with(OpenOptions::new(url))
    }

    /// Open a transient in-process store
    ///
    /// # Errors
    ///
    /// `Persistence` when the engine cannot open the database.
    pub fn open_in_memory() -> Result<Self> {
        Self::open_with(OpenOptions::default())
    }

    /// Open the store described by `options`
    ///
    /// Bootstraps the schema registry when absent and loads the catalog.
    ///
    /// # Errors
    ///
    /// As [`Memory::open`].
    pub fn open_with(options: OpenOptions) -> Result<Self> {
        logged("open", "", || {
            let locator = Locator::parse(&options.url)?;
            let mut conn = db::open(&locator)?;
            if options.debug {
                db::trace_statements(&mut conn);
            }
            SchemaRegistry::bootstrap(&conn)?;
            let catalog = Catalog::load(&conn)?;
            Ok(Self {
                conn,
                catalog,
                locator,
            })
        })
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// User tables, in name order
    pub fn tables(&self) -> Vec<String> {
        self.catalog
            .table_names()
            .filter(|t| *t != REGISTRY_TABLE)
            .map(str::to_string)
            .collect()
    }

    /// Record type stored for `table`
    ///
    /// # Errors
    ///
    /// `NotFound` when no snapshot exists.
    pub fn get_schema(&self, table: &str) -> Result<RecordType> {
        SchemaRegistry::get_schema(&self.conn, &table.to_lowercase())
    }

    /// Handle on `table` for building comparisons
    pub fn table(&self, name: &str) -> TableRef {
        match self.get_schema(name) {
            Ok(record_type) => TableRef::from_record_type(&record_type),
            Err(_) => TableRef::new(name, None),
        }
    }

    /// Register `E` without writing a record
    ///
    /// # Errors
    ///
    /// `Validation` for shapes that cannot be stored, `Conflict` when the
    /// table already exists.
    pub fn create<E: Entity>(&mut self) -> Result<()> {
        let record_type = E::record_type();
        logged("create", &record_type.name, || {
            record_type.validate()?;
            if self.catalog.contains(&record_type.name) {
                return Err(ExError::new(ExErrorKind::Conflict)
                    .with_op("create")
                    .with_table(&record_type.name)
                    .with_message(format!("Table '{}' already exists", record_type.name)));
            }
            TableSynchronizer::ensure_table(&mut self.conn, &mut self.catalog, &record_type)?;
            Ok(())
        })
    }

    /// Bring `E`'s table in line with `E`'s current shape
    ///
    /// # Errors
    ///
    /// `Validation` for invalid shapes, `Persistence` on engine failure.
    pub fn sync<E: Entity>(&mut self) -> Result<()> {
        let record_type = E::record_type();
        logged("sync", &record_type.name, || {
            TableSynchronizer::synchronize(&mut self.conn, &mut self.catalog, &record_type)?;
            Ok(())
        })
    }

    /// Store a typed entity, creating its table on first use
    ///
    /// An existing row with the same identity is overwritten. For types
    /// with an implicit identity the assigned id is handed back through
    /// [`Entity::assign_id`].
    ///
    /// # Errors
    ///
    /// `Validation` before any storage access for invalid shapes or values,
    /// `Consistency` when the table cannot be repaired.
    pub fn put<E: Entity>(&mut self, entity: &mut E) -> Result<PutOutcome> {
        let record_type = E::record_type();
        logged("put", &record_type.name, || {
            let encoded = encode(entity, &record_type)?;
            TableSynchronizer::ensure_table(&mut self.conn, &mut self.catalog, &record_type)?;
            let (outcome, id) = self.write(&record_type, &encoded)?;
            if let Some(id) = id {
                entity.assign_id(id);
            }
            Ok(outcome)
        })
    }

    /// Store an untyped record against its table's stored shape
    ///
    /// The assigned id of an implicit identity is set on the record.
    ///
    /// # Errors
    ///
    /// `NotFound` when the table has no stored shape, otherwise as
    /// [`Memory::put`].
    pub fn put_record(&mut self, record: &mut Record) -> Result<PutOutcome> {
        let table = record.table().to_string();
        logged("put", &table, || {
            let record_type = self.get_schema(&table)?;
            let encoded = encode_record(record, &record_type)?;
            TableSynchronizer::ensure_table(&mut self.conn, &mut self.catalog, &record_type)?;
            let (outcome, id) = self.write(&record_type, &encoded)?;
            if let Some(id) = id {
                record.set(IMPLICIT_ID, id);
            }
            Ok(outcome)
        })
    }

    /// Most recent record of `table` whose fields equal `filters`
    ///
    /// `None` when nothing matches or the table does not exist.
    ///
    /// # Errors
    ///
    /// `Validation` for filter fields the table does not hold.
    pub fn get_one(&mut self, table: &str, filters: &[(&str, Value)]) -> Result<Option<Record>> {
        let table = table.to_lowercase();
        logged("get_one", &table, || {
            if !self.catalog.contains(&table) {
                return Ok(None);
            }
            let handle = self.table(&table);
            let comparisons = filters
                .iter()
                .map(|(field, value)| -> Result<Comparison> {
                    Ok(handle.field(field)?.eq(value.clone()))
                })
                .collect::<Result<Vec<_>>>()?;
            let record_type = self.get_schema(&table)?;
            let mut records = self.read(&record_type, &comparisons, Order::Latest, Some(1))?;
            Ok(records.pop())
        })
    }

    /// Most recent typed entity whose fields equal `filters`
    ///
    /// # Errors
    ///
    /// As [`Memory::get_one`], plus decoding failures.
    pub fn find<E: Entity>(&mut self, filters: &[(&str, Value)]) -> Result<Option<E>> {
        let record_type = E::record_type();
        logged("get_one", &record_type.name, || {
            if !self.catalog.contains(&record_type.name) {
                return Ok(None);
            }
            let handle = TableRef::from_record_type(&record_type);
            let comparisons = filters
                .iter()
                .map(|(field, value)| -> Result<Comparison> {
                    Ok(handle.field(field)?.eq(value.clone()))
                })
                .collect::<Result<Vec<_>>>()?;
            let rows = self.with_repair(&record_type, |conn| {
                RowRepo::select(conn, &record_type, &comparisons, Order::Latest, Some(1))
            })?;
            match rows.into_iter().next() {
                Some(row) => Ok(Some(decode_entity::<E>(row, &record_type)?)),
                None => Ok(None),
            }
        })
    }

    /// All records of `table` in insertion order
    ///
    /// A table that does not exist yields an empty list.
    ///
    /// # Errors
    ///
    /// `Consistency` when the table cannot be repaired.
    pub fn list(&mut self, table: &str) -> Result<Vec<Record>> {
        let table = table.to_lowercase();
        logged("list", &table, || {
            if !self.catalog.contains(&table) {
                return Ok(Vec::new());
            }
            let record_type = self.get_schema(&table)?;
            self.read(&record_type, &[], Order::Inserted, None)
        })
    }

    /// All typed entities of `E` in insertion order
    ///
    /// # Errors
    ///
    /// As [`Memory::list`], plus decoding failures.
    pub fn all<E: Entity>(&mut self) -> Result<Vec<E>> {
        let record_type = E::record_type();
        logged("list", &record_type.name, || {
            if !self.catalog.contains(&record_type.name) {
                return Ok(Vec::new());
            }
            let rows = self.with_repair(&record_type, |conn| {
                RowRepo::select(conn, &record_type, &[], Order::Inserted, None)
            })?;
            rows.into_iter()
                .map(|row| -> Result<E> { Ok(decode_entity(row, &record_type)?) })
                .collect()
        })
    }

    /// Records matching every comparison, in insertion order
    ///
    /// # Errors
    ///
    /// `Validation` without comparisons or for undeclared fields,
    /// `Filtering` when comparisons reference more than one table.
    pub fn select(&mut self, comparisons: &[Comparison]) -> Result<Vec<Record>> {
        let table = first_table(comparisons);
        logged("select", &table, || {
            single_table(comparisons)?;
            match self.filtered_type(&table, comparisons)? {
                Some(record_type) => self.read(&record_type, comparisons, Order::Inserted, None),
                None => Ok(Vec::new()),
            }
        })
    }

    /// Most recent record matching every comparison
    ///
    /// # Errors
    ///
    /// As [`Memory::select`].
    pub fn get(&mut self, comparisons: &[Comparison]) -> Result<Option<Record>> {
        let table = first_table(comparisons);
        logged("get", &table, || {
            single_table(comparisons)?;
            match self.filtered_type(&table, comparisons)? {
                Some(record_type) => {
                    let mut records =
                        self.read(&record_type, comparisons, Order::Latest, Some(1))?;
                    Ok(records.pop())
                }
                None => Ok(None),
            }
        })
    }

    /// Remove the stored row with `entity`'s identity; returns rows removed
    ///
    /// # Errors
    ///
    /// `NotFound` when the table does not exist.
    pub fn delete<E: Entity>(&mut self, entity: &E) -> Result<usize> {
        let record_type = E::record_type();
        logged("delete", &record_type.name, || {
            let encoded = encode(entity, &record_type)?;
            if !self.catalog.contains(&record_type.name) {
                return Err(not_found(
                    "delete",
                    &record_type.name,
                    format!("Table '{}' does not exist", record_type.name),
                ));
            }
            self.with_repair(&record_type, |conn| {
                RowRepo::delete(conn, &record_type, &encoded)
            })
        })
    }

    /// Drop every table and start over with an empty registry
    ///
    /// # Errors
    ///
    /// `Persistence` on engine failure.
    pub fn reset(&mut self) -> Result<()> {
        logged("reset", "", || {
            wipe::reset(&mut self.conn, &mut self.catalog)?;
            Ok(())
        })
    }

    /// Remove all records, keeping tables and their stored shapes
    ///
    /// # Errors
    ///
    /// `Persistence` on engine failure.
    pub fn clean_all_data(&mut self) -> Result<()> {
        logged("clean_all_data", "", || {
            wipe::clean_all_data(&mut self.conn, &mut self.catalog)?;
            Ok(())
        })
    }

    fn write(
        &mut self,
        record_type: &RecordType,
        encoded: &EncodedRecord,
    ) -> Result<(PutOutcome, Option<i64>)> {
        self.with_repair(record_type, |conn| {
            RowRepo::upsert(conn, record_type, encoded)
        })
    }

    fn read(
        &mut self,
        record_type: &RecordType,
        comparisons: &[Comparison],
        order: Order,
        limit: Option<usize>,
    ) -> Result<Vec<Record>> {
        let rows = self.with_repair(record_type, |conn| {
            RowRepo::select(conn, record_type, comparisons, order, limit)
        })?;
        rows.into_iter()
            .map(|row| -> Result<Record> { Ok(decode(row, record_type)?) })
            .collect()
    }

    /// Stored shape of a filtered table, `None` when the table is missing
    fn filtered_type(
        &self,
        table: &str,
        comparisons: &[Comparison],
    ) -> Result<Option<RecordType>> {
        if !self.catalog.contains(table) {
            return Ok(None);
        }
        let handle = self.table(table);
        for comparison in comparisons {
            handle.field(&comparison.field)?;
        }
        Ok(Some(self.get_schema(table)?))
    }

    /// Run `attempt`; on `OutOfSync` synchronize the table and run it again
    fn with_repair<T>(
        &mut self,
        record_type: &RecordType,
        mut attempt: impl FnMut(&mut Connection) -> Result<T>,
    ) -> Result<T> {
        let first = match attempt(&mut self.conn) {
            Err(err) if err.kind() == ExErrorKind::OutOfSync => err,
            other => return other,
        };

        tracing::warn!(
            table = %record_type.name,
            reason = %first.message(),
            "table out of sync, repairing"
        );
        TableSynchronizer::synchronize(&mut self.conn, &mut self.catalog, record_type)?;

        attempt(&mut self.conn).map_err(|err| {
            if err.kind() == ExErrorKind::OutOfSync {
                ExError::new(ExErrorKind::Consistency)
                    .with_table(&record_type.name)
                    .with_message(format!(
                        "Table '{}' is still out of sync after repair",
                        record_type.name
                    ))
                    .with_source(err)
            } else {
                err
            }
        })
    }
}

fn first_table(comparisons: &[Comparison]) -> String {
    comparisons
        .first()
        .map(|c| c.table.clone())
        .unwrap_or_default()
}

/// Run one facade operation between start and end/error log events
fn logged<T>(op: &'static str, table: &str, run: impl FnOnce() -> Result<T>) -> Result<T> {
    log_op_start!(op, table = table);
    let start = Instant::now();

    let result = run().map_err(|e| {
        let e = if e.op().is_none() { e.with_op(op) } else { e };
        log_op_error!(
            op,
            &e,
            duration_ms = start.elapsed().as_millis() as u64,
            table = table
        );
        e
    })?;

    log_op_end!(
        op,
        duration_ms = start.elapsed().as_millis() as u64,
        table = table
    );
    Ok(result)
}
