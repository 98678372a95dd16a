//! Row repository
//!
//! Reads and writes encoded records. Statements name their columns
//! explicitly, so a table missing a column fails with `OutOfSync` and the
//! caller can repair it.

use membank_core::codec::{EncodedRecord, Row};
use membank_core::filter::{Comparison, Operator};
use membank_core::model::{Identity, RecordType, Value, IMPLICIT_ID};
use rusqlite::{Connection, OptionalExtension};

use crate::errors::{from_rusqlite, Result};
use crate::sql::{quote_ident, read_row, SqlParam};

/// Result ordering by insertion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Oldest first
    Inserted,
    /// Newest first
    Latest,
}

/// What a put did to storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Inserted,
    Updated,
}

/// SQLite repository for user tables
pub struct RowRepo;

impl RowRepo {
    /// Insert or update one record in a single transaction
    ///
    /// The identity is the declared key, else the implicit `id`. Without a
    /// known `id`, a row whose fields all equal the record's is treated as
    /// the same record. Returns the outcome and the implicit `id` of the row
    /// written (`None` for natural identities).
    ///
    /// # Errors
    ///
    /// `OutOfSync` when the table lacks a column, `Persistence` otherwise.
    pub fn upsert(
        conn: &mut Connection,
        record_type: &RecordType,
        encoded: &EncodedRecord,
    ) -> Result<(PutOutcome, Option<i64>)> {
        let tx = conn.transaction().map_err(from_rusqlite)?;
        let existing = Self::find_identity(&tx, record_type, encoded)?;

        let outcome = match &existing {
            Some(identity) => {
                Self::update(&tx, record_type, encoded, identity)?;
                PutOutcome::Updated
            }
            None => {
                Self::insert(&tx, record_type, encoded)?;
                PutOutcome::Inserted
            }
        };

        let id = match (record_type.identity(), existing) {
            (Identity::Natural(_), _) => None,
            (Identity::Implicit, Some(identity)) => identity.as_i64(),
            (Identity::Implicit, None) => Some(tx.last_insert_rowid()),
        };
        tx.commit().map_err(from_rusqlite)?;
        Ok((outcome, id))
    }

    /// Identity value of the stored row matching `encoded`, if any
    ///
    /// # Errors
    ///
    /// `OutOfSync` / `Persistence` from the lookup.
    pub fn find_identity(
        conn: &Connection,
        record_type: &RecordType,
        encoded: &EncodedRecord,
    ) -> Result<Option<Value>> {
        let table = quote_ident(&record_type.name);
        match record_type.identity() {
            Identity::Natural(field) => {
                let key = encoded.value(&field.name).cloned().unwrap_or(Value::Null);
                let column = quote_ident(&field.name);
                let found: Option<rusqlite::types::Value> = conn
                    .query_row(
                        &format!(
                            "SELECT {column} FROM {table} WHERE {column} = ?1 LIMIT 1"
                        ),
                        [SqlParam(&key)],
                        |row| row.get(0),
                    )
                    .optional()
                    .map_err(from_rusqlite)?;
                Ok(found.map(|_| key))
            }
            Identity::Implicit => {
                let id = quote_ident(IMPLICIT_ID);
                let found: Option<i64> = match encoded.id {
                    Some(known) => conn
                        .query_row(
                            &format!("SELECT {id} FROM {table} WHERE {id} = ?1"),
                            [known],
                            |row| row.get(0),
                        )
                        .optional(),
                    None => {
                        let (clause, params) = equality_clause(&encoded.row);
                        conn.query_row(
                            &format!(
                                "SELECT {id} FROM {table} WHERE {clause} ORDER BY {id} LIMIT 1"
                            ),
                            rusqlite::params_from_iter(params),
                            |row| row.get(0),
                        )
                        .optional()
                    }
                }
                .map_err(from_rusqlite)?;
                Ok(found.map(Value::Integer))
            }
        }
    }

    fn insert(conn: &Connection, record_type: &RecordType, encoded: &EncodedRecord) -> Result<()> {
        let mut columns: Vec<String> = encoded.row.iter().map(|(c, _)| quote_ident(c)).collect();
        let mut values: Vec<Value> = encoded.row.iter().map(|(_, v)| v.clone()).collect();
        if let (true, Some(id)) = (record_type.has_implicit_id(), encoded.id) {
            columns.push(quote_ident(IMPLICIT_ID));
            values.push(Value::Integer(id));
        }
        let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{}", i)).collect();

        conn.execute(
            &format!(
                "INSERT INTO {} ({}) VALUES ({})",
                quote_ident(&record_type.name),
                columns.join(", "),
                placeholders.join(", ")
            ),
            rusqlite::params_from_iter(values.iter().map(SqlParam)),
        )
        .map_err(from_rusqlite)?;
        Ok(())
    }

    fn update(
        conn: &Connection,
        record_type: &RecordType,
        encoded: &EncodedRecord,
        identity: &Value,
    ) -> Result<()> {
        let assignments: Vec<String> = encoded
            .row
            .iter()
            .enumerate()
            .map(|(i, (c, _))| format!("{} = ?{}", quote_ident(c), i + 1))
            .collect();
        let mut values: Vec<&Value> = encoded.row.iter().map(|(_, v)| v).collect();
        values.push(identity);

        conn.execute(
            &format!(
                "UPDATE {} SET {} WHERE {} = ?{}",
                quote_ident(&record_type.name),
                assignments.join(", "),
                quote_ident(record_type.identity_column()),
                values.len()
            ),
            rusqlite::params_from_iter(values.into_iter().map(SqlParam)),
        )
        .map_err(from_rusqlite)?;
        Ok(())
    }

    /// Rows of `record_type`'s table matching all comparisons
    ///
    /// Comparisons are assumed to reference this table; their fields must
    /// be declared by the record type.
    ///
    /// # Errors
    ///
    /// `OutOfSync` when the table lacks a selected column, `Persistence`
    /// otherwise.
    pub fn select(
        conn: &Connection,
        record_type: &RecordType,
        comparisons: &[Comparison],
        order: Order,
        limit: Option<usize>,
    ) -> Result<Vec<Row>> {
        let mut columns: Vec<String> = Vec::with_capacity(record_type.fields.len() + 1);
        if record_type.has_implicit_id() {
            columns.push(IMPLICIT_ID.to_string());
        }
        columns.extend(record_type.field_names().map(str::to_string));

        let mut sql = format!(
            "SELECT {} FROM {}",
            columns
                .iter()
                .map(|c| quote_ident(c))
                .collect::<Vec<_>>()
                .join(", "),
            quote_ident(&record_type.name)
        );
        let mut params: Vec<&Value> = Vec::new();
        if !comparisons.is_empty() {
            let predicates: Vec<String> = comparisons
                .iter()
                .map(|cmp| {
                    let column = quote_ident(&cmp.field);
                    match (cmp.op, cmp.operand.is_null()) {
                        (Operator::Eq, true) => format!("{} IS NULL", column),
                        (Operator::Ne, true) => format!("{} IS NOT NULL", column),
                        (op, _) => {
                            params.push(&cmp.operand);
                            format!("{} {} ?{}", column, op.sql(), params.len())
                        }
                    }
                })
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&predicates.join(" AND "));
        }
        sql.push_str(match order {
            Order::Inserted => " ORDER BY rowid ASC",
            Order::Latest => " ORDER BY rowid DESC",
        });
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut stmt = conn.prepare(&sql).map_err(from_rusqlite)?;
        let rows = stmt
            .query_map(
                rusqlite::params_from_iter(params.into_iter().map(SqlParam)),
                |row| read_row(row, &columns),
            )
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        Ok(rows)
    }

    /// Delete the row identified by `encoded`; returns rows removed
    ///
    /// # Errors
    ///
    /// `OutOfSync` / `Persistence` from the delete.
    pub fn delete(
        conn: &Connection,
        record_type: &RecordType,
        encoded: &EncodedRecord,
    ) -> Result<usize> {
        let table = quote_ident(&record_type.name);
        let removed = match (record_type.identity(), encoded.id) {
            (Identity::Natural(field), _) => {
                let key = encoded.value(&field.name).cloned().unwrap_or(Value::Null);
                conn.execute(
                    &format!("DELETE FROM {} WHERE {} = ?1", table, quote_ident(&field.name)),
                    [SqlParam(&key)],
                )
            }
            (Identity::Implicit, Some(id)) => conn.execute(
                &format!("DELETE FROM {} WHERE {} = ?1", table, quote_ident(IMPLICIT_ID)),
                [id],
            ),
            (Identity::Implicit, None) => {
                let (clause, params) = equality_clause(&encoded.row);
                conn.execute(
                    &format!("DELETE FROM {} WHERE {}", table, clause),
                    rusqlite::params_from_iter(params),
                )
            }
        }
        .map_err(from_rusqlite)?;
        Ok(removed)
    }

    /// Number of rows in a table
    ///
    /// # Errors
    ///
    /// `Persistence` on failure.
    pub fn count(conn: &Connection, table: &str) -> Result<i64> {
        conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
            [],
            |row| row.get(0),
        )
        .map_err(from_rusqlite)
    }
}

/// Null-safe `col IS ?` conjunction over all row values
fn equality_clause(row: &Row) -> (String, Vec<SqlParam<'_>>) {
    let clause = row
        .iter()
        .enumerate()
        .map(|(i, (c, _))| format!("{} IS ?{}", quote_ident(c), i + 1))
        .collect::<Vec<_>>()
        .join(" AND ");
    let params = row.iter().map(|(_, v)| SqlParam(v)).collect();
    (clause, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::registry::SchemaRegistry;
    use crate::sync::TableSynchronizer;
    use membank_core::codec::encode_record;
    use membank_core::model::{FieldDef, Record};

    fn dog() -> RecordType {
        RecordType::new("dog")
            .field(FieldDef::text("breed"))
            .field(FieldDef::real("weight").with_default(0.0))
    }

    fn setup(rt: &RecordType) -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        SchemaRegistry::bootstrap(&conn).unwrap();
        let mut catalog = Catalog::load(&conn).unwrap();
        TableSynchronizer::ensure_table(&mut conn, &mut catalog, rt).unwrap();
        conn
    }

    fn encoded(record: Record, rt: &RecordType) -> EncodedRecord {
        encode_record(&record, rt).unwrap()
    }

    #[test]
    fn test_equal_record_without_id_is_not_duplicated() {
        let rt = dog();
        let mut conn = setup(&rt);
        let lab = encoded(Record::new("dog").with("breed", "Lab"), &rt);

        let (first, id1) = RowRepo::upsert(&mut conn, &rt, &lab).unwrap();
        let (second, id2) = RowRepo::upsert(&mut conn, &rt, &lab).unwrap();

        assert_eq!(first, PutOutcome::Inserted);
        assert_eq!(second, PutOutcome::Updated);
        assert_eq!(id1, id2);
        assert_eq!(RowRepo::count(&conn, "dog").unwrap(), 1);
    }

    #[test]
    fn test_known_id_updates_in_place() {
        let rt = dog();
        let mut conn = setup(&rt);
        let (_, id) = RowRepo::upsert(
            &mut conn,
            &rt,
            &encoded(Record::new("dog").with("breed", "Lab"), &rt),
        )
        .unwrap();

        let heavier = Record::new("dog")
            .with("breed", "Lab")
            .with("weight", 30.0)
            .with("id", id.unwrap());
        let (outcome, _) = RowRepo::upsert(&mut conn, &rt, &encoded(heavier, &rt)).unwrap();
        assert_eq!(outcome, PutOutcome::Updated);

        let rows = RowRepo::select(&conn, &rt, &[], Order::Inserted, None).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][2], ("weight".to_string(), Value::Real(30.0)));
    }

    #[test]
    fn test_natural_key_upsert() {
        let rt = RecordType::new("user")
            .field(FieldDef::text("email").key())
            .field(FieldDef::text("name"));
        let mut conn = setup(&rt);

        let a = encoded(Record::new("user").with("email", "a@x").with("name", "A"), &rt);
        let b = encoded(Record::new("user").with("email", "a@x").with("name", "B"), &rt);
        assert_eq!(RowRepo::upsert(&mut conn, &rt, &a).unwrap(), (PutOutcome::Inserted, None));
        assert_eq!(RowRepo::upsert(&mut conn, &rt, &b).unwrap(), (PutOutcome::Updated, None));

        let rows = RowRepo::select(&conn, &rt, &[], Order::Inserted, None).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][1].1, Value::from("B"));
    }

    #[test]
    fn test_select_filters_and_orders() {
        let rt = dog();
        let mut conn = setup(&rt);
        for (breed, weight) in [("Lab", 30.0), ("Pug", 8.0), ("Collie", 20.0)] {
            let record = Record::new("dog").with("breed", breed).with("weight", weight);
            RowRepo::upsert(&mut conn, &rt, &encoded(record, &rt)).unwrap();
        }

        let heavy = [Comparison::new("dog", "weight", Operator::Ge, 20.0)];
        let rows = RowRepo::select(&conn, &rt, &heavy, Order::Inserted, None).unwrap();
        let breeds: Vec<_> = rows.iter().map(|r| r[1].1.clone()).collect();
        assert_eq!(breeds, [Value::from("Lab"), Value::from("Collie")]);

        let latest = RowRepo::select(&conn, &rt, &[], Order::Latest, Some(1)).unwrap();
        assert_eq!(latest[0][1].1, Value::from("Collie"));
    }

    #[test]
    fn test_select_missing_column_is_out_of_sync() {
        let rt = dog();
        let conn = setup(&rt);
        let grown = dog().field(FieldDef::text("color"));
        let err = RowRepo::select(&conn, &grown, &[], Order::Inserted, None).unwrap_err();
        assert_eq!(err.kind(), membank_core::ExErrorKind::OutOfSync);
    }

    #[test]
    fn test_filter_on_missing_column_is_out_of_sync() {
        let rt = dog();
        let mut conn = setup(&rt);
        RowRepo::upsert(
            &mut conn,
            &rt,
            &encoded(Record::new("dog").with("breed", "Lab"), &rt),
        )
        .unwrap();

        let grown = dog().field(FieldDef::text("owner"));
        let owner = Comparison::new("dog", "owner", Operator::Eq, "owner");
        let err = RowRepo::select(&conn, &grown, &[owner], Order::Inserted, None).unwrap_err();
        assert_eq!(err.kind(), membank_core::ExErrorKind::OutOfSync);
    }

    #[test]
    fn test_delete_by_values_and_by_id() {
        let rt = dog();
        let mut conn = setup(&rt);
        let lab = encoded(Record::new("dog").with("breed", "Lab"), &rt);
        let pug = encoded(Record::new("dog").with("breed", "Pug"), &rt);
        RowRepo::upsert(&mut conn, &rt, &lab).unwrap();
        let (_, pug_id) = RowRepo::upsert(&mut conn, &rt, &pug).unwrap();

        assert_eq!(RowRepo::delete(&conn, &rt, &lab).unwrap(), 1);
        let by_id = encoded(
            Record::new("dog").with("breed", "renamed").with("id", pug_id.unwrap()),
            &rt,
        );
        assert_eq!(RowRepo::delete(&conn, &rt, &by_id).unwrap(), 1);
        assert_eq!(RowRepo::count(&conn, "dog").unwrap(), 0);
    }
}
