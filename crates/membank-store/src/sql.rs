//! SQL text and parameter helpers shared by the store modules

use membank_core::codec::Row;
use membank_core::model::{FieldDef, Value};
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};

/// Quote an identifier for SQLite
///
/// Backticks always name a column; a double-quoted name that matches no
/// column would be read back as a string literal.
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Render a value as a SQL literal, for column defaults
pub fn sql_literal(value: &Value) -> String {
    match value.to_storage() {
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => format!("{:?}", f),
        Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
        _ => "NULL".to_string(),
    }
}

/// Column definition for a declared field, without key constraints
pub fn column_def(field: &FieldDef) -> String {
    // validate() has rejected nested records before any DDL is built
    let sql_type = field.field_type.sql_type().unwrap_or("TEXT");
    let mut def = format!("{} {}", quote_ident(&field.name), sql_type);
    if let Some(default) = &field.default {
        def.push_str(" DEFAULT ");
        def.push_str(&sql_literal(default));
    }
    def
}

/// Bind a membank value as a statement parameter
pub struct SqlParam<'a>(pub &'a Value);

impl ToSql for SqlParam<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self.0.to_storage() {
            Value::Integer(i) => rusqlite::types::Value::Integer(i),
            Value::Real(f) => rusqlite::types::Value::Real(f),
            Value::Text(s) => rusqlite::types::Value::Text(s),
            _ => rusqlite::types::Value::Null,
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

/// Read the selected columns of a result row
pub fn read_row(row: &rusqlite::Row<'_>, columns: &[String]) -> rusqlite::Result<Row> {
    columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let value = match row.get_ref(i)? {
                ValueRef::Null => Value::Null,
                ValueRef::Integer(v) => Value::Integer(v),
                ValueRef::Real(v) => Value::Real(v),
                ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                    Value::Text(String::from_utf8_lossy(bytes).into_owned())
                }
            };
            Ok((name.clone(), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("dog"), "`dog`");
        assert_eq!(quote_ident("a`b"), "`a``b`");
    }

    #[test]
    fn test_literals() {
        assert_eq!(sql_literal(&Value::from("it's")), "'it''s'");
        assert_eq!(sql_literal(&Value::Real(0.0)), "0.0");
        assert_eq!(sql_literal(&Value::Bool(true)), "1");
        assert_eq!(sql_literal(&Value::Null), "NULL");
    }

    #[test]
    fn test_column_def_with_default() {
        let field = FieldDef::text("color").with_default("black");
        assert_eq!(column_def(&field), "`color` TEXT DEFAULT 'black'");
    }
}
