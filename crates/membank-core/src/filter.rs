//! Deferred comparisons consumed by list queries

use crate::errors::{MembankError, Result};
use crate::model::Value;

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Operator {
    pub fn sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
        }
    }
}

/// `table.field <op> operand`, evaluated when a query runs
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub table: String,
    pub field: String,
    pub op: Operator,
    pub operand: Value,
}

impl Comparison {
    pub fn new(
        table: impl Into<String>,
        field: impl Into<String>,
        op: Operator,
        operand: impl Into<Value>,
    ) -> Self {
        Self {
            table: table.into(),
            field: field.into(),
            op,
            operand: operand.into(),
        }
    }
}

/// The one table all comparisons reference
///
/// # Errors
///
/// `EmptyFilter` without comparisons, `MixedTables` when two tables appear.
pub fn single_table(comparisons: &[Comparison]) -> Result<&str> {
    let first = comparisons.first().ok_or(MembankError::EmptyFilter)?;
    if let Some(other) = comparisons.iter().find(|c| c.table != first.table) {
        return Err(MembankError::MixedTables {
            first: first.table.clone(),
            second: other.table.clone(),
        });
    }
    Ok(&first.table)
}
