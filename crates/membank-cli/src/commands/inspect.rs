//! Read-only commands, printing JSON to stdout
//!
//! Usage:
//!   membank tables
//!   membank schema <TABLE>
//!   membank list <TABLE>

use clap::Args;
use membank_engine::Memory;

use super::CommandResult;

#[derive(Debug, Args)]
pub struct TableArgs {
    /// Table name
    pub table: String,
}

/// Print the user tables as a JSON array
pub fn tables(memory: &Memory) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(&memory.tables())?);
    Ok(())
}

/// Print the stored record type of a table
pub fn schema(memory: &Memory, args: TableArgs) -> CommandResult {
    let record_type = memory.get_schema(&args.table)?;
    println!("{}", serde_json::to_string_pretty(&record_type)?);
    Ok(())
}

/// Print all records of a table as a JSON array, in insertion order
pub fn list(memory: &mut Memory, args: TableArgs) -> CommandResult {
    let records: Vec<serde_json::Value> = memory
        .list(&args.table)?
        .iter()
        .map(|record| record.to_json())
        .collect();
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
