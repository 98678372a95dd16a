//! Destructive maintenance commands
//!
//! Usage:
//!   membank reset
//!   membank clean

use membank_engine::Memory;

use super::CommandResult;

pub fn reset(memory: &mut Memory) -> CommandResult {
    let tables = memory.tables();
    memory.reset()?;
    println!("✓ Reset store ({} tables dropped)", tables.len());
    Ok(())
}

pub fn clean(memory: &mut Memory) -> CommandResult {
    let tables = memory.tables();
    memory.clean_all_data()?;
    println!("✓ Cleaned {} tables", tables.len());
    Ok(())
}
