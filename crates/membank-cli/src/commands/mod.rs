//! CLI command implementations

pub mod inspect;
pub mod maintain;

/// Result of one CLI command
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;
