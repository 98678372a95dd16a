//! membank CLI
//!
//! Command-line inspection and maintenance of a membank store

use clap::{Parser, Subcommand};
use membank_core::logging_facility::{init, Profile};
use membank_engine::{Memory, OpenOptions};

mod commands;

/// Store opened when `--db` is not given
const DEFAULT_DB: &str = "sqlite://membank.db";

#[derive(Debug, Parser)]
#[command(name = "membank")]
#[command(about = "membank - Inspect and maintain record stores", long_about = None)]
struct Cli {
    /// Location descriptor of the store
    #[arg(long, global = true, default_value = DEFAULT_DB)]
    db: String,

    /// Log operations to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Log every SQL statement (implies --verbose)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List user tables
    Tables,
    /// Show the stored record type of a table
    Schema(commands::inspect::TableArgs),
    /// List the records of a table
    List(commands::inspect::TableArgs),
    /// Drop every table, including stored record types
    Reset,
    /// Remove all records, keeping tables and record types
    Clean,
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose || cli.debug {
        init(Profile::Development);
    }

    let result = Memory::open_with(OpenOptions::new(&cli.db).debug(cli.debug))
        .map_err(Into::into)
        .and_then(|mut memory| match cli.command {
            Commands::Tables => commands::inspect::tables(&memory),
            Commands::Schema(args) => commands::inspect::schema(&memory, args),
            Commands::List(args) => commands::inspect::list(&mut memory, args),
            Commands::Reset => commands::maintain::reset(&mut memory),
            Commands::Clean => commands::maintain::clean(&mut memory),
        });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
