//! Database location and connection management
//!
//! A location descriptor is `<scheme>://<authority><path>`. Only the `sqlite`
//! scheme is backed by an engine. Relative file paths live in the authority
//! part (`sqlite://data/store.db`), absolute paths use an empty authority
//! (`sqlite:///var/lib/store.db`), and `sqlite://:memory:` selects a
//! transient in-process database.

use membank_core::errors::MembankError;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{from_rusqlite, io_error, Result};

/// The only scheme backed by an engine
pub const SQLITE_SCHEME: &str = "sqlite";

/// Authority selecting the in-process database
pub const MEMORY_AUTHORITY: &str = ":memory:";

/// Descriptor used when none is given
pub const DEFAULT_URL: &str = "sqlite://:memory:";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Parsed location descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Memory,
    File(PathBuf),
}

impl Locator {
    /// Parse and validate a location descriptor
    ///
    /// # Errors
    ///
    /// `Config` for malformed descriptors, unsupported schemes and file
    /// paths whose directory is missing or not writable.
    pub fn parse(url: &str) -> Result<Self> {
        let (scheme, location) = url.split_once("://").ok_or_else(|| MembankError::InvalidUrl {
            url: url.to_string(),
        })?;
        if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '+') {
            return Err(MembankError::InvalidUrl {
                url: url.to_string(),
            }
            .into());
        }
        if scheme != SQLITE_SCHEME {
            return Err(MembankError::UnsupportedScheme {
                scheme: scheme.to_string(),
            }
            .into());
        }

        if location == MEMORY_AUTHORITY {
            return Ok(Locator::Memory);
        }
        if location.is_empty() {
            return Err(MembankError::InvalidPath {
                path: String::new(),
                reason: format!("Url '{}' names no database file", url),
            }
            .into());
        }

        let path = PathBuf::from(location);
        check_directory(&path)?;
        Ok(Locator::File(path))
    }

    pub fn is_memory(&self) -> bool {
        matches!(self, Locator::Memory)
    }
}

fn check_directory(path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let invalid = |reason: String| MembankError::InvalidPath {
        path: path.display().to_string(),
        reason,
    };

    if !dir.is_dir() {
        return Err(invalid(format!("Directory '{}' does not exist", dir.display())).into());
    }
    let metadata = std::fs::metadata(dir).map_err(|e| io_error("open", e))?;
    if metadata.permissions().readonly() || !is_writable(dir) {
        return Err(invalid(format!(
            "Directory '{}' is missing write permissions",
            dir.display()
        ))
        .into());
    }
    Ok(())
}

/// Whether this process can create files in `dir`
fn is_writable(dir: &Path) -> bool {
    tempfile::Builder::new()
        .prefix(".membank-")
        .tempfile_in(dir)
        .is_ok()
}

/// Open the database a locator points at
///
/// # Errors
///
/// `Persistence` when the engine cannot open or configure the database.
pub fn open(locator: &Locator) -> Result<Connection> {
    let conn = match locator {
        Locator::Memory => Connection::open_in_memory(),
        Locator::File(path) => Connection::open(path),
    }
    .map_err(from_rusqlite)?;
    configure(&conn, locator)?;
    tracing::debug!(locator = ?locator, "database opened");
    Ok(conn)
}

/// Configure a connection with the settings the store relies on
///
/// # Errors
///
/// `Persistence` when a pragma is rejected.
pub fn configure(conn: &Connection, locator: &Locator) -> Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT).map_err(from_rusqlite)?;

    // WAL only applies to file-backed databases
    if !locator.is_memory() {
        let _mode: String = conn
            .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
            .map_err(from_rusqlite)?;
    }

    Ok(())
}

/// Log every statement the connection runs at debug level
pub fn trace_statements(conn: &mut Connection) {
    conn.trace(Some(log_statement));
}

fn log_statement(sql: &str) {
    tracing::debug!(target: "membank::sql", sql);
}

#[cfg(test)]
mod tests {
    use super::*;
    use membank_core::errors::ExErrorKind;

    #[test]
    fn test_memory_locator() {
        assert_eq!(Locator::parse(DEFAULT_URL).unwrap(), Locator::Memory);
    }

    #[test]
    fn test_relative_and_absolute_paths() {
        let dir = tempfile::TempDir::new().unwrap();
        let abs = dir.path().join("store.db");
        let url = format!("sqlite://{}", abs.display());
        assert_eq!(Locator::parse(&url).unwrap(), Locator::File(abs));

        assert_eq!(
            Locator::parse("sqlite://store.db").unwrap(),
            Locator::File(PathBuf::from("store.db"))
        );
    }

    #[test]
    fn test_unsupported_scheme() {
        let err = Locator::parse("jumbo://www.zoozl.net").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Config);
        assert!(err.message().contains("jumbo"));

        let err = Locator::parse("berkeleydb://:memory:").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Config);
    }

    #[test]
    fn test_missing_directory() {
        let err = Locator::parse("sqlite://www.zoozl.net/gibberish").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Config);
        assert!(err.message().contains("www.zoozl.net"));
    }

    #[test]
    fn test_writable_check_leaves_no_files() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(is_writable(dir.path()));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        assert!(!is_writable(&dir.path().join("absent")));
    }

    #[cfg(unix)]
    #[test]
    fn test_unwritable_directory_is_config_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        // owner may read and enter, nobody may write
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555)).unwrap();

        let url = format!("sqlite://{}", locked.join("store.db").display());
        let result = Locator::parse(&url);

        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Config);
        assert!(err.message().contains("write permissions"));
    }

    #[test]
    fn test_malformed_url() {
        let err = Locator::parse("no-scheme-here").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Config);
    }

    #[test]
    fn test_open_file_database() {
        let dir = tempfile::TempDir::new().unwrap();
        let locator = Locator::File(dir.path().join("wal.db"));
        let conn = open(&locator).unwrap();
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode, "wal");
    }
}
