//! Options for opening a store

use membank_store::db::DEFAULT_URL;

/// How to open a [`crate::Memory`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOptions {
    /// Location descriptor, e.g. `sqlite://data/store.db`
    pub url: String,
    /// Log every SQL statement at debug level
    pub debug: bool,
}

impl OpenOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            debug: false,
        }
    }
}
