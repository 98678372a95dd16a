use thiserror::Error;

/// Result type alias using MembankError
pub type Result<T> = std::result::Result<T, MembankError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every failure surfaced by membank is classified into exactly one kind.
/// Each kind maps to a stable error code usable for programmatic handling
/// and for assertions in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    /// Invalid location descriptor, unsupported scheme, unusable path
    Config,
    /// Malformed record type, reserved name, unknown field, unresolved drift
    Validation,
    /// Explicit registration of a type whose table already exists
    Conflict,
    /// No snapshot / table / row for the requested name
    NotFound,
    /// Storage refers to a column the live table lacks (internal repair signal)
    OutOfSync,
    /// Repair did not resolve an out-of-sync failure
    Consistency,
    /// Comparisons in one query reference more than one table
    Filtering,

    // Integration/IO
    Serialization,
    Persistence,
    Io,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Validation => "ERR_VALIDATION",
            ExErrorKind::Conflict => "ERR_CONFLICT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::OutOfSync => "ERR_OUT_OF_SYNC",
            ExErrorKind::Consistency => "ERR_CONSISTENCY",
            ExErrorKind::Filtering => "ERR_FILTERING",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries the classification used for programmatic handling plus the
/// table/field context needed for debugging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    table: Option<String>,
    field: Option<String>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            table: None,
            field: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add table context
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Add field context
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Reclassify the error, keeping all context
    pub fn with_kind(mut self, kind: ExErrorKind) -> Self {
        self.kind = kind;
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the table context, if any
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Get the field context, if any
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(table) = &self.table {
            write!(f, " (table: {})", table)?;
        }
        if let Some(field) = &self.field {
            write!(f, " (field: {})", field)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|s| s as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Error taxonomy for record-type, codec and snapshot operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MembankError {
    // ===== Record type shape =====
    /// Type or field name is not a usable SQL identifier
    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// Name is reserved by the registry or by the access facade
    #[error("Memory '{table}' cannot be created, such name is reserved by membank")]
    ReservedName { table: String },

    /// Field declares another record type (flat shape only)
    #[error("Field '{field}' of '{table}' holds nested record '{nested}', only flat records are supported")]
    NestedField {
        table: String,
        field: String,
        nested: String,
    },

    /// Two fields share a name
    #[error("Field '{field}' is declared more than once in '{table}'")]
    DuplicateField { table: String, field: String },

    /// More than one field carries the key role
    #[error("Record type '{table}' declares more than one key field: {fields:?}")]
    MultipleKeys { table: String, fields: Vec<String> },

    /// Record type without any field
    #[error("Record type '{table}' has no fields")]
    EmptyRecordType { table: String },

    // ===== Codec =====
    /// Filter or record refers to a field the type does not declare
    #[error("Table '{table}' does not hold field '{field}'")]
    UnknownField { table: String, field: String },

    /// Row lacks a column the record type declares
    #[error("Row of '{table}' lacks column '{field}'")]
    MissingColumn { table: String, field: String },

    /// Value does not fit the declared field type
    #[error("Field '{field}' of '{table}' expects {expected}, got {actual}")]
    TypeMismatch {
        table: String,
        field: String,
        expected: String,
        actual: String,
    },

    /// Derivation method for an auto field is missing or failed
    #[error("Derivation '{method}' for field '{field}' of '{table}' failed: {reason}")]
    DerivationFailed {
        table: String,
        field: String,
        method: String,
        reason: String,
    },

    /// Record belongs to another type than the one used to encode it
    #[error("Record of '{actual}' cannot be handled as '{expected}'")]
    WrongRecordType { expected: String, actual: String },

    // ===== Filtering =====
    /// Query without any comparison
    #[error("There must be at least one valid comparison to get items")]
    EmptyFilter,

    /// Comparisons reference different tables
    #[error("Comparisons must reference one table, got '{first}' and '{second}'")]
    MixedTables { first: String, second: String },

    // ===== Location descriptor =====
    /// Location descriptor cannot be parsed
    #[error("Url '{url}' is not valid")]
    InvalidUrl { url: String },

    /// Scheme is not backed by any engine
    #[error("Such database type {scheme} is not supported")]
    UnsupportedScheme { scheme: String },

    /// Path cannot host a database file
    #[error("{reason}")]
    InvalidPath { path: String, reason: String },

    // ===== Snapshot =====
    /// Snapshot bytes cannot be decoded
    #[error("Schema snapshot of '{table}' is unreadable: {reason}")]
    SnapshotCorrupt { table: String, reason: String },

    /// Snapshot written by an unknown format version
    #[error("Schema snapshot of '{table}' uses unsupported format {format}")]
    SnapshotFormat { table: String, format: u32 },

    // ===== Generic Errors =====
    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Conversion from MembankError to ExError
///
/// Classifies each concrete failure into the canonical taxonomy while
/// carrying table and field context across.
impl From<MembankError> for ExError {
    fn from(err: MembankError) -> Self {
        let message = err.to_string();
        match err {
            MembankError::InvalidName { name, .. } => ExError::new(ExErrorKind::Validation)
                .with_table(name)
                .with_message(message),

            MembankError::ReservedName { table } | MembankError::EmptyRecordType { table } => {
                ExError::new(ExErrorKind::Validation)
                    .with_table(table)
                    .with_message(message)
            }

            MembankError::MultipleKeys { table, .. } => ExError::new(ExErrorKind::Validation)
                .with_table(table)
                .with_message(message),

            MembankError::NestedField { table, field, .. }
            | MembankError::DuplicateField { table, field }
            | MembankError::UnknownField { table, field }
            | MembankError::MissingColumn { table, field }
            | MembankError::TypeMismatch { table, field, .. }
            | MembankError::DerivationFailed { table, field, .. } => {
                ExError::new(ExErrorKind::Validation)
                    .with_table(table)
                    .with_field(field)
                    .with_message(message)
            }

            MembankError::WrongRecordType { expected, .. } => {
                ExError::new(ExErrorKind::Validation)
                    .with_table(expected)
                    .with_message(message)
            }

            MembankError::EmptyFilter => {
                ExError::new(ExErrorKind::Validation).with_message(message)
            }

            MembankError::MixedTables { first, .. } => ExError::new(ExErrorKind::Filtering)
                .with_table(first)
                .with_message(message),

            MembankError::InvalidUrl { .. } | MembankError::UnsupportedScheme { .. } => {
                ExError::new(ExErrorKind::Config)
                    .with_op("open")
                    .with_message(message)
            }

            MembankError::InvalidPath { .. } => ExError::new(ExErrorKind::Config)
                .with_op("open")
                .with_message(message),

            MembankError::SnapshotCorrupt { table, .. }
            | MembankError::SnapshotFormat { table, .. } => {
                ExError::new(ExErrorKind::Serialization)
                    .with_table(table)
                    .with_message(message)
            }

            MembankError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            MembankError::Internal { .. } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}

impl From<serde_json::Error> for MembankError {
    fn from(err: serde_json::Error) -> Self {
        MembankError::Serialization {
            message: err.to_string(),
        }
    }
}
