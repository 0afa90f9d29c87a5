/// Error taxonomy for the wrapper
///
/// Every failure the wrapper can report is a [`TdsError`]. [`TdsError::kind`]
/// groups variants into the categories the host cares about and
/// [`TdsError::sqlstate`] maps them onto the host engine's error codes.
use thiserror::Error;

use crate::models::{LibraryError, OptionContext};
use crate::protocol::{ConvertFailure, TypeTag};

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, TdsError>;

/// Broad category of a [`TdsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid, missing, conflicting or duplicate option; raised before any
    /// connection attempt
    Configuration,
    /// Login, connect or database selection failed
    Connection,
    /// Compile, execute, result retrieval or row fetch failed
    Execution,
    /// A buffer or handle could not be allocated
    Resource,
    /// A column value could not be converted; the cell becomes NULL
    Conversion,
}

/// Errors raised by the wrapper.
#[derive(Debug, Error)]
pub enum TdsError {
    #[error("Invalid option \"{name}\"")]
    InvalidOption {
        name: String,
        context: OptionContext,
        valid: Vec<&'static str>,
    },

    #[error("Redundant option: {name} ({value})")]
    RedundantOption { name: String, value: String },

    #[error("Conflicting options: {option} cannot be used with {other}")]
    ConflictingOptions {
        option: &'static str,
        other: &'static str,
    },

    #[error("Either a table or a query must be specified")]
    MissingQueryOrTable,

    #[error("Invalid port \"{value}\": expected an integer between 1 and 65535")]
    InvalidPort { value: String },

    #[error("Catalog lookup failed: {0}")]
    Catalog(String),

    #[error(
        "Failed to connect using connection string {host} with user {username}{}",
        cause_suffix(.cause)
    )]
    Connect {
        host: String,
        username: String,
        cause: Option<LibraryError>,
    },

    #[error("Failed to select database {database}{}", cause_suffix(.cause))]
    SelectDatabase {
        database: String,
        cause: Option<LibraryError>,
    },

    #[error("Failed to set current query to {query}")]
    Compile { query: String },

    #[error("Failed to execute query {query}")]
    Execute { query: String },

    #[error("Failed to get results from query {query}")]
    Results { query: String },

    #[error("There appears to be no results from query {query}")]
    NoResults { query: String },

    #[error("Unknown return code {code} getting results from query {query}")]
    UnknownResults { query: String, code: i32 },

    #[error("Failed to get row {context}")]
    FetchRow { context: &'static str },

    #[error("Failed to get row {context}. Unknown return code {code}.")]
    UnknownRowStatus { context: &'static str, code: i32 },

    #[error("{0}")]
    Library(LibraryError),

    #[error("Rescan is not supported for query {query}")]
    RescanUnsupported { query: String },

    #[error("Scan cursor is closed")]
    CursorClosed,

    /// A handle was used after its release; sessions release only on drop
    #[error("Session is closed")]
    SessionClosed,

    #[error("Scan cursor was aborted by an earlier error")]
    ScanFailed,

    #[error("Failed to initialize DB-Library environment")]
    LibraryInit,

    #[error("Failed to initialize DB-Library login structure{}", cause_suffix(.cause))]
    LoginAlloc { cause: Option<LibraryError> },

    #[error("Buffer filled up {context}")]
    BufferFull { context: &'static str },

    #[error("Failed to allocate memory for {what}")]
    Allocation { what: &'static str },

    #[error("Column {column} of type {from} cannot be converted to type {to}")]
    Unconvertible {
        column: usize,
        from: TypeTag,
        to: TypeTag,
    },

    #[error("Failed to convert column {column} of type {from}: {reason}{}", cause_suffix(.cause))]
    Conversion {
        column: usize,
        from: TypeTag,
        reason: ConvertFailure,
        /// Error reported by the library's callback during the conversion
        cause: Option<LibraryError>,
    },
}

impl TdsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TdsError::InvalidOption { .. }
            | TdsError::RedundantOption { .. }
            | TdsError::ConflictingOptions { .. }
            | TdsError::MissingQueryOrTable
            | TdsError::InvalidPort { .. }
            | TdsError::Catalog(_) => ErrorKind::Configuration,

            TdsError::Connect { .. } | TdsError::SelectDatabase { .. } => ErrorKind::Connection,

            TdsError::Compile { .. }
            | TdsError::Execute { .. }
            | TdsError::Results { .. }
            | TdsError::NoResults { .. }
            | TdsError::UnknownResults { .. }
            | TdsError::FetchRow { .. }
            | TdsError::UnknownRowStatus { .. }
            | TdsError::Library(_)
            | TdsError::RescanUnsupported { .. }
            | TdsError::CursorClosed
            | TdsError::SessionClosed
            | TdsError::ScanFailed => ErrorKind::Execution,

            TdsError::LibraryInit
            | TdsError::LoginAlloc { .. }
            | TdsError::BufferFull { .. }
            | TdsError::Allocation { .. } => ErrorKind::Resource,

            TdsError::Unconvertible { .. } | TdsError::Conversion { .. } => ErrorKind::Conversion,
        }
    }

    /// Conversion failures degrade a single cell to NULL; everything else
    /// aborts the current plan or scan.
    pub fn is_fatal(&self) -> bool {
        self.kind() != ErrorKind::Conversion
    }

    /// SQLSTATE reported to the host engine.
    pub fn sqlstate(&self) -> &'static str {
        match self {
            TdsError::InvalidOption { .. } => "HV00D",
            TdsError::RedundantOption { .. }
            | TdsError::ConflictingOptions { .. }
            | TdsError::MissingQueryOrTable => "42601",
            TdsError::InvalidPort { .. } => "HV024",
            TdsError::Catalog(_) => "HV00R",
            TdsError::RescanUnsupported { .. } => "0A000",
            TdsError::Unconvertible { .. } => "HV004",
            TdsError::Conversion { .. } => "HV005",
            _ => match self.kind() {
                ErrorKind::Connection => "HV00N",
                ErrorKind::Resource => "HV001",
                _ => "HV00L",
            },
        }
    }

    /// Attach the library error parked while this error was produced.
    ///
    /// Only conversion failures carry one; for any other error the cause is
    /// logged and dropped.
    #[must_use]
    pub fn with_library_cause(self, cause: Option<LibraryError>) -> Self {
        match (self, cause) {
            (
                TdsError::Conversion {
                    column,
                    from,
                    reason,
                    cause: None,
                },
                cause,
            ) => TdsError::Conversion {
                column,
                from,
                reason,
                cause,
            },
            (error, Some(cause)) => {
                tracing::debug!(%cause, %error, "library error not attached");
                error
            }
            (error, None) => error,
        }
    }

    /// Extra guidance shown alongside the message, when there is any.
    pub fn hint(&self) -> Option<String> {
        match self {
            TdsError::InvalidOption { valid, .. } => {
                let list = if valid.is_empty() {
                    "<none>".to_string()
                } else {
                    valid.join(", ")
                };
                Some(format!("Valid options in this context are: {list}"))
            }
            _ => None,
        }
    }
}

fn cause_suffix(cause: &Option<LibraryError>) -> String {
    match cause {
        Some(error) => format!(" ({error})"),
        None => String::new(),
    }
}
