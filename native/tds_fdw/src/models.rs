/// Data structures shared across the wrapper
///
/// This module defines the resolved connection plan, the per-column cell
/// representation handed to the host, the option key/value pairs read from
/// the host catalog, and the records delivered by the client library's error
/// and message callbacks.
use bytes::Bytes;
use secrecy::SecretString;
use std::fmt;

use crate::constants::NO_USERNAME;
use crate::utils;

/// Catalog object an option is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionContext {
    /// The wrapper itself; no options are valid here
    Wrapper,
    /// Foreign server definition
    Server,
    /// Foreign table definition
    Table,
    /// Per-user credentials for a server
    UserMapping,
}

impl fmt::Display for OptionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OptionContext::Wrapper => "foreign-data wrapper",
            OptionContext::Server => "server",
            OptionContext::Table => "foreign table",
            OptionContext::UserMapping => "user mapping",
        };
        f.write_str(name)
    }
}

/// A single `name = value` option as stored in the host catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FdwOption {
    pub name: String,
    pub value: String,
}

impl FdwOption {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The three option lists that apply to one foreign table.
#[derive(Debug, Clone, Default)]
pub struct ForeignTableOptions {
    pub table: Vec<FdwOption>,
    pub server: Vec<FdwOption>,
    pub user_mapping: Vec<FdwOption>,
}

/// Where the final query text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuerySource {
    /// The `query` option was supplied verbatim
    Query,
    /// The query was synthesized from the `table` option
    Table(String),
}

/// Resolved, validated connection and query settings for one plan or scan.
///
/// Built only by the option resolver; read-only afterwards.
#[derive(Debug)]
pub struct ConnectionPlan {
    pub(crate) servername: String,
    pub(crate) port: Option<u16>,
    pub(crate) language: Option<String>,
    pub(crate) character_set: Option<String>,
    pub(crate) username: Option<String>,
    pub(crate) password: Option<SecretString>,
    pub(crate) database: Option<String>,
    pub(crate) query: String,
    pub(crate) source: QuerySource,
}

impl ConnectionPlan {
    pub fn servername(&self) -> &str {
        &self.servername
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn character_set(&self) -> Option<&str> {
        self.character_set.as_deref()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Username for messages, `<none>` when unset.
    pub fn display_username(&self) -> &str {
        self.username.as_deref().unwrap_or(NO_USERNAME)
    }

    pub fn password(&self) -> Option<&SecretString> {
        self.password.as_ref()
    }

    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// The query sent to the remote server.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn source(&self) -> &QuerySource {
        &self.source
    }

    /// `servername` or `servername:port`, as passed to the client's open call.
    pub fn host_string(&self) -> String {
        utils::host_string(&self.servername, self.port)
    }

    /// True when the server is the loopback address or `localhost`.
    pub fn is_local(&self) -> bool {
        utils::is_local_server(&self.servername)
    }
}

/// One column value of one row.
///
/// Text buffers are the converted bytes without any trailing terminator.
/// Binary columns keep their raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Null,
    Text(Bytes),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Cell::Null => None,
            Cell::Text(bytes) => Some(bytes),
        }
    }

    /// The cell as UTF-8 text, if it is not NULL and is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }
}

/// Ordered cells for one row, matching the table's declared column order.
pub type Row = Vec<Cell>;

/// Payload of the client library's error callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryError {
    pub severity: i32,
    pub db_error: i32,
    pub db_message: String,
    pub os_error: i32,
    pub os_message: Option<String>,
}

impl fmt::Display for LibraryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DB-Library error: DB #: {}, DB Msg: {}, OS #: {}, OS Msg: {}, Level: {}",
            self.db_error,
            self.db_message,
            self.os_error,
            self.os_message.as_deref().unwrap_or(""),
            self.severity
        )
    }
}

/// Payload of the client library's informational message callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerMessage {
    pub number: i64,
    pub state: i32,
    pub severity: i32,
    pub text: String,
    pub server: Option<String>,
    pub procedure: Option<String>,
    pub line: i32,
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DB-Library notice: Msg #: {}, Msg state: {}, Msg: {}, Server: {}, Process: {}, Line: {}, Level: {}",
            self.number,
            self.state,
            self.text,
            self.server.as_deref().unwrap_or(""),
            self.procedure.as_deref().unwrap_or(""),
            self.line,
            self.severity
        )
    }
}

/// Relation size reported to the host planner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelSize {
    pub rows: f64,
    pub tuples: f64,
}

/// Startup and total cost of scanning the foreign table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostEstimate {
    pub startup_cost: f64,
    pub total_cost: f64,
}

/// The single access path offered to the host planner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForeignPath {
    pub rows: f64,
    pub startup_cost: f64,
    pub total_cost: f64,
}
