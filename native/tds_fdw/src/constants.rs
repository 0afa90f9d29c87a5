/// Global constants for the TDS foreign data wrapper
///
/// This module holds the static option table, defaults applied during option
/// resolution, and the fixed numbers used by the planner cost model and the
/// column converter.
use crate::models::OptionContext;

/// Server address used when no `servername` option is set anywhere.
pub const DEFAULT_SERVERNAME: &str = "127.0.0.1";

/// Server names that are treated as local by the startup cost estimate.
pub const LOCAL_SERVERNAMES: [&str; 2] = ["127.0.0.1", "localhost"];

/// Startup cost charged for any server that is not local.
pub const REMOTE_STARTUP_COST: f64 = 25.0;

/// Startup cost charged for a local server.
pub const LOCAL_STARTUP_COST: f64 = 0.0;

/// Destination buffer size for converting non-character, non-binary columns
/// to text when no better estimate is known.
pub const DEFAULT_CONVERT_BUFFER_LEN: usize = 1000;

/// Prefix of the query synthesized from the `table` option.
pub const TABLE_QUERY_PREFIX: &str = "SELECT * FROM ";

/// Shown in place of a missing username in connection errors.
pub const NO_USERNAME: &str = "<none>";

/// Option names accepted by this wrapper and the catalog object each one
/// belongs to.
pub const VALID_OPTIONS: [(&str, OptionContext); 9] = [
    ("servername", OptionContext::Server),
    ("language", OptionContext::Server),
    ("character_set", OptionContext::Server),
    ("port", OptionContext::Server),
    ("username", OptionContext::UserMapping),
    ("password", OptionContext::UserMapping),
    ("database", OptionContext::Table),
    ("query", OptionContext::Table),
    ("table", OptionContext::Table),
];
