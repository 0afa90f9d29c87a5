//! `tds_fdw`: foreign data wrapper core for Sybase and Microsoft SQL Server
//!
//! This is the root module of the wrapper. It lets a host query engine expose
//! tables on a remote TDS server as local read-only foreign tables, driving a
//! DB-Library style client through the traits in [`protocol`].
pub mod connection;
pub mod constants;
pub mod cursor;
pub mod decode;
pub mod error;
pub mod fdw;
pub mod hooks;
pub mod host;
pub mod models;
pub mod options;
pub mod planner;
pub mod protocol;
pub mod utils;

// Re-export the types a host integration needs
pub use constants::*;
pub use cursor::{CursorState, ScanCursor};
pub use error::{ErrorKind, Result, TdsError};
pub use fdw::TdsFdw;
pub use host::{ForeignTableId, LogNoticeSink, NoticeSink, OptionCatalog, TupleSlot};
pub use models::*;
pub use options::{resolve_options, validate_options};

#[cfg(test)]
mod tests;
