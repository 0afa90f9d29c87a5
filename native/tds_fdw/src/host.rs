/// Traits for the host query engine's side of the wrapper.
///
/// The host supplies catalog options, receives rows through a tuple slot and
/// shows notices and warnings to the user.
use crate::error::{Result, TdsError};
use crate::models::{ForeignTableOptions, Row, ServerMessage};

/// Identifier of a foreign table in the host catalog.
pub type ForeignTableId = u32;

/// Read access to the host catalog's per-table, per-server and per-user options.
pub trait OptionCatalog {
    fn foreign_table_options(&self, table: ForeignTableId) -> Result<ForeignTableOptions>;
}

/// Destination for the rows produced by a scan.
pub trait TupleSlot {
    fn clear(&mut self);

    fn store(&mut self, row: Row);
}

/// An empty slot (`None`) marks the end of the scan.
impl TupleSlot for Option<Row> {
    fn clear(&mut self) {
        *self = None;
    }

    fn store(&mut self, row: Row) {
        *self = Some(row);
    }
}

/// User-visible, non-fatal output.
pub trait NoticeSink: Send + Sync {
    fn notice(&self, message: &ServerMessage);

    fn warning(&self, warning: &TdsError) {
        let _ = warning;
    }
}

/// Sink that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNoticeSink;

impl NoticeSink for LogNoticeSink {
    fn notice(&self, message: &ServerMessage) {
        tracing::info!(
            msg_number = message.number,
            msg_state = message.state,
            severity = message.severity,
            "{message}"
        );
    }

    fn warning(&self, warning: &TdsError) {
        tracing::warn!(sqlstate = warning.sqlstate(), "{warning}");
    }
}
