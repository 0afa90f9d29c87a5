/// Pull-based scan over a foreign table
///
/// A [`ScanCursor`] owns one session for the lifetime of a scan. The query is
/// sent lazily: opening the cursor only connects, and the first call to
/// [`ScanCursor::next_row`] compiles and executes the query and retrieves its
/// result set. Later calls only fetch rows.
///
/// ```text
/// Idle --first next_row--> Running --end of data--> Exhausted
///   |                        |                         |
///   |                   fatal error --> Failed         |
///   +------------------------+------------+------------+--close--> Closed
/// ```
use std::sync::Arc;

use crate::connection::Session;
use crate::decode;
use crate::error::{Result, TdsError};
use crate::host::{NoticeSink, TupleSlot};
use crate::models::{Cell, ConnectionPlan, Row};
use crate::protocol::{Client, Connection};
use crate::utils;

/// Completes row-fetch error messages raised while scanning.
pub const SCAN_CONTEXT: &str = "during query";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Session open, query not yet sent
    Idle,
    /// Query executed, rows available
    Running,
    /// End of data reached
    Exhausted,
    /// A fatal error aborted the scan; only `close` is meaningful
    Failed,
    Closed,
}

/// Row iterator over one execution of the resolved query.
pub struct ScanCursor<C: Client> {
    session: Option<Session<C>>,
    query: String,
    host: String,
    state: CursorState,
    issued: bool,
    rows_fetched: u64,
}

impl<C: Client> ScanCursor<C> {
    /// Open a session for `plan` without sending the query.
    pub fn begin(client: Arc<C>, plan: &ConnectionPlan, sink: Arc<dyn NoticeSink>) -> Result<Self> {
        let session = Session::open(client, plan, sink)?;
        tracing::debug!(session_id = %session.id(), query = plan.query(), "scan started");

        Ok(Self {
            host: session.host().to_string(),
            session: Some(session),
            query: plan.query().to_string(),
            state: CursorState::Idle,
            issued: false,
            rows_fetched: 0,
        })
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    /// True once the query has been sent to the server.
    pub fn is_issued(&self) -> bool {
        self.issued
    }

    pub fn rows_fetched(&self) -> u64 {
        self.rows_fetched
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Fetch the next row, or `None` once the result set is exhausted.
    ///
    /// Any fatal error moves the cursor to [`CursorState::Failed`]; the
    /// caller is expected to abort the scan and call [`ScanCursor::close`].
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        match self.state {
            CursorState::Closed => return Err(TdsError::CursorClosed),
            CursorState::Failed => return Err(TdsError::ScanFailed),
            CursorState::Exhausted => return Ok(None),
            CursorState::Idle | CursorState::Running => {}
        }

        self.advance().inspect_err(|error| {
            tracing::debug!(%error, rows = self.rows_fetched, "scan failed");
            self.state = CursorState::Failed;
        })
    }

    /// Store the next row in `slot`, or leave it empty at the end of the scan.
    pub fn iterate<S: TupleSlot + ?Sized>(&mut self, slot: &mut S) -> Result<()> {
        slot.clear();
        if let Some(row) = self.next_row()? {
            slot.store(row);
        }
        Ok(())
    }

    /// Prepare for another pass over the table.
    ///
    /// The server cursor cannot be repositioned, so this only succeeds while
    /// nothing has been read yet. Once the query has been sent it fails
    /// rather than let a later pass return stale or missing rows.
    pub fn rescan(&mut self) -> Result<()> {
        match self.state {
            CursorState::Idle => Ok(()),
            CursorState::Closed => Err(TdsError::CursorClosed),
            CursorState::Running | CursorState::Exhausted | CursorState::Failed => {
                Err(TdsError::RescanUnsupported {
                    query: self.query.clone(),
                })
            }
        }
    }

    /// Release the session. Safe to call in any state, any number of times.
    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::debug!(rows = self.rows_fetched, state = ?self.state, "ending scan");
            session.close();
        }
        self.state = CursorState::Closed;
    }

    /// Label/value pairs describing the scan for EXPLAIN output.
    pub fn explain(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Remote server", self.host.clone()),
            ("Remote query", self.query.clone()),
            ("Rows fetched", self.rows_fetched.to_string()),
        ]
    }

    fn advance(&mut self) -> Result<Option<Row>> {
        let session = self.session.as_mut().ok_or(TdsError::CursorClosed)?;

        if self.state == CursorState::Idle {
            self.issued = true;
            if !session.execute(&self.query)? {
                return Err(TdsError::NoResults {
                    query: self.query.clone(),
                });
            }
            self.state = CursorState::Running;
        }

        if !session.next_row(SCAN_CONTEXT)? {
            tracing::debug!(rows = self.rows_fetched, "no more rows");
            self.state = CursorState::Exhausted;
            return Ok(None);
        }

        self.rows_fetched += 1;
        tracing::trace!(row = self.rows_fetched, "row fetched");

        read_row(session).map(Some)
    }
}

impl<C: Client> Drop for ScanCursor<C> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<C: Client> std::fmt::Debug for ScanCursor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanCursor")
            .field("query", &self.query)
            .field("state", &self.state)
            .field("rows_fetched", &self.rows_fetched)
            .finish_non_exhaustive()
    }
}

/// Decode every column of the current row, in column order.
///
/// Columns that fail to convert become NULL and are reported as warnings.
/// A library error raised by the failed conversion is consumed with it, so
/// the next fetch does not see it.
fn read_row<C: Client>(session: &Session<C>) -> Result<Row> {
    let conn = session.connection()?;
    let bridge = session.bridge();
    let ncols = conn.num_cols();
    let mut cells: Row = utils::alloc_vec(ncols, "column array")?;

    for column in 0..ncols {
        let cell = match decode::decode_column(conn, column) {
            Ok(cell) => cell,
            Err(error) if !error.is_fatal() => {
                let error = error.with_library_cause(bridge.take_error());
                bridge.warn(&error);
                Cell::Null
            }
            Err(error) => return Err(error),
        };
        cells.push(cell);
    }

    Ok(cells)
}
