/// Error and message callbacks for the client library
///
/// DB-Library reports failures and server messages out of band, through an
/// error handler and a message handler it calls while a protocol call is in
/// progress. This module turns those callbacks into the wrapper's error model:
///
/// - **Error handler**: always fatal. The error is parked in the bridge and the
///   handler tells the library to cancel the operation. The session raises the
///   parked error as soon as the interrupted call returns.
/// - **Message handler**: never fatal. The message is passed to the host's
///   [`NoticeSink`].
///
/// # Limitations
///
/// Real DB-Library implementations keep one handler pair per process. Every
/// session installs its own bridge when it opens, so with several sessions in
/// one process only the most recently opened bridge receives callbacks.
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{Result, TdsError};
use crate::host::NoticeSink;
use crate::models::{LibraryError, ServerMessage};

/// What the client library should do after its error handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// Abort the in-flight operation (`INT_CANCEL`)
    Cancel,
}

/// Callbacks invoked by the client library.
pub trait ProtocolHandlers: Send + Sync {
    fn on_error(&self, error: LibraryError) -> ErrorAction;

    fn on_message(&self, message: ServerMessage);
}

/// Per-session handler pair bridging callbacks into [`TdsError`]s and notices.
pub struct MessageBridge {
    pending: Mutex<Option<LibraryError>>,
    sink: Arc<dyn NoticeSink>,
}

impl MessageBridge {
    pub fn new(sink: Arc<dyn NoticeSink>) -> Self {
        Self {
            pending: Mutex::new(None),
            sink,
        }
    }

    /// Take the parked library error, if the error handler fired.
    pub fn take_error(&self) -> Option<LibraryError> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Fail with the parked library error, if there is one.
    pub fn raise_pending(&self) -> Result<()> {
        match self.take_error() {
            Some(error) => Err(TdsError::Library(error)),
            None => Ok(()),
        }
    }

    /// The parked library error, or `fallback` when the handler stayed quiet.
    pub fn error_or(&self, fallback: TdsError) -> TdsError {
        self.take_error().map_or(fallback, TdsError::Library)
    }

    /// Report a non-fatal problem to the host.
    pub fn warn(&self, warning: &TdsError) {
        self.sink.warning(warning);
    }
}

impl ProtocolHandlers for MessageBridge {
    fn on_error(&self, error: LibraryError) -> ErrorAction {
        tracing::error!(
            db_error = error.db_error,
            os_error = error.os_error,
            severity = error.severity,
            "{error}"
        );

        // The first error explains the failure; later ones are fallout.
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if pending.is_none() {
            *pending = Some(error);
        }

        ErrorAction::Cancel
    }

    fn on_message(&self, message: ServerMessage) {
        tracing::debug!(msg_number = message.number, "server message received");
        self.sink.notice(&message);
    }
}

impl std::fmt::Debug for MessageBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageBridge")
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}
