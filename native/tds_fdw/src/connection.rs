/// Session lifecycle management for TDS servers
///
/// This module opens and tears down a single connection through the client
/// library: runtime initialization, handler installation, login record,
/// connection and optional database selection. It also wraps the
/// compile/execute/fetch calls shared by the planner and the scan cursor.
///
/// Every acquired resource is held by a guard that releases it through the
/// client when dropped. A failure part-way through [`Session::open`] drops
/// the guards acquired so far in reverse order, and an open [`Session`]
/// releases its connection, login record and runtime in that order.
use std::sync::Arc;

use secrecy::ExposeSecret;
use tracing::Span;
use uuid::Uuid;

use crate::error::{Result, TdsError};
use crate::hooks::MessageBridge;
use crate::host::NoticeSink;
use crate::models::ConnectionPlan;
use crate::protocol::{Client, Connection, LoginRecord, ResultsStatus, RowStatus};

/// An open connection to a TDS server plus its login record.
///
/// Only ever handed out fully open; field order is release order.
pub struct Session<C: Client> {
    id: Uuid,
    host: String,
    span: Span,
    bridge: Arc<MessageBridge>,
    conn: Handle<C, C::Connection>,
    _login: Handle<C, C::Login>,
    _runtime: RuntimeGuard<C>,
}

impl<C: Client> Session<C> {
    /// Connect to the server described by `plan`.
    ///
    /// Initializes the client runtime, installs this session's error and
    /// message handlers, fills in a login record, opens the connection and
    /// selects the database when one is configured.
    pub fn open(client: Arc<C>, plan: &ConnectionPlan, sink: Arc<dyn NoticeSink>) -> Result<Self> {
        let id = Uuid::new_v4();
        let host = plan.host_string();
        let span = tracing::debug_span!("tds_session", session_id = %id, host = %host);
        let entered = span.enter();

        tracing::debug!("initializing DB-Library");
        let runtime = RuntimeGuard::init(Arc::clone(&client))?;

        let bridge = Arc::new(MessageBridge::new(sink));
        client.install_handlers(bridge.clone());

        tracing::debug!("getting login structure");
        let mut record = client.new_login().ok_or_else(|| TdsError::LoginAlloc {
            cause: bridge.take_error(),
        })?;
        configure_login(&mut record, plan);
        let login = Handle::new(Arc::clone(&client), record, C::free_login, "login record");

        tracing::debug!(username = plan.display_username(), "connecting to server");
        let connect_error = |cause| TdsError::Connect {
            host: host.clone(),
            username: plan.display_username().to_string(),
            cause,
        };
        let Some(connection) = client.open(login.get()?, &host) else {
            return Err(connect_error(bridge.take_error()));
        };
        let mut conn = Handle::new(Arc::clone(&client), connection, C::close, "connection");
        if let Some(cause) = bridge.take_error() {
            return Err(connect_error(Some(cause)));
        }
        tracing::debug!("connected successfully");

        if let Some(database) = plan.database() {
            tracing::debug!(database, "selecting database");
            let selected = conn.get_mut()?.use_database(database);
            let cause = bridge.take_error();
            if selected.is_err() || cause.is_some() {
                return Err(TdsError::SelectDatabase {
                    database: database.to_string(),
                    cause,
                });
            }
        }

        drop(entered);

        Ok(Session {
            id,
            host,
            span,
            bridge,
            conn,
            _login: login,
            _runtime: runtime,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The `server[:port]` string this session connected to.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn bridge(&self) -> &MessageBridge {
        &self.bridge
    }

    pub fn connection(&self) -> Result<&C::Connection> {
        self.conn.get()
    }

    /// Compile and execute `query`, then retrieve its first result set.
    ///
    /// Returns `false` when the server reports no result set at all.
    pub fn execute(&mut self, query: &str) -> Result<bool> {
        let _entered = self.span.enter();
        let bridge = &self.bridge;
        let conn = self.conn.get_mut()?;

        tracing::debug!(query, "setting database command");
        conn.cmd(query).map_err(|_| {
            bridge.error_or(TdsError::Compile {
                query: query.to_string(),
            })
        })?;
        bridge.raise_pending()?;

        tracing::debug!("executing the query");
        conn.sqlexec().map_err(|_| {
            bridge.error_or(TdsError::Execute {
                query: query.to_string(),
            })
        })?;
        bridge.raise_pending()?;

        tracing::debug!("getting results");
        match conn.results() {
            ResultsStatus::Succeed => {
                bridge.raise_pending()?;
                Ok(true)
            }
            ResultsStatus::NoMoreResults => {
                bridge.raise_pending()?;
                tracing::debug!(query, "query produced no result set");
                Ok(false)
            }
            ResultsStatus::Fail => Err(bridge.error_or(TdsError::Results {
                query: query.to_string(),
            })),
            ResultsStatus::Unknown(code) => Err(bridge.error_or(TdsError::UnknownResults {
                query: query.to_string(),
                code,
            })),
        }
    }

    /// Advance to the next row of the current result set.
    ///
    /// Returns `false` at the end of the result set. `context` completes the
    /// error messages ("Failed to get row {context}").
    pub fn next_row(&mut self, context: &'static str) -> Result<bool> {
        let _entered = self.span.enter();
        let bridge = &self.bridge;
        let conn = self.conn.get_mut()?;

        match conn.next_row() {
            RowStatus::RegularRow => {
                bridge.raise_pending()?;
                Ok(true)
            }
            RowStatus::NoMoreRows => {
                bridge.raise_pending()?;
                Ok(false)
            }
            RowStatus::BufferFull => {
                // Exhaustion is reported as such even if the library also complained.
                if let Some(error) = bridge.take_error() {
                    tracing::debug!(%error, "library error while buffer was full");
                }
                Err(TdsError::BufferFull { context })
            }
            RowStatus::Fail => Err(bridge.error_or(TdsError::FetchRow { context })),
            RowStatus::Unknown(code) => {
                Err(bridge.error_or(TdsError::UnknownRowStatus { context, code }))
            }
        }
    }

    /// Row count reported by the connection, `-1` when unknown.
    pub fn row_count(&self) -> Result<i64> {
        Ok(self.conn.get()?.count())
    }

    /// Release the connection, the login record and the runtime, in that order.
    pub fn close(self) {
        let span = self.span.clone();
        let _entered = span.enter();
        tracing::debug!("closing session");
        drop(self);
    }
}

impl<C: Client> std::fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

fn configure_login<L: LoginRecord>(login: &mut L, plan: &ConnectionPlan) {
    if let Some(user) = plan.username() {
        tracing::debug!(user, "setting login user");
        login.set_user(user);
    }

    if let Some(password) = plan.password() {
        login.set_password(password.expose_secret());
    }

    if let Some(charset) = plan.character_set() {
        tracing::debug!(charset, "setting login character set");
        login.set_charset(charset);
    }

    if let Some(language) = plan.language() {
        tracing::debug!(language, "setting login language");
        login.set_language(language);
    }
}

/// Keeps the client runtime initialized; shuts it down on drop.
struct RuntimeGuard<C: Client> {
    client: Arc<C>,
}

impl<C: Client> RuntimeGuard<C> {
    fn init(client: Arc<C>) -> Result<Self> {
        client.init().map_err(|_| TdsError::LibraryInit)?;
        Ok(Self { client })
    }
}

impl<C: Client> Drop for RuntimeGuard<C> {
    fn drop(&mut self) {
        tracing::debug!("closing DB-Library");
        self.client.exit();
    }
}

/// A client-owned handle released through the client on drop.
///
/// The client's release calls take the handle by value, so `Drop` moves it
/// out of the `Option`. The accessors only see `None` after that, which is
/// reported as `SessionClosed`.
struct Handle<C: Client, T> {
    client: Arc<C>,
    value: Option<T>,
    release: fn(&C, T),
    what: &'static str,
}

impl<C: Client, T> Handle<C, T> {
    fn new(client: Arc<C>, value: T, release: fn(&C, T), what: &'static str) -> Self {
        Self {
            client,
            value: Some(value),
            release,
            what,
        }
    }

    fn get(&self) -> Result<&T> {
        self.value.as_ref().ok_or(TdsError::SessionClosed)
    }

    fn get_mut(&mut self) -> Result<&mut T> {
        self.value.as_mut().ok_or(TdsError::SessionClosed)
    }
}

impl<C: Client, T> Drop for Handle<C, T> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            tracing::debug!(handle = self.what, "releasing");
            (self.release)(&self.client, value);
        }
    }
}
