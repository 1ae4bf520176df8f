//! Database connection management
//!
//! A [`DatabaseConnection`] is the logical connection context: it owns the
//! connection parameters and one shared SQLite handle. Store operations get
//! at the handle through [`DatabaseConnection::with_connection`], which
//! reconnects when the handle is missing or stale.

use crate::errors::{connection_error, from_rusqlite, Result};
use regex::Regex;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

const MEMORY_URL: &str = ":memory:";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

static MEMORY_INSTANCES: AtomicU64 = AtomicU64::new(1);

/// Parameters of a logical connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    /// `sqlite://<path>`, a bare path, or `:memory:`
    pub url: String,
    /// Only used for connection identity
    pub user: String,
    /// Failed opens tolerated before attempts fail fast
    pub max_connect_attempts: u32,
    /// Pause before the single retry of a failed reconnect
    pub reconnect_wait: Duration,
}

impl ConnectionParams {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            user: String::new(),
            max_connect_attempts: 3,
            reconnect_wait: Duration::from_millis(100),
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn with_max_connect_attempts(mut self, attempts: u32) -> Self {
        self.max_connect_attempts = attempts;
        self
    }

    pub fn with_reconnect_wait(mut self, wait: Duration) -> Self {
        self.reconnect_wait = wait;
        self
    }

    /// Filesystem path (or `:memory:`) the URL points at
    pub fn target(&self) -> &str {
        let url = self.url.trim();
        let stripped = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);
        if stripped.is_empty() {
            MEMORY_URL
        } else {
            stripped
        }
    }

    /// In-memory databases live only as long as their handle. A reconnect
    /// (after `disconnect` or a failed liveness probe) opens a new, empty
    /// database; `with_connection` logs a warning when that happens.
    pub fn is_memory(&self) -> bool {
        self.target() == MEMORY_URL
    }
}

/// Identity of a connection context, used as the registry key
///
/// File databases are identified by URL and user. Every in-memory database
/// is distinct, so in-memory connections also carry an instance number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionKey {
    url: String,
    user: String,
    instance: Option<u64>,
}

impl std::fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.user.is_empty() {
            write!(f, "{}@", self.user)?;
        }
        write!(f, "{}", self.url)?;
        if let Some(instance) = self.instance {
            write!(f, "#{}", instance)?;
        }
        Ok(())
    }
}

struct ConnectionState {
    conn: Option<Connection>,
    failed_attempts: u32,
    last_error: String,
    opened_before: bool,
}

/// A logical database connection shared by all tables bound to it
pub struct DatabaseConnection {
    params: ConnectionParams,
    key: ConnectionKey,
    state: Mutex<ConnectionState>,
}

impl std::fmt::Debug for DatabaseConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConnection")
            .field("key", &self.key)
            .field("connected", &self.has_handle())
            .finish()
    }
}

impl DatabaseConnection {
    /// Create a connection context without opening it
    pub fn new(params: ConnectionParams) -> Self {
        let instance = params
            .is_memory()
            .then(|| MEMORY_INSTANCES.fetch_add(1, Ordering::Relaxed));
        let key = ConnectionKey {
            url: params.url.trim().to_string(),
            user: params.user.clone(),
            instance,
        };
        Self {
            params,
            key,
            state: Mutex::new(ConnectionState {
                conn: None,
                failed_attempts: 0,
                last_error: String::new(),
                opened_before: false,
            }),
        }
    }

    /// Create and connect
    pub fn open(params: ConnectionParams) -> Result<Arc<Self>> {
        let dbcon = Self::new(params);
        dbcon.connect()?;
        Ok(Arc::new(dbcon))
    }

    /// Connected private in-memory database (for tests and scratch work)
    pub fn open_in_memory() -> Result<Arc<Self>> {
        Self::open(ConnectionParams::new(MEMORY_URL))
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    pub fn key(&self) -> &ConnectionKey {
        &self.key
    }

    /// Open the physical connection if it is not open yet
    ///
    /// # Errors
    ///
    /// `Connection` when the database cannot be opened or the failed-attempt
    /// limit has been reached.
    pub fn connect(&self) -> Result<()> {
        let mut state = acquire_lock(&self.state);
        if state.conn.is_some() {
            return Ok(());
        }
        self.connect_locked(&mut state)
    }

    /// Close the physical connection
    pub fn disconnect(&self) -> Result<()> {
        let mut state = acquire_lock(&self.state);
        if let Some(conn) = state.conn.take() {
            tracing::info!(connection = %self.key, "disconnecting");
            conn.close().map_err(|(_, e)| from_rusqlite(e))?;
        }
        Ok(())
    }

    /// Drop the current handle and connect again
    pub fn retry_connect(&self) -> Result<()> {
        let mut state = acquire_lock(&self.state);
        state.conn = None;
        self.connect_locked(&mut state)
    }

    /// True when a handle is open and answers a probe query
    pub fn is_connected(&self) -> bool {
        let state = acquire_lock(&self.state);
        state.conn.as_ref().map(probe).unwrap_or(false)
    }

    /// Failed opens since the last successful connect
    pub fn failed_attempts(&self) -> u32 {
        acquire_lock(&self.state).failed_attempts
    }

    /// Text of the last connection failure, empty if none
    pub fn last_connection_error(&self) -> String {
        acquire_lock(&self.state).last_error.clone()
    }

    /// Forget previous failures so that connecting is attempted again
    pub fn reset_failures(&self) {
        let mut state = acquire_lock(&self.state);
        state.failed_attempts = 0;
        state.last_error.clear();
    }

    /// Run `f` against a live connection
    ///
    /// When the handle is missing or fails the liveness probe and
    /// `auto_reconnect` is set, the connection is re-opened; a failed
    /// re-open is retried once after `reconnect_wait`. The handle is locked
    /// for the duration of `f`, so `f` must not call back into this
    /// connection.
    ///
    /// # Errors
    ///
    /// `Connection` when no live handle can be obtained, otherwise whatever
    /// `f` returns.
    pub fn with_connection<T, F>(&self, auto_reconnect: bool, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut state = acquire_lock(&self.state);

        let live = state.conn.as_ref().map(probe).unwrap_or(false);
        if !live {
            if !auto_reconnect {
                return Err(connection_error(
                    &self.params.url,
                    "not connected and reconnect disabled",
                ));
            }
            if state.conn.take().is_some() {
                tracing::warn!(connection = %self.key, "stale connection, reconnecting");
            }
            if self.params.is_memory() && state.opened_before {
                tracing::warn!(
                    connection = %self.key,
                    memory_reset = true,
                    "reopening in-memory database, previous contents are gone"
                );
            }
            if let Err(first) = self.connect_locked(&mut state) {
                if !self.params.reconnect_wait.is_zero() {
                    std::thread::sleep(self.params.reconnect_wait);
                }
                self.connect_locked(&mut state)
                    .map_err(|e| e.with_source(first))?;
            }
        }

        match state.conn.as_ref() {
            Some(conn) => f(conn),
            None => Err(connection_error(&self.params.url, "no connection handle")),
        }
    }

    fn has_handle(&self) -> bool {
        self.state
            .try_lock()
            .map(|s| s.conn.is_some())
            .unwrap_or(true)
    }

    fn connect_locked(&self, state: &mut ConnectionState) -> Result<()> {
        if state.failed_attempts >= self.params.max_connect_attempts {
            state.last_error = format!(
                "maximum number of connection attempts reached: url={}, user={}",
                self.params.url, self.params.user
            );
            tracing::error!(connection = %self.key, "{}", state.last_error);
            return Err(connection_error(&self.params.url, state.last_error.clone()));
        }

        tracing::info!(connection = %self.key, "connecting");
        match open_configured(&self.params) {
            Ok(conn) => {
                state.conn = Some(conn);
                state.opened_before = true;
                state.failed_attempts = 0;
                state.last_error.clear();
                Ok(())
            }
            Err(e) => {
                state.failed_attempts += 1;
                state.last_error = format!("failed connection attempt: {}", e.message());
                tracing::error!(
                    connection = %self.key,
                    attempts = state.failed_attempts,
                    "cannot connect: {}",
                    e.message()
                );
                Err(connection_error(&self.params.url, state.last_error.clone()))
            }
        }
    }
}

/// Acquire a mutex, recovering the inner value if a previous holder panicked
pub fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("connection mutex was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

fn probe(conn: &Connection) -> bool {
    conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
        .is_ok()
}

fn open_configured(params: &ConnectionParams) -> Result<Connection> {
    let conn = if params.is_memory() {
        Connection::open_in_memory()
    } else {
        Connection::open(params.target())
    }
    .map_err(from_rusqlite)?;

    configure(&conn, params.is_memory())?;
    Ok(conn)
}

/// Apply session settings and install SQL functions on a fresh handle
pub fn configure(conn: &Connection, in_memory: bool) -> Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT).map_err(from_rusqlite)?;
    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(from_rusqlite)?;
    if !in_memory {
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })
        .map_err(from_rusqlite)?;
    }
    install_regexp(conn).map_err(from_rusqlite)?;
    Ok(())
}

/// Register `regexp(pattern, text)` so `text REGEXP pattern` works
///
/// Compiled patterns are cached per statement. NULL never matches.
pub fn install_regexp(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "regexp",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let pattern: Arc<Regex> = ctx.get_or_create_aux(0, |vr| -> std::result::Result<Regex, BoxError> {
                Ok(Regex::new(vr.as_str()?)?)
            })?;
            let is_match = match ctx.get_raw(1) {
                ValueRef::Null => false,
                ValueRef::Integer(n) => pattern.is_match(&n.to_string()),
                ValueRef::Real(x) => pattern.is_match(&x.to_string()),
                ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                    let text = std::str::from_utf8(bytes)
                        .map_err(|e| rusqlite::Error::UserFunctionError(e.into()))?;
                    pattern.is_match(text)
                }
            };
            Ok(is_match)
        },
    )
}
