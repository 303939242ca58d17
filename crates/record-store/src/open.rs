use crate::error::{Result, StorageError, StoreError};
use crate::query::CASEFOLD_FN;
use crate::schema::SCHEMA;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, OpenFlags};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// `sqlite://path`, `sqlite:path`, a plain path, or `:memory:`.
    pub connection_string: String,
    /// Pool ceiling; must be positive.
    pub max_connections: u32,
    /// How long a caller waits for a pooled connection before giving up.
    pub acquire_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            connection_string: String::new(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }
}

impl StoreConfig {
    pub fn new(connection_string: impl Into<String>) -> Self {
        StoreConfig { connection_string: connection_string.into(), ..Default::default() }
    }

    pub fn with_max_connections(mut self, n: u32) -> Self {
        self.max_connections = n;
        self
    }

    pub fn with_acquire_timeout(mut self, t: Duration) -> Self {
        self.acquire_timeout = t;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    Memory,
    File(String),
}

fn parse_location(conn_str: &str) -> Result<Location> {
    let s = conn_str.trim();
    if s.is_empty() {
        return Err(StoreError::Configuration(
            "connection string not configured. Run: rdb config --connection-string <sqlite path>".into(),
        ));
    }
    let rest = s
        .strip_prefix("sqlite://")
        .or_else(|| s.strip_prefix("sqlite:"))
        .unwrap_or(s);
    if rest == ":memory:" {
        return Ok(Location::Memory);
    }
    if let Some((scheme, _)) = rest.split_once("://") {
        return Err(StoreError::Configuration(format!(
            "unsupported connection scheme: {scheme}"
        )));
    }
    if rest.is_empty() {
        return Err(StoreError::Configuration(format!("no database path in {s:?}")));
    }
    Ok(Location::File(rest.to_string()))
}

/// Handle to the record database. Owns a bounded connection pool.
///
/// A `Store` is `Send + Sync`; share it by reference across threads. The pool
/// is released by [`Store::close`] or when the store is dropped.
#[derive(Default)]
pub struct Store {
    pool: Option<Pool<SqliteConnectionManager>>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").field("open", &self.is_open()).finish()
    }
}

impl Store {
    pub fn new() -> Self {
        Store { pool: None }
    }

    pub fn open(cfg: &StoreConfig) -> Result<Self> {
        let mut store = Store::new();
        store.init(cfg)?;
        Ok(store)
    }

    /// Opens the pool, checks liveness and bootstraps the schema.
    ///
    /// A pool left over from an earlier `init` is closed first.
    pub fn init(&mut self, cfg: &StoreConfig) -> Result<()> {
        let location = parse_location(&cfg.connection_string)?;
        if cfg.max_connections == 0 {
            return Err(StoreError::Configuration("max_connections must be positive".into()));
        }
        self.close();

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let (manager, in_memory) = match &location {
            // every pooled connection must see the same database
            Location::Memory => {
                let uri = format!("file:rdb-{}?mode=memory&cache=shared", uuid::Uuid::new_v4());
                (SqliteConnectionManager::file(uri), true)
            }
            Location::File(path) => (SqliteConnectionManager::file(path), false),
        };
        let manager = manager.with_flags(flags).with_init(prepare_connection);

        let mut builder = Pool::builder()
            .max_size(cfg.max_connections)
            .connection_timeout(cfg.acquire_timeout.max(Duration::from_millis(1)));
        if in_memory {
            // Shared-cache table locks fail with SQLITE_LOCKED instead of waiting on
            // busy_timeout, so callers queue on a single connection. That connection
            // also keeps the database alive.
            builder = builder.max_size(1).idle_timeout(None).max_lifetime(None);
        }
        let pool = builder
            .build(manager)
            .map_err(|e| StoreError::connectivity("failed to create connection pool", e))?;

        {
            let conn = pool
                .get()
                .map_err(|e| StoreError::connectivity("failed to connect to database", e))?;
            conn.query_row("SELECT 1", [], |r| r.get::<_, i64>(0))
                .map_err(|e| StoreError::connectivity("failed to connect to database", e))?;
            conn.execute_batch(SCHEMA)
                .map_err(|e| StoreError::connectivity("failed to create table", e))?;
        }

        info!(location = ?location, max_connections = cfg.max_connections, "record store opened");
        self.pool = Some(pool);
        Ok(())
    }

    /// Releases every pooled connection. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(pool) = self.pool.take() {
            debug!(connections = pool.state().connections, "closing record store");
            drop(pool);
        }
    }

    pub fn is_open(&self) -> bool {
        self.pool.is_some()
    }

    pub(crate) fn conn(&self) -> std::result::Result<PooledConnection<SqliteConnectionManager>, StorageError> {
        let pool = self.pool.as_ref().ok_or(StorageError::Closed)?;
        Ok(pool.get()?)
    }
}

fn prepare_connection(conn: &mut Connection) -> rusqlite::Result<()> {
    apply_pragmas(conn)?;
    register_casefold(conn)
}

fn apply_pragmas(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    // in-memory databases answer "memory" here; that is fine
    let _mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |r| r.get(0))?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    Ok(())
}

/// `casefold(text)`: Unicode lowercase, so `LIKE` matches beyond ASCII case.
fn register_casefold(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        CASEFOLD_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|s| s.to_lowercase())),
    )
}
