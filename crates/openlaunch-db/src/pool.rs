//! Connection pool creation, connectivity checks and disposal.

use crate::DbError;
use postgres::NoTls;
use r2d2::Pool;
use r2d2_postgres::PostgresConnectionManager;
use std::time::Duration;

/// Runtime tunables for the Postgres connection pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbRuntimeSettings {
    /// Connections the pool tries to keep open.
    pub pool_size: u32,

    /// Extra connections allowed on top of `pool_size` under load.
    pub max_overflow: u32,

    /// How long a checkout waits for a free connection.
    pub acquire_timeout: Duration,

    /// Validate each connection before handing it out.
    pub pre_ping: bool,
}

impl DbRuntimeSettings {
    /// Upper bound on open connections.
    pub fn max_size(&self) -> u32 {
        self.pool_size.saturating_add(self.max_overflow)
    }
}

impl Default for DbRuntimeSettings {
    fn default() -> Self {
        Self {
            pool_size: 1,
            max_overflow: 1,
            acquire_timeout: Duration::from_secs(5),
            pre_ping: true,
        }
    }
}

/// Postgres connection manager used by the pool.
pub type DbManager = PostgresConnectionManager<NoTls>;

/// A type alias for the Postgres connection pool.
pub type DbPool = Pool<DbManager>;

/// Creates a new Postgres connection pool.
///
/// The pool is lazy: no connection is opened here, so building it succeeds
/// even while the database is unreachable. Use [`verify_connectivity`] to
/// fail fast at startup.
pub fn create_pool(config: postgres::Config, settings: DbRuntimeSettings) -> DbPool {
    // r2d2 rejects a zero max_size.
    if settings.pool_size == 0 {
        tracing::warn!("database pool_size is 0, clamping to 1");
    }
    let pool_size = settings.pool_size.max(1);
    let max_size = settings.max_size().max(pool_size);

    let manager = PostgresConnectionManager::new(config, NoTls);

    let pool = Pool::builder()
        .max_size(max_size)
        .min_idle(Some(pool_size))
        .connection_timeout(settings.acquire_timeout)
        .test_on_check_out(settings.pre_ping)
        .build_unchecked(manager);

    tracing::debug!(
        pool_size,
        max_size,
        pre_ping = settings.pre_ping,
        "created database pool"
    );

    pool
}

/// Opens a dedicated connection, runs `SELECT 1` and closes it again.
///
/// This deliberately bypasses the pool so a misconfigured database is
/// reported as a connection error rather than a checkout timeout.
///
/// # Errors
///
/// Returns `DbError::Postgres` if the connection or the query fails.
pub fn verify_connectivity(config: &postgres::Config) -> Result<(), DbError> {
    let mut client = config.connect(NoTls)?;
    client.simple_query("SELECT 1;")?;
    client.close()?;
    Ok(())
}

/// Checks that a pooled connection can be obtained and answers `SELECT 1`.
///
/// Blocks for at most the pool's acquire timeout plus the query time.
///
/// # Errors
///
/// Returns `DbError::Pool` when no connection can be checked out and
/// `DbError::Postgres` when the probe query fails.
pub fn ping(pool: &DbPool) -> Result<(), DbError> {
    let mut conn = pool.get()?;
    conn.simple_query("SELECT 1")?;
    Ok(())
}

/// Releases the given pool handle.
///
/// Connections close once the last clone of the pool is dropped; callers
/// should dispose the handle they own after the server has stopped serving.
pub fn dispose(pool: DbPool) {
    let state = pool.state();
    tracing::info!(
        connections = state.connections,
        idle_connections = state.idle_connections,
        "disposing database pool"
    );
    drop(pool);
}
