//! Transactional session scope over a pooled connection.
//!
//! A session is one checked-out connection with one open transaction. The
//! transaction commits when the work returns `Ok` and rolls back otherwise;
//! dropping an uncommitted `postgres::Transaction` rolls it back.

use crate::{DbError, DbPool};
use postgres::types::ToSql;
use postgres::{Row, Transaction};

/// Runs `work` inside a transaction on a pooled connection.
///
/// Blocking: call from `spawn_blocking` or use [`run_session`].
///
/// # Errors
///
/// Returns the error produced by `work` (after rolling back), or a
/// `DbError` converted into `E` if the checkout, `BEGIN` or `COMMIT` fails.
pub fn with_session<T, E, F>(pool: &DbPool, work: F) -> Result<T, E>
where
    F: FnOnce(&mut Transaction<'_>) -> Result<T, E>,
    E: From<DbError>,
{
    let mut conn = pool.get().map_err(DbError::from)?;
    let mut tx = conn.transaction().map_err(DbError::from)?;

    match work(&mut tx) {
        Ok(value) => {
            tx.commit().map_err(DbError::from)?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = tx.rollback() {
                tracing::warn!(error = %rollback, "session rollback failed");
            }
            Err(e)
        }
    }
}

/// Async form of [`with_session`]: runs the session on the blocking pool.
///
/// # Errors
///
/// Same as [`with_session`], plus `DbError::Task` if the blocking task
/// panics.
pub async fn run_session<T, E, F>(pool: &DbPool, work: F) -> Result<T, E>
where
    F: FnOnce(&mut Transaction<'_>) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: From<DbError> + Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || with_session(&pool, work))
        .await
        .map_err(DbError::from)?
}

/// Runs a query that must return exactly one row.
///
/// `what` names the missing entity in the resulting error.
///
/// # Errors
///
/// Returns `DbError::NotFound` when no row matches and `DbError::Postgres`
/// when the query fails or returns more than one row.
pub fn fetch_one(
    tx: &mut Transaction<'_>,
    sql: &str,
    params: &[&(dyn ToSql + Sync)],
    what: &str,
) -> Result<Row, DbError> {
    tx.query_opt(sql, params)?
        .ok_or_else(|| DbError::NotFound(what.to_string()))
}
