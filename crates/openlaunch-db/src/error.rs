//! Error types for the persistence layer.

use crate::migrations::MigrationError;

/// SQLSTATE class for integrity constraint violations (unique, foreign key,
/// not-null, check, exclusion).
const SQLSTATE_CLASS_INTEGRITY: &str = "23";

/// SQLSTATE class for syntax errors and access rule violations (undefined
/// table/column, bad SQL, insufficient privilege).
const SQLSTATE_CLASS_PROGRAMMING: &str = "42";

/// Errors that can occur while talking to the database.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// No connection could be checked out of the pool in time.
    #[error("database pool checkout failed: {0}")]
    Pool(#[from] r2d2::Error),

    /// The driver or the server rejected an operation.
    #[error("database error: {0}")]
    Postgres(#[from] postgres::Error),

    /// A query expected exactly one row and found none.
    #[error("{0} not found")]
    NotFound(String),

    /// The blocking task running the database work panicked or was cancelled.
    #[error("database task failed: {0}")]
    Task(String),

    /// Applying embedded migrations failed.
    #[error(transparent)]
    Migration(#[from] MigrationError),
}

impl DbError {
    /// Returns the SQLSTATE code reported by the server, if any.
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            Self::Postgres(e) => e.code().map(|state| state.code()),
            _ => None,
        }
    }

    /// Name of the constraint the server reported as violated, if any.
    pub fn constraint(&self) -> Option<&str> {
        match self {
            Self::Postgres(e) => e.as_db_error().and_then(|db| db.constraint()),
            _ => None,
        }
    }

    /// True when the server rejected a write because it violated a
    /// constraint (SQLSTATE class 23).
    pub fn is_integrity_violation(&self) -> bool {
        self.sqlstate()
            .is_some_and(|code| code.starts_with(SQLSTATE_CLASS_INTEGRITY))
    }

    /// True when the statement itself was wrong: bad syntax, unknown
    /// relation or column, missing privilege (SQLSTATE class 42).
    pub fn is_programming_error(&self) -> bool {
        self.sqlstate()
            .is_some_and(|code| code.starts_with(SQLSTATE_CLASS_PROGRAMMING))
    }
}

impl From<tokio::task::JoinError> for DbError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Task(e.to_string())
    }
}
