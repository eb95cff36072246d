//! Embedded SQL migration runner.
//!
//! Migrations are SQL files embedded at compile time. They run sequentially
//! on startup, tracked by the `_openlaunch_migrations` table. Each migration
//! runs exactly once; one that is already recorded is skipped.

use postgres::Client;
use thiserror::Error;

/// A single embedded migration.
struct Migration {
    name: &'static str,
    sql: &'static str,
}

/// All migrations in order. New migrations are appended here.
const MIGRATIONS: &[Migration] = &[Migration {
    name: "000_init",
    sql: include_str!("migrations/000_init.sql"),
}];

/// Name of the table recording applied migrations.
pub const MIGRATIONS_TABLE: &str = "_openlaunch_migrations";

/// Errors that can occur during migration execution.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A SQL statement within a migration failed.
    #[error("migration '{name}' failed: {source}")]
    ExecutionFailed {
        /// The name of the migration that failed.
        name: String,
        /// The underlying driver error.
        source: postgres::Error,
    },

    /// Failed to query migration state.
    #[error("failed to check migration state: {0}")]
    StateQuery(postgres::Error),
}

/// Runs all pending migrations against the given connection.
///
/// Migrations that have already been applied (tracked in
/// `_openlaunch_migrations`) are skipped. New migrations are applied in
/// order and recorded.
///
/// # Errors
///
/// Returns `MigrationError` if any migration fails to execute or if the
/// migration tracking table cannot be queried.
pub fn run_migrations(client: &mut Client) -> Result<usize, MigrationError> {
    run_migrations_from_list(client, MIGRATIONS)
}

fn run_migrations_from_list(
    client: &mut Client,
    migrations: &[Migration],
) -> Result<usize, MigrationError> {
    client
        .batch_execute(&format!(
            "CREATE TABLE IF NOT EXISTS {MIGRATIONS_TABLE} (
                id BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            );"
        ))
        .map_err(|e| MigrationError::ExecutionFailed {
            name: "_openlaunch_migrations_bootstrap".to_string(),
            source: e,
        })?;

    let mut applied = 0;

    for migration in migrations {
        let already_applied: bool = client
            .query_one(
                format!("SELECT COUNT(*) > 0 FROM {MIGRATIONS_TABLE} WHERE name = $1").as_str(),
                &[&migration.name],
            )
            .and_then(|row| row.try_get(0))
            .map_err(MigrationError::StateQuery)?;

        if already_applied {
            tracing::debug!(
                migration = migration.name,
                "migration already applied, skipping"
            );
            continue;
        }

        tracing::info!(migration = migration.name, "applying migration");

        let failed = |e| MigrationError::ExecutionFailed {
            name: migration.name.to_string(),
            source: e,
        };

        let mut tx = client.transaction().map_err(failed)?;
        tx.batch_execute(migration.sql).map_err(failed)?;
        tx.execute(
            format!("INSERT INTO {MIGRATIONS_TABLE} (name) VALUES ($1)").as_str(),
            &[&migration.name],
        )
        .map_err(failed)?;
        tx.commit().map_err(failed)?;

        applied += 1;
    }

    Ok(applied)
}
