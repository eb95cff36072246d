//! Persistence layer for the OpenLaunch service.
//!
//! Provides Postgres connection pooling (via `r2d2`), the startup
//! connectivity probe, transactional sessions, embedded SQL migrations and
//! the shared persistence base: constraint naming, the table scaffold with
//! audit columns, and generic schema-to-model mapping.
//!
//! The driver is the blocking `postgres` client; async callers go through
//! [`run_session`] or `spawn_blocking`. Building a pool never connects, so
//! startup calls [`verify_connectivity`] before the listener binds.
//! Migrations are SQL files compiled in with `include_str!`.

mod error;
pub mod mapping;
mod migrations;
pub mod naming;
mod pool;
mod session;
mod table;

pub use error::DbError;
pub use mapping::{AuditFields, MappingError, Schema};
pub use migrations::{run_migrations, MigrationError, MIGRATIONS_TABLE};
pub use pool::{
    create_pool, dispose, ping, verify_connectivity, DbManager, DbPool, DbRuntimeSettings,
};
pub use session::{fetch_one, run_session, with_session};
pub use table::{AuditColumns, Table, AUDIT_COLUMNS, SET_UPDATED_AT_FUNCTION};

pub use postgres;
