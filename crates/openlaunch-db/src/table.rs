//! Table scaffold shared by every persistence entity.
//!
//! Each [`Table`] carries the audit columns (`id`, `created_at`,
//! `updated_at`) and names its constraints through [`crate::naming`].
//! `updated_at` is refreshed by the `openlaunch_set_updated_at()` trigger
//! function installed by the `000_init` migration.

use crate::naming;
use chrono::{DateTime, Utc};
use postgres::GenericClient;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Names of the audit columns every table carries.
pub const AUDIT_COLUMNS: [&str; 3] = ["id", "created_at", "updated_at"];

/// Trigger function that stamps `updated_at` on every row update.
pub const SET_UPDATED_AT_FUNCTION: &str = "openlaunch_set_updated_at";

/// A column declared on top of the audit columns.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Column {
    name: &'static str,
    sql_type: &'static str,
    nullable: bool,
    unique: bool,
    references: Option<&'static str>,
}

/// Declarative description of an entity table.
///
/// Names are `'static` on purpose: they are interpolated into DDL and must
/// come from code, never from request data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: &'static str,
    columns: Vec<Column>,
}

impl Table {
    /// Starts a table with only the audit columns.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            columns: Vec::new(),
        }
    }

    /// The table name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Adds a `NOT NULL` column.
    pub fn column(self, name: &'static str, sql_type: &'static str) -> Self {
        self.push(name, sql_type, false, false, None)
    }

    /// Adds a nullable column.
    pub fn nullable_column(self, name: &'static str, sql_type: &'static str) -> Self {
        self.push(name, sql_type, true, false, None)
    }

    /// Adds a `NOT NULL` column with a unique constraint.
    pub fn unique_column(self, name: &'static str, sql_type: &'static str) -> Self {
        self.push(name, sql_type, false, true, None)
    }

    /// Adds a `BIGINT NOT NULL` column referencing `referred_table(id)`.
    pub fn foreign_key(self, name: &'static str, referred_table: &'static str) -> Self {
        self.push(name, "BIGINT", false, false, Some(referred_table))
    }

    fn push(
        mut self,
        name: &'static str,
        sql_type: &'static str,
        nullable: bool,
        unique: bool,
        references: Option<&'static str>,
    ) -> Self {
        self.columns.push(Column {
            name,
            sql_type,
            nullable,
            unique,
            references,
        });
        self
    }

    /// Renders the DDL for the table, its `id` index and the `updated_at`
    /// trigger. The statements are idempotent.
    pub fn create_sql(&self) -> String {
        let table = self.name;
        let mut sql = String::new();

        let _ = writeln!(sql, "CREATE TABLE IF NOT EXISTS {table} (");
        sql.push_str("    id BIGINT GENERATED BY DEFAULT AS IDENTITY,\n");
        sql.push_str("    created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,\n");
        sql.push_str("    updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,\n");
        for column in &self.columns {
            let null = if column.nullable { "" } else { " NOT NULL" };
            let _ = writeln!(sql, "    {} {}{},", column.name, column.sql_type, null);
        }

        let mut constraints = vec![format!(
            "CONSTRAINT {} PRIMARY KEY (id)",
            naming::primary_key_name(table)
        )];
        for column in &self.columns {
            if column.unique {
                constraints.push(format!(
                    "CONSTRAINT {} UNIQUE ({})",
                    naming::unique_name(table, column.name),
                    column.name
                ));
            }
            if let Some(referred) = column.references {
                constraints.push(format!(
                    "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {referred} (id)",
                    naming::foreign_key_name(table, column.name, referred),
                    column.name
                ));
            }
        }
        let _ = writeln!(sql, "    {}\n);", constraints.join(",\n    "));

        let _ = writeln!(
            sql,
            "CREATE INDEX IF NOT EXISTS {} ON {table} (id);",
            naming::index_name(table, "id")
        );
        let _ = writeln!(sql, "DROP TRIGGER IF EXISTS {table}_set_updated_at ON {table};");
        let _ = writeln!(
            sql,
            "CREATE TRIGGER {table}_set_updated_at BEFORE UPDATE ON {table} \
             FOR EACH ROW EXECUTE FUNCTION {SET_UPDATED_AT_FUNCTION}();"
        );

        sql
    }

    /// Executes [`Table::create_sql`] on the given client or transaction.
    ///
    /// # Errors
    ///
    /// Returns the driver error if any statement fails, for example when the
    /// `000_init` migration has not installed the trigger function yet.
    pub fn create<C: GenericClient>(&self, client: &mut C) -> Result<(), postgres::Error> {
        tracing::debug!(table = self.name, "creating table");
        client.batch_execute(&self.create_sql())
    }
}

/// The audit columns as read back from a stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditColumns {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AuditColumns {
    /// Reads `id`, `created_at` and `updated_at` from a row.
    ///
    /// # Errors
    ///
    /// Returns the driver error if a column is missing or has another type.
    pub fn from_row(row: &postgres::Row) -> Result<Self, postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
