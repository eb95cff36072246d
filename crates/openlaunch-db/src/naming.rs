//! Constraint and index naming convention shared by every table.
//!
//! | Kind | Pattern |
//! |------|---------|
//! | index | `ix_{table}_{table}_{column}` |
//! | unique | `uq_{table}_{column}` |
//! | foreign key | `fk_{table}_{column}_{referred_table}` |
//! | primary key | `pk_{table}` |
//!
//! The index pattern uses the column *label*, which is the column name
//! qualified by its table, hence the repeated table name.

/// Label of a column as used in index names: `{table}_{column}`.
pub fn column_label(table: &str, column: &str) -> String {
    format!("{table}_{column}")
}

/// Name of the index on `table.column`.
pub fn index_name(table: &str, column: &str) -> String {
    format!("ix_{table}_{}", column_label(table, column))
}

/// Name of the unique constraint on `table.column`.
pub fn unique_name(table: &str, column: &str) -> String {
    format!("uq_{table}_{column}")
}

/// Name of the foreign key from `table.column` to `referred_table`.
pub fn foreign_key_name(table: &str, column: &str, referred_table: &str) -> String {
    format!("fk_{table}_{column}_{referred_table}")
}

/// Name of the primary key constraint of `table`.
pub fn primary_key_name(table: &str) -> String {
    format!("pk_{table}")
}
