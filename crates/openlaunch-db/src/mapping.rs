//! Conversion between validated schema objects and persistence models.
//!
//! A schema is the data-transfer shape that crosses the API boundary; a
//! model is what gets written to a table. [`Schema::to_model`] converts one
//! into the other generically: the schema is serialized, its null fields
//! and audit fields (`id`, `created_at`, `updated_at`) are removed, and the
//! model is built from what remains. Nested schemas, alone or in lists, are
//! stripped the same way. Other nested values, such as plain structs or
//! JSON payloads, are passed through untouched, `id` fields included.
//!
//! Nested schemas are recognised by their flattened [`AuditFields`]: while
//! [`Schema::to_model`] runs, it serializes as a marker entry instead of
//! the audit values.

use crate::table::AUDIT_COLUMNS;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cell::Cell;

/// Entry emitted by [`AuditFields`] while a schema is being converted.
const SCHEMA_MARKER: &str = "__openlaunch_schema";

thread_local! {
    static CONVERTING: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as converting until dropped.
struct ConvertingGuard {
    previous: bool,
}

impl ConvertingGuard {
    fn enter() -> Self {
        Self {
            previous: CONVERTING.with(|flag| flag.replace(true)),
        }
    }
}

impl Drop for ConvertingGuard {
    fn drop(&mut self) {
        CONVERTING.with(|flag| flag.set(self.previous));
    }
}

/// Errors raised while mapping between schemas and models.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    /// The source value could not be serialized.
    #[error("failed to serialize {type_name}: {source}")]
    Serialize {
        type_name: &'static str,
        source: serde_json::Error,
    },

    /// The remaining fields did not fit the target type.
    #[error("failed to build {type_name}: {source}")]
    Build {
        type_name: &'static str,
        source: serde_json::Error,
    },
}

/// Audit fields carried by every schema.
///
/// Flatten this into a schema with `#[serde(flatten)]`. The values are
/// filled in when a schema is built from a stored model and are dropped
/// when converting back, so clients can never set them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct AuditFields {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Serialize for AuditFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if CONVERTING.with(Cell::get) {
            let mut state = serializer.serialize_struct("AuditFields", 1)?;
            state.serialize_field(SCHEMA_MARKER, &true)?;
            return state.end();
        }

        let mut state = serializer.serialize_struct("AuditFields", 3)?;
        match &self.id {
            Some(id) => state.serialize_field("id", id)?,
            None => state.skip_field("id")?,
        }
        match &self.created_at {
            Some(at) => state.serialize_field("created_at", at)?,
            None => state.skip_field("created_at")?,
        }
        match &self.updated_at {
            Some(at) => state.serialize_field("updated_at", at)?,
            None => state.skip_field("updated_at")?,
        }
        state.end()
    }
}

/// A validated data-transfer object backed by a persistence model.
///
/// ```rust,ignore
/// #[derive(Serialize, Deserialize)]
/// struct OrderSchema {
///     #[serde(flatten)]
///     audit: AuditFields,
///     title: String,
///     lines: Vec<OrderLineSchema>,
/// }
///
/// impl Schema for OrderSchema {
///     type Model = Order;
/// }
///
/// let order: Order = schema.to_model()?;
/// ```
pub trait Schema: Serialize {
    /// The persistence model this schema maps onto.
    type Model: DeserializeOwned;

    /// Builds the model from this schema, recursing into nested schemas.
    ///
    /// # Errors
    ///
    /// Returns `MappingError` when the schema cannot be serialized or the
    /// remaining fields do not match the model.
    fn to_model(&self) -> Result<Self::Model, MappingError> {
        let value = {
            let _converting = ConvertingGuard::enter();
            serde_json::to_value(self).map_err(|source| MappingError::Serialize {
                type_name: std::any::type_name::<Self>(),
                source,
            })?
        };

        serde_json::from_value(persistable(value)).map_err(|source| MappingError::Build {
            type_name: std::any::type_name::<Self::Model>(),
            source,
        })
    }

    /// Builds a schema from a stored model, audit fields included.
    ///
    /// # Errors
    ///
    /// Returns `MappingError` when the model cannot be serialized or does
    /// not fit the schema.
    fn from_model(model: &Self::Model) -> Result<Self, MappingError>
    where
        Self: Sized + DeserializeOwned,
        Self::Model: Serialize,
    {
        let value = serde_json::to_value(model).map_err(|source| MappingError::Serialize {
            type_name: std::any::type_name::<Self::Model>(),
            source,
        })?;

        serde_json::from_value(value).map_err(|source| MappingError::Build {
            type_name: std::any::type_name::<Self>(),
            source,
        })
    }
}

/// Prepares a serialized schema for model construction.
///
/// The top-level object and every nested object carrying the schema marker
/// lose their null fields and audit fields. Other objects keep all their
/// entries; only schemas nested inside them are stripped.
pub fn persistable(value: Value) -> Value {
    strip(value, true)
}

fn strip(value: Value, is_schema: bool) -> Value {
    match value {
        Value::Object(mut map) => {
            let marked = map.remove(SCHEMA_MARKER).is_some();
            Value::Object(strip_object(map, is_schema || marked))
        }
        Value::Array(items) => {
            Value::Array(items.into_iter().map(|item| strip(item, false)).collect())
        }
        other => other,
    }
}

fn strip_object(map: Map<String, Value>, is_schema: bool) -> Map<String, Value> {
    map.into_iter()
        .filter(|(key, value)| {
            !is_schema || (!value.is_null() && !AUDIT_COLUMNS.contains(&key.as_str()))
        })
        .map(|(key, value)| (key, strip(value, false)))
        .collect()
}
