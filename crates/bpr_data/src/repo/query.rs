//! Repository query arguments.
//!
//! # Invariants
//! - The convenience key `id` is rewritten to `_id` in native form; a null
//!   `id` is dropped.
//! - A `nested_conditions` mapping is merged into the top level.
//! - A `_id` that is not a native identifier is rejected, never coerced.

use super::{RepoError, RepoResult};
use crate::model::object_id::{self, ObjectId};
use crate::record::{Mapping, ID_FIELD};
use crate::store::StoreError;
use serde_json::Value;

/// Convenience key accepting an identifier as text or native value.
pub const ID_KEY: &str = "id";
/// Key whose mapping is merged into the top-level conditions.
pub const NESTED_CONDITIONS_KEY: &str = "nested_conditions";

/// Key/value conditions for `find`, `find_one`, `delete` and `join`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    conditions: Mapping,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Matches the document with identifier `id`.
    pub fn by_id(id: ObjectId) -> Self {
        Self::new().with(ID_FIELD, object_id::to_value(&id))
    }

    /// Adds one condition; `value` may be a store operator expression.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.insert(key.into(), value.into());
        self
    }

    /// Adds raw sub-field clauses, e.g. `{"users.userId": ...}`.
    pub fn nested(mut self, conditions: Mapping) -> Self {
        let entry = self
            .conditions
            .entry(NESTED_CONDITIONS_KEY)
            .or_insert_with(|| Value::Object(Mapping::new()));
        match entry {
            Value::Object(existing) => existing.extend(conditions),
            other => *other = Value::Object(conditions),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Store filter after identifier rewriting and nested-condition merging.
    pub fn into_filter(self) -> RepoResult<Mapping> {
        let mut filter = self.conditions;

        match filter.remove(ID_KEY) {
            None | Some(Value::Null) => {}
            Some(Value::String(text)) => {
                let id = ObjectId::parse_str(&text)
                    .map_err(|err| RepoError::IdentifierType(err.to_string()))?;
                filter.insert(ID_FIELD.to_string(), object_id::to_value(&id));
            }
            Some(value) if object_id::is_native(&value) => {
                filter.insert(ID_FIELD.to_string(), value);
            }
            Some(other) => {
                return Err(RepoError::IdentifierType(format!(
                    "`{ID_KEY}` must be identifier text or a native identifier, got {other}"
                )));
            }
        }

        match filter.remove(NESTED_CONDITIONS_KEY) {
            None | Some(Value::Null) => {}
            Some(Value::Object(nested)) => filter.extend(nested),
            Some(other) => {
                return Err(RepoError::Store(StoreError::InvalidQuery(format!(
                    "`{NESTED_CONDITIONS_KEY}` must be a mapping, got {other}"
                ))));
            }
        }

        if let Some(id) = filter.get(ID_FIELD) {
            if !object_id::is_native(id) {
                return Err(RepoError::IdentifierType(format!(
                    "`{ID_FIELD}` must be a native identifier, got {id}"
                )));
            }
        }

        Ok(filter)
    }
}

impl From<Mapping> for Query {
    fn from(conditions: Mapping) -> Self {
        Self { conditions }
    }
}
