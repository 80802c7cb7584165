//! Document store boundary and embedded backend.
//!
//! # Responsibility
//! - Define the operations the repository needs from a document store.
//! - Evaluate filters, update operators and aggregation stages over JSON
//!   documents for the embedded SQLite backend.
//!
//! # Invariants
//! - Every call blocks until the store answers.
//! - Store failures are returned verbatim; nothing here retries.
//! - A single `update_one` is atomic for the document it touches.

use crate::model::object_id::{self, ObjectId};
use crate::record::Mapping;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod pipeline;
pub mod query;
mod sqlite;
pub mod update;

pub use sqlite::{SqliteDocumentStore, SCHEMA_VERSION};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// Connection protocol has no backend.
    UnsupportedProtocol(String),
    DuplicateKey {
        collection: String,
        id: ObjectId,
    },
    /// Filter, update document or pipeline stage is malformed.
    InvalidQuery(String),
    /// Persisted document body cannot be decoded.
    InvalidDocument(String),
    /// A thread panicked while holding the connection lock.
    Poisoned,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "store schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::UnsupportedProtocol(protocol) => {
                write!(f, "no document store backend for protocol `{protocol}`")
            }
            Self::DuplicateKey { collection, id } => {
                write!(f, "duplicate _id {id} in collection `{collection}`")
            }
            Self::InvalidQuery(message) => write!(f, "invalid query: {message}"),
            Self::InvalidDocument(message) => write!(f, "invalid stored document: {message}"),
            Self::Poisoned => write!(f, "document store connection lock poisoned"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Result of `insert_one`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertOutcome {
    pub acknowledged: bool,
    pub inserted_id: ObjectId,
}

/// Result of `update_one`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched_count: u64,
    pub modified_count: u64,
}

/// Operations of a document-oriented store, scoped by collection name.
///
/// Filters, update documents and pipeline stages use the store's native
/// operator syntax (`$set`, `$addToSet`, `$pull`, `$lookup`, ...).
pub trait DocumentStore: Send + Sync {
    /// Writes one document; assigns `_id` when the document has none.
    fn insert_one(&self, collection: &str, document: Mapping) -> StoreResult<InsertOutcome>;

    /// Every matching document in insertion order.
    fn find(&self, collection: &str, filter: &Mapping) -> StoreResult<Vec<Mapping>>;

    fn find_one(&self, collection: &str, filter: &Mapping) -> StoreResult<Option<Mapping>> {
        Ok(self.find(collection, filter)?.into_iter().next())
    }

    /// Deletes the first match; returns the number of deleted documents.
    fn delete_one(&self, collection: &str, filter: &Mapping) -> StoreResult<u64>;

    fn delete_many(&self, collection: &str, filter: &Mapping) -> StoreResult<u64>;

    /// Applies `update` to the first match.
    fn update_one(
        &self,
        collection: &str,
        filter: &Mapping,
        update: &Mapping,
    ) -> StoreResult<UpdateOutcome>;

    fn aggregate(&self, collection: &str, pipeline: &[Mapping]) -> StoreResult<Vec<Mapping>>;
}

/// Reads a document's `_id` in native form.
pub fn document_id(document: &Mapping) -> Option<ObjectId> {
    document.get(crate::record::ID_FIELD).and_then(object_id::from_value)
}

/// Splits a dotted field path into segments.
pub(crate) fn split_path(path: &str) -> Vec<&str> {
    path.split('.').collect()
}

/// Expects `value` to be a mapping, for operator arguments.
pub(crate) fn expect_mapping<'a>(value: &'a Value, context: &str) -> StoreResult<&'a Mapping> {
    value
        .as_object()
        .ok_or_else(|| StoreError::InvalidQuery(format!("{context} expects a mapping")))
}
