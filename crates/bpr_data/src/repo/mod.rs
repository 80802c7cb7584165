//! Repository façade over a document store.
//!
//! # Responsibility
//! - Name the fixed set of logical collections.
//! - Own connection parameters and the lazily opened store handle.
//! - Translate typed records and query arguments into store operations.
//!
//! # Invariants
//! - Store failures surface unchanged as `RepoError::Store`; nothing retries.
//! - Only unacknowledged inserts and zero-match reads yield empty results.

use crate::record::RecordError;
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod collection;
pub mod config;
pub mod query;
pub mod repository;

pub use collection::Collection;
pub use config::{ConfigError, ConnectionConfig, EmbeddedConnector, StoreConnector};
pub use query::Query;
pub use repository::{Join, Repository};

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    /// The process-wide repository was already installed.
    AlreadyInitialized,
    /// A query identifier is not a native identifier.
    IdentifierType(String),
    Record(RecordError),
    Store(StoreError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyInitialized => write!(f, "repository is already initialized"),
            Self::IdentifierType(message) => write!(f, "invalid identifier: {message}"),
            Self::Record(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::AlreadyInitialized => None,
            Self::IdentifierType(_) => None,
            Self::Record(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<RecordError> for RepoError {
    fn from(value: RecordError) -> Self {
        Self::Record(value)
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}
