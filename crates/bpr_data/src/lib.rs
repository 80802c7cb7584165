//! Data-access layer for the BPR modeling backend.
//! Maps typed domain records onto a document store.

pub mod logging;
pub mod model;
pub mod record;
pub mod repo;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::object_id::{ObjectId, ObjectIdParseError};
pub use record::{
    Discriminated, Document, FieldSpec, FieldType, Mapping, Record, RecordError, RecordResult,
    ID_FIELD,
};
pub use repo::{
    Collection, ConfigError, ConnectionConfig, EmbeddedConnector, Join, Query, RepoError,
    RepoResult, Repository, StoreConnector,
};
pub use store::{DocumentStore, SqliteDocumentStore, StoreError, StoreResult};

/// Returns the crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
