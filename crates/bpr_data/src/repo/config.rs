//! Connection parameters and store connectors.
//!
//! # Responsibility
//! - Hold the fixed connection parameters of one repository.
//! - Turn parameters into a live `DocumentStore` handle.
//!
//! # Invariants
//! - The password never appears in `Debug` output or log lines.
//! - Parameters are immutable once a repository owns them.

use crate::store::{DocumentStore, SqliteDocumentStore, StoreError, StoreResult};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;

pub const ENV_PROTOCOL: &str = "BPR_DB_PROTOCOL";
pub const ENV_USER: &str = "BPR_DB_USER";
pub const ENV_PASSWORD: &str = "BPR_DB_PASSWORD";
pub const ENV_HOST: &str = "BPR_DB_HOST";
pub const ENV_NAME: &str = "BPR_DB_NAME";

/// Protocol served by [`EmbeddedConnector`].
pub const EMBEDDED_PROTOCOL: &str = "sqlite";
/// Host value selecting a private in-memory embedded store.
pub const IN_MEMORY_HOST: &str = ":memory:";

const REDACTED: &str = "***";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required configuration key is not set.
    Missing(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "missing connection setting `{key}`"),
        }
    }
}

impl Error for ConfigError {}

/// Protocol, credentials, host and default database of one store.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    protocol: String,
    user: String,
    password: String,
    host: String,
    default_db: String,
}

impl ConnectionConfig {
    pub fn new(
        protocol: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
        default_db: impl Into<String>,
    ) -> Self {
        Self {
            protocol: protocol.into(),
            user: user.into(),
            password: password.into(),
            host: host.into(),
            default_db: default_db.into(),
        }
    }

    /// Private in-memory embedded store; handy for tests and tooling.
    pub fn in_memory(default_db: impl Into<String>) -> Self {
        Self::new(EMBEDDED_PROTOCOL, "", "", IN_MEMORY_HOST, default_db)
    }

    /// Reads `BPR_DB_*` environment variables.
    ///
    /// # Errors
    /// - `ConfigError::Missing` naming the first unset variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the `BPR_DB_*` keys through `lookup`.
    pub fn from_lookup(mut lookup: impl FnMut(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));
        Ok(Self {
            protocol: required(ENV_PROTOCOL)?,
            user: required(ENV_USER)?,
            password: required(ENV_PASSWORD)?,
            host: required(ENV_HOST)?,
            default_db: required(ENV_NAME)?,
        })
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn default_db(&self) -> &str {
        &self.default_db
    }

    /// Connection string including the password.
    pub fn connection_uri(&self) -> String {
        self.uri_with_password(&self.password)
    }

    /// Connection string safe for logs.
    pub fn redacted_uri(&self) -> String {
        self.uri_with_password(REDACTED)
    }

    fn uri_with_password(&self, password: &str) -> String {
        format!(
            "{}://{}:{}@{}/{}?retryWrites=true&w=majority",
            self.protocol, self.user, password, self.host, self.default_db
        )
    }
}

impl Debug for ConnectionConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("protocol", &self.protocol)
            .field("user", &self.user)
            .field("password", &REDACTED)
            .field("host", &self.host)
            .field("default_db", &self.default_db)
            .finish()
    }
}

/// Opens a store handle for a configuration.
pub trait StoreConnector: Send + Sync {
    fn connect(&self, config: &ConnectionConfig) -> StoreResult<Arc<dyn DocumentStore>>;
}

/// Serves the `sqlite` protocol with [`SqliteDocumentStore`].
///
/// The store file is `<host>/<default_db>.sqlite3`; the host directory must
/// exist. Host `:memory:` opens a private in-memory store.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedConnector;

impl EmbeddedConnector {
    /// Store file for `config`, or `None` for in-memory stores.
    pub fn store_path(config: &ConnectionConfig) -> Option<PathBuf> {
        if config.host() == IN_MEMORY_HOST {
            return None;
        }
        Some(PathBuf::from(config.host()).join(format!("{}.sqlite3", config.default_db())))
    }
}

impl StoreConnector for EmbeddedConnector {
    fn connect(&self, config: &ConnectionConfig) -> StoreResult<Arc<dyn DocumentStore>> {
        if config.protocol() != EMBEDDED_PROTOCOL {
            return Err(StoreError::UnsupportedProtocol(config.protocol().to_string()));
        }
        let store = match Self::store_path(config) {
            Some(path) => SqliteDocumentStore::open(path)?,
            None => SqliteDocumentStore::open_in_memory()?,
        };
        Ok(Arc::new(store))
    }
}
