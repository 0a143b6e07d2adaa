use std::path::PathBuf;

use tcfg_model::{InvalidPathError, TenantId};

/// Failure reported by a record or flag store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store as a whole could not be reached.
    #[error("record store unavailable: {message}")]
    Unavailable { message: String },

    /// A single table query failed; other tables may still answer.
    #[error("query against {table} failed: {message}")]
    Query { table: String, message: String },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn query(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            table: table.into(),
            message: message.into(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("no configuration found for tenant {tenant}")]
    TenantNotFound { tenant: TenantId },

    #[error("record store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error(transparent)]
    InvalidPath(#[from] InvalidPathError),
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML settings {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("failed to read fixture {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse fixture {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
