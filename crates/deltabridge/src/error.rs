// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

// Error types for deltabridge operations

use crate::catalog::RegistrationRecord;

pub type Result<T> = std::result::Result<T, BridgeError>;

/// Boxed source for errors raised by collaborators (Delta Lake, Parquet, Arrow).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors on the write and read paths.
///
/// Every variant is fatal to the operation that produced it. Catalog failures
/// are reported separately through [`RegistrationError`].
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Invalid table identity: {message}")]
    InvalidIdentity { message: String },

    #[error("Schema error: {message}")]
    Schema { message: String },

    #[error("Schema mismatch at {location}: {message}")]
    SchemaMismatch { location: String, message: String },

    #[error("Write to {location} failed: {source}")]
    Write {
        location: String,
        #[source]
        source: BoxError,
    },

    #[error("Table not found at {location}")]
    TableNotFound { location: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    pub fn invalid_identity<S: Into<String>>(message: S) -> Self {
        BridgeError::InvalidIdentity {
            message: message.into(),
        }
    }

    pub fn schema<S: Into<String>>(message: S) -> Self {
        BridgeError::Schema {
            message: message.into(),
        }
    }

    pub fn schema_mismatch<L: ToString, S: Into<String>>(location: L, message: S) -> Self {
        BridgeError::SchemaMismatch {
            location: location.to_string(),
            message: message.into(),
        }
    }

    pub fn write<L: ToString, E: Into<BoxError>>(location: L, source: E) -> Self {
        BridgeError::Write {
            location: location.to_string(),
            source: source.into(),
        }
    }

    pub fn table_not_found<L: ToString>(location: L) -> Self {
        BridgeError::TableNotFound {
            location: location.to_string(),
        }
    }

    /// An on-disk table that exists but can not be decoded.
    pub fn corrupt<L: std::fmt::Display, E: std::fmt::Display>(location: L, source: E) -> Self {
        BridgeError::Schema {
            message: format!("table at {location} is unreadable: {source}"),
        }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        BridgeError::Config {
            message: message.into(),
        }
    }
}

/// Failure reported by a [`CatalogConnection`](crate::CatalogConnection).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ConnectionError {
    pub message: String,
}

impl ConnectionError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        ConnectionError {
            message: message.into(),
        }
    }
}

impl From<duckdb::Error> for ConnectionError {
    fn from(err: duckdb::Error) -> Self {
        ConnectionError::new(err.to_string())
    }
}

/// A catalog registration that did not go through.
///
/// The table is on disk but may not be queryable. Callers log this and carry on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistrationError {
    #[error("Registering {record} failed: {source}")]
    Statement {
        record: RegistrationRecord,
        #[source]
        source: ConnectionError,
    },

    #[error("Committing registration of {record} failed: {source}")]
    Commit {
        record: RegistrationRecord,
        #[source]
        source: ConnectionError,
    },
}

impl RegistrationError {
    pub fn record(&self) -> &RegistrationRecord {
        match self {
            RegistrationError::Statement { record, .. } | RegistrationError::Commit { record, .. } => {
                record
            }
        }
    }
}
