// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! DeltaBridge - persist Arrow datasets as Delta Lake tables
//!
//! A table is addressed by `(namespace, name)` and lives at
//! `root/namespace/name`. Writes replace the table and register its location
//! with a SQL catalog; reads load the current version back.
//!
//! Set DELTABRIDGE_LOG to control logging (off, error, warn, info, debug).

/// Error types
pub mod error;

/// Table identities and path derivation
pub mod identity;

/// In-memory datasets
pub mod dataset;

/// Logical column types and schema checks
pub mod schema;

// Storage access
pub mod fs;

// Delta Lake write and read paths
pub mod reader;
pub mod writer;

// Catalog registration
pub mod catalog;
pub mod duckdb_catalog;

pub mod config;

/// Orchestration entry points
pub mod handler;

#[cfg(test)]
pub(crate) mod test_utils;

pub use catalog::{BoundParam, CatalogConnection, CatalogDialect, CatalogRegistrar, RegistrationRecord};
pub use config::{BridgeConfig, load_config};
pub use dataset::Dataset;
pub use duckdb_catalog::DuckDbConnection;
pub use error::{BridgeError, ConnectionError, RegistrationError, Result};
pub use fs::{Filesystem, LocalFilesystem};
pub use handler::{DatasetKind, InputContext, OutputContext, TableHandler};
pub use identity::{PathResolver, TableIdentity, TableLocation, TableSlice};
pub use reader::TableReader;
pub use schema::{ColumnSchema, LogicalType, TableSchema, bind, verify};
pub use writer::{MetadataValue, OutputMetadata, TableWriter, WriteMetadata};
