// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, anyhow};
use deltabridge::{
    BridgeConfig, CatalogDialect, DuckDbConnection, InputContext, LocalFilesystem, OutputContext,
    OutputMetadata, TableHandler, load_config,
};
use diagnostics::log_debug;

/// Registry table the CLI uses when no configuration file is given.
pub const DEFAULT_REGISTRY_TABLE: &str = "table_registry";

/// Catalog database file used when `--catalog-db` is not given.
pub const DEFAULT_CATALOG_DB: &str = "catalog.duckdb";

/// Everything a command needs: configuration, the working directory, and
/// where the DuckDB catalog lives.
#[derive(Debug, Clone)]
pub struct ShipContext {
    pub config: BridgeConfig,
    pub base: PathBuf,
    pub catalog_db: PathBuf,
}

impl ShipContext {
    /// Without a config file DuckDB cannot run `register_table` procedures, so
    /// the registry table dialect is used.
    pub fn new(config_path: Option<&Path>, catalog_db: PathBuf, base: PathBuf) -> Result<Self> {
        let config = match config_path {
            Some(path) => load_config(path)?,
            None => BridgeConfig {
                catalog: CatalogDialect::RegistryTable {
                    table: DEFAULT_REGISTRY_TABLE.to_string(),
                },
                ..BridgeConfig::default()
            },
        };
        Ok(Self {
            config,
            base,
            catalog_db,
        })
    }

    pub fn handler(&self) -> TableHandler {
        TableHandler::new(&self.config, Arc::new(LocalFilesystem::new(&self.base)))
    }

    pub fn open_catalog(&self) -> Result<DuckDbConnection> {
        let path = if self.catalog_db.is_absolute() {
            self.catalog_db.clone()
        } else {
            self.base.join(&self.catalog_db)
        };
        let path_str = path.display().to_string();
        log_debug!("Opening catalog {path}", path: path_str.as_str());
        DuckDbConnection::open(&path)
            .map_err(|e| anyhow!("Failed to open catalog {}: {e}", path.display()))
    }
}

/// Collects output metadata and registration errors for reporting.
#[derive(Debug, Default)]
pub struct CliContext {
    pub metadata: OutputMetadata,
    pub errors: Vec<String>,
}

impl OutputContext for CliContext {
    fn add_output_metadata(&mut self, metadata: OutputMetadata) {
        self.metadata.extend(metadata);
    }

    fn log_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}

impl InputContext for CliContext {}
