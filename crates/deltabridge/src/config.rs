// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Handler configuration, loaded from YAML.

use crate::catalog::CatalogDialect;
use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Storage root used when none is configured.
pub const DEFAULT_ROOT: &str = "target";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Directory under which `namespace/name` tables are created
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Approximate bytes per data file; unset leaves the Delta Lake default
    #[serde(default)]
    pub target_file_size: Option<usize>,
    #[serde(default)]
    pub catalog: CatalogDialect,
}

fn default_root() -> PathBuf {
    PathBuf::from(DEFAULT_ROOT)
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            target_file_size: None,
            catalog: CatalogDialect::default(),
        }
    }
}

impl BridgeConfig {
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: BridgeConfig = serde_yaml_ng::from_str(content)
            .map_err(|e| BridgeError::config(format!("invalid YAML configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.root.as_os_str().is_empty() {
            return Err(BridgeError::config("root cannot be empty"));
        }
        if self.target_file_size == Some(0) {
            return Err(BridgeError::config("target_file_size must be greater than 0"));
        }
        let identifier = self.catalog.identifier();
        if !is_sql_identifier(identifier) {
            return Err(BridgeError::config(format!(
                "catalog identifier '{identifier}' must be letters, digits and '_', optionally dotted"
            )));
        }
        Ok(())
    }
}

/// Load configuration from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<BridgeConfig> {
    let content = std::fs::read_to_string(&path).map_err(|e| {
        BridgeError::config(format!(
            "failed to read config file {}: {e}",
            path.as_ref().display()
        ))
    })?;
    BridgeConfig::from_yaml(&content)
}

/// Identifiers are interpolated into SQL, so only plain (dotted) names are allowed.
fn is_sql_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.split('.').all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}
