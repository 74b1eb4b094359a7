// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Table identities and the storage locations derived from them.

use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// The (namespace, name) pair addressing one table across write, registration and read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableIdentity {
    namespace: String,
    name: String,
}

impl TableIdentity {
    /// Both segments become path components, so each must be a single
    /// non-empty component.
    pub fn new<N: Into<String>, T: Into<String>>(namespace: N, name: T) -> Result<Self> {
        let namespace = namespace.into();
        let name = name.into();
        validate_segment("namespace", &namespace)?;
        validate_segment("table name", &name)?;
        Ok(Self { namespace, name })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TableIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

fn validate_segment(what: &str, segment: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(BridgeError::invalid_identity(format!("{what} is empty")));
    }
    if segment == "." || segment == ".." {
        return Err(BridgeError::invalid_identity(format!(
            "{what} '{segment}' is not a plain name"
        )));
    }
    if segment.contains(['/', '\\', '\0']) {
        return Err(BridgeError::invalid_identity(format!(
            "{what} '{segment}' contains a path separator"
        )));
    }
    Ok(())
}

/// The orchestration layer's view of a table: schema (namespace), table, and
/// an optional column selection applied on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSlice {
    pub schema: String,
    pub table: String,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
}

impl TableSlice {
    pub fn new<S: Into<String>, T: Into<String>>(schema: S, table: T) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            columns: None,
        }
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn identity(&self) -> Result<TableIdentity> {
        TableIdentity::new(self.schema.as_str(), self.table.as_str())
    }
}

/// Where a table's files live: `root/namespace/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableLocation(PathBuf);

impl TableLocation {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Path of the Delta transaction log directory.
    pub fn log_dir(&self) -> PathBuf {
        self.0.join("_delta_log")
    }
}

impl fmt::Display for TableLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Registration and metadata always use '/' separators.
        let mut out = String::new();
        for component in self.0.components() {
            match component {
                Component::RootDir => out.push('/'),
                other => {
                    if !out.is_empty() && !out.ends_with('/') {
                        out.push('/');
                    }
                    out.push_str(&other.as_os_str().to_string_lossy());
                }
            }
        }
        f.write_str(&out)
    }
}

/// Derives table locations beneath a fixed storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, identity: &TableIdentity) -> TableLocation {
        TableLocation(self.root.join(identity.namespace()).join(identity.name()))
    }
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_ROOT)
    }
}
