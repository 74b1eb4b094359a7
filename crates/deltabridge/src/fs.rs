// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Filesystem capability used by the writer and reader.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

/// Storage operations the bridge needs, independent of the backend.
///
/// Paths are the logical paths produced by the
/// [`PathResolver`](crate::PathResolver); implementations decide where they
/// physically live.
#[async_trait]
pub trait Filesystem: Send + Sync + std::fmt::Debug {
    /// Create `path` and its parents. With `exist_ok` an existing directory is not an error.
    async fn make_directories(&self, path: &Path, exist_ok: bool) -> io::Result<()>;

    async fn write_file(&self, path: &Path, content: &[u8]) -> io::Result<()>;

    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    async fn exists(&self, path: &Path) -> io::Result<bool>;

    /// URI handed to Delta Lake for the table rooted at `path`.
    async fn table_uri(&self, path: &Path) -> io::Result<String>;

    /// Map a data-file URI reported by Delta Lake back to a path for [`read_file`](Self::read_file).
    fn path_from_uri(&self, uri: &str) -> io::Result<PathBuf>;
}

/// Local disk, with relative paths anchored at a base directory.
#[derive(Debug, Clone)]
pub struct LocalFilesystem {
    base: PathBuf,
}

impl LocalFilesystem {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self { base: base.into() }
    }

    /// Anchored at the process working directory.
    pub fn current_dir() -> io::Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn physical(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base.join(path)
        }
    }
}

#[async_trait]
impl Filesystem for LocalFilesystem {
    async fn make_directories(&self, path: &Path, exist_ok: bool) -> io::Result<()> {
        let physical = self.physical(path);
        if !exist_ok && tokio::fs::try_exists(&physical).await? {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", physical.display()),
            ));
        }
        tokio::fs::create_dir_all(&physical).await
    }

    async fn write_file(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        let physical = self.physical(path);
        if let Some(parent) = physical.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&physical, content).await
    }

    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.physical(path)).await
    }

    async fn exists(&self, path: &Path) -> io::Result<bool> {
        tokio::fs::try_exists(self.physical(path)).await
    }

    async fn table_uri(&self, path: &Path) -> io::Result<String> {
        let canonical = tokio::fs::canonicalize(self.physical(path)).await?;
        Ok(canonical.to_string_lossy().into_owned())
    }

    fn path_from_uri(&self, uri: &str) -> io::Result<PathBuf> {
        match url::Url::parse(uri) {
            Ok(url) if url.scheme() == "file" => url.to_file_path().map_err(|()| {
                io::Error::new(io::ErrorKind::InvalidInput, format!("not a local path: {uri}"))
            }),
            Ok(url) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("unsupported scheme '{}' in {uri}", url.scheme()),
            )),
            // Plain paths do not parse as URLs
            Err(_) => Ok(self.physical(Path::new(uri))),
        }
    }
}
