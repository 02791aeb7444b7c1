//! Storage service for source and derived files.
//!
//! Names handed to a [`Storage`] are relative, `/`-separated strings such as
//! `photos/cat__t1.jpg`. The pipeline never touches the filesystem directly:
//! it asks storage for a real path to decode from, a writer to encode into,
//! a verbatim copy for pass-through formats, and one bulk delete.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to delete: {}", .0.join(", "))]
    DeleteFailed(Vec<String>),
}

pub trait Storage: Sync {
    /// Filesystem path the backend can decode `name` from.
    fn real_path(&self, name: &str) -> PathBuf;

    /// Open a streamed writer for `name`, replacing any existing file.
    ///
    /// Callers must `flush()` to observe write errors.
    fn writer(&self, name: &str) -> Result<Box<dyn Write + '_>, StorageError>;

    /// Copy `source` to `target` byte for byte.
    fn copy(&self, source: &str, target: &str) -> Result<(), StorageError>;

    /// Delete every name. Missing files count as deleted.
    ///
    /// Fails with [`StorageError::DeleteFailed`] listing the names that
    /// could not be removed.
    fn delete_all(&self, names: &[String]) -> Result<(), StorageError>;
}

/// Storage rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn prepare_parent(path: &Path) -> io::Result<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
            _ => Ok(()),
        }
    }
}

impl Storage for LocalStorage {
    fn real_path(&self, name: &str) -> PathBuf {
        self.root.join(name.trim_start_matches('/'))
    }

    fn writer(&self, name: &str) -> Result<Box<dyn Write + '_>, StorageError> {
        let path = self.real_path(name);
        Self::prepare_parent(&path)?;
        let file = fs::File::create(&path)?;
        Ok(Box::new(BufWriter::new(file)))
    }

    fn copy(&self, source: &str, target: &str) -> Result<(), StorageError> {
        let from = self.real_path(source);
        let to = self.real_path(target);
        Self::prepare_parent(&to)?;
        fs::copy(&from, &to)?;
        Ok(())
    }

    fn delete_all(&self, names: &[String]) -> Result<(), StorageError> {
        let mut failed = Vec::new();
        for name in names {
            match fs::remove_file(self.real_path(name)) {
                Ok(()) => debug!(name = %name, "deleted"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    debug!(name = %name, error = %e, "delete failed");
                    failed.push(name.clone());
                }
            }
        }
        if failed.is_empty() {
            Ok(())
        } else {
            Err(StorageError::DeleteFailed(failed))
        }
    }
}
