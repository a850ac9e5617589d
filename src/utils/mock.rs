use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::{
    storage::{config::StorageConfig, table::Table},
    types::error::DatabaseError,
};

/// A database file inside a throwaway directory. The directory and
/// everything in it is removed on drop.
pub struct TempDatabase {
    dir: TempDir,
    path: PathBuf,
}

impl TempDatabase {
    pub fn new() -> Result<Self, DatabaseError> {
        Self::with_prefix("laurel_test")
    }

    pub fn with_prefix(prefix: &str) -> Result<Self, DatabaseError> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
        let path = dir.path().join("test.db");
        Ok(Self { dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn open(&self) -> Result<Table, DatabaseError> {
        Table::open(&self.path)
    }

    pub fn open_with_config(&self, config: StorageConfig) -> Result<Table, DatabaseError> {
        Table::open_with_config(&self.path, config)
    }

    /// Size of the database file on disk, zero if it does not exist yet.
    pub fn file_len(&self) -> Result<u64, DatabaseError> {
        match std::fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}
