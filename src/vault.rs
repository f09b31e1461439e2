//! Document store for the notes folder.
//!
//! The store only needs a few file operations from its host: create
//! folders, write whole files and delete repository notes. All paths are
//! relative to the store root.

use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;

/// File operations on a notes folder.
pub trait DocumentStore {
    /// Create `path` and its parents if needed; returns the full path.
    fn get_or_create_folder(&self, path: &Path) -> Result<PathBuf>;

    /// Create or atomically replace the file at `path`.
    fn write_file(&self, path: &Path, content: &str) -> Result<PathBuf>;

    /// Delete the file at `path`. Returns `false` if it did not exist.
    fn remove_file(&self, path: &Path) -> Result<bool>;
}

/// [`DocumentStore`] over a local directory.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DocumentStore for FsDocumentStore {
    fn get_or_create_folder(&self, path: &Path) -> Result<PathBuf> {
        let full = self.root.join(path);
        fs::create_dir_all(&full)?;
        Ok(full)
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<PathBuf> {
        let full = self.root.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut temp_name = full.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);
        {
            let mut writer = BufWriter::new(File::create(&temp_path)?);
            writer.write_all(content.as_bytes())?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&temp_path, &full)?;

        debug!(path = %full.display(), bytes = content.len(), "Wrote document");
        Ok(full)
    }

    fn remove_file(&self, path: &Path) -> Result<bool> {
        let full = self.root.join(path);
        match fs::remove_file(&full) {
            Ok(()) => {
                debug!(path = %full.display(), "Removed document");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
