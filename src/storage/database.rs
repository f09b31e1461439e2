//! Durable handle to the stars database.
//!
//! The database lives in memory while the process runs and is written to
//! `<folder>/<file>` on every [`StarsDatabase::save`]. Saves go through a
//! temporary file and a rename, so a crash mid-save leaves the previous
//! file intact.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, DatabaseName};
use tracing::{debug, info};

use crate::error::{Error, Result};

struct OpenDatabase {
    conn: Connection,
    path: PathBuf,
}

/// Lifecycle wrapper around the in-memory connection and its backing file.
#[derive(Default)]
pub struct StarsDatabase {
    state: Option<OpenDatabase>,
}

impl StarsDatabase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `init` has succeeded and `close` has not been called since.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// Open `<folder>/<file_name>`, loading its content when it exists.
    ///
    /// Calling this again for the same target is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `InitializationFailed` if the folder cannot be created, the
    /// existing file cannot be loaded, or a different target is already open.
    pub fn init(&mut self, folder: &Path, file_name: &str) -> Result<()> {
        let path = folder.join(file_name);

        if let Some(open) = &self.state {
            if open.path == path {
                return Ok(());
            }
            return Err(Error::InitializationFailed(format!(
                "database already open at {}",
                open.path.display()
            )));
        }

        fs::create_dir_all(folder).map_err(|e| {
            Error::InitializationFailed(format!("cannot create {}: {e}", folder.display()))
        })?;

        let mut conn = Connection::open_in_memory()
            .map_err(|e| Error::InitializationFailed(e.to_string()))?;

        if path.exists() {
            conn.restore(
                DatabaseName::Main,
                &path,
                None::<fn(rusqlite::backup::Progress)>,
            )
            .map_err(|e| {
                Error::InitializationFailed(format!("cannot load {}: {e}", path.display()))
            })?;
            info!(path = %path.display(), "Loaded stars database");
        } else {
            info!(path = %path.display(), "Creating new stars database");
        }

        self.state = Some(OpenDatabase { conn, path });
        Ok(())
    }

    /// The live connection.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseIsNotInitialized` before `init` or after `close`.
    pub fn instance(&self) -> Result<&Connection> {
        self.state
            .as_ref()
            .map(|s| &s.conn)
            .ok_or(Error::DatabaseIsNotInitialized)
    }

    /// The live connection, mutably (for transactions).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseIsNotInitialized` before `init` or after `close`.
    pub fn instance_mut(&mut self) -> Result<&mut Connection> {
        self.state
            .as_mut()
            .map(|s| &mut s.conn)
            .ok_or(Error::DatabaseIsNotInitialized)
    }

    /// Write the whole database to its backing file.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseIsNotInitialized` when closed, `DatabaseSaveFailed`
    /// when the file cannot be written.
    pub fn save(&self) -> Result<()> {
        let open = self.state.as_ref().ok_or(Error::DatabaseIsNotInitialized)?;
        let temp_path = temp_path_for(&open.path);

        if temp_path.exists() {
            fs::remove_file(&temp_path)
                .map_err(|e| Error::DatabaseSaveFailed(format!("{}: {e}", temp_path.display())))?;
        }

        open.conn
            .backup(DatabaseName::Main, &temp_path, None)
            .map_err(|e| Error::DatabaseSaveFailed(format!("{}: {e}", temp_path.display())))?;

        fs::rename(&temp_path, &open.path)
            .map_err(|e| Error::DatabaseSaveFailed(format!("{}: {e}", open.path.display())))?;

        debug!(path = %open.path.display(), "Saved stars database");
        Ok(())
    }

    /// Release the connection. Unsaved changes are discarded.
    ///
    /// # Errors
    ///
    /// Returns `Database` if SQLite refuses to close the connection.
    pub fn close(&mut self) -> Result<()> {
        if let Some(open) = self.state.take() {
            open.conn.close().map_err(|(_, e)| Error::Database(e))?;
            debug!(path = %open.path.display(), "Closed stars database");
        }
        Ok(())
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
