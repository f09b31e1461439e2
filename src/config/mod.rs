//! Configuration management.
//!
//! Settings live in a JSON file, by default `~/.ghstars/config.json`.
//! Every field is optional in the file; missing fields take their
//! defaults. The GitHub token may come from the environment instead, so
//! it never has to be written to disk.
//!
//! Path resolution priority:
//! 1. Explicit `--config` flag
//! 2. `GHSTARS_CONFIG` environment variable
//! 3. `~/.ghstars/config.json`

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::github::{DEFAULT_ENDPOINT, PageSize};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "GHSTARS_CONFIG";

/// Environment variable overriding `access_token`.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

const DB_FOLDER: &str = "db";
const REPOSITORIES_FOLDER: &str = "repositories";

/// User settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// GitHub personal access token.
    pub access_token: String,
    /// Repositories requested per page (1-100).
    pub page_size: u8,
    /// Root folder for the database and repository notes.
    pub destination_folder: PathBuf,
    pub db_file_name: String,
    pub api_endpoint: String,
    /// Retries per request on transient failures.
    pub max_retries: usize,
    /// Run the removal pass after every sync.
    pub remove_unstarred_on_sync: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            page_size: PageSize::default().get(),
            destination_folder: PathBuf::from("GitHub"),
            db_file_name: "stars.db".to_string(),
            api_endpoint: DEFAULT_ENDPOINT.to_string(),
            max_retries: 1,
            remove_unstarred_on_sync: false,
        }
    }
}

impl Settings {
    /// Validated page size.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when `page_size` is outside 1-100.
    pub fn page_size(&self) -> Result<PageSize> {
        PageSize::new(self.page_size)
    }

    /// Check values that would otherwise fail late.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` or `Config` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        self.page_size()?;
        if self.db_file_name.trim().is_empty() {
            return Err(Error::Config("db_file_name must not be empty".to_string()));
        }
        if self.destination_folder.as_os_str().is_empty() {
            return Err(Error::Config(
                "destination_folder must not be empty".to_string(),
            ));
        }
        url::Url::parse(&self.api_endpoint)
            .map_err(|e| Error::Config(format!("api_endpoint '{}': {e}", self.api_endpoint)))?;
        Ok(())
    }

    /// Folder holding the database file.
    #[must_use]
    pub fn db_folder(&self) -> PathBuf {
        self.destination_folder.join(DB_FOLDER)
    }

    /// Full path of the database file.
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.db_folder().join(&self.db_file_name)
    }

    /// Folder holding one note per repository, relative to the destination.
    #[must_use]
    pub fn repositories_folder() -> PathBuf {
        PathBuf::from(REPOSITORIES_FOLDER)
    }

    /// Note of one repository, relative to the destination.
    #[must_use]
    pub fn repository_note_path(owner: &str, name: &str) -> PathBuf {
        Self::repositories_folder()
            .join(owner)
            .join(format!("{name}.md"))
    }

    /// Replace the token when `token` is set and non-blank.
    #[must_use]
    pub fn with_token_override(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.access_token = token;
        }
        self
    }
}

/// Get the global ghstars directory (`~/.ghstars`).
#[must_use]
pub fn global_ghstars_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".ghstars"))
}

/// Resolve the config file path.
///
/// # Errors
///
/// Returns `Config` when no home directory can be determined.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    global_ghstars_dir()
        .map(|dir| dir.join("config.json"))
        .ok_or_else(|| Error::Config("cannot determine home directory".to_string()))
}

/// Read settings from `path`; a missing file yields the defaults.
///
/// # Errors
///
/// Returns `Config` if the file exists but cannot be read or parsed.
pub fn read_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        debug!(path = %path.display(), "No config file, using defaults");
        return Ok(Settings::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("invalid config {}: {e}", path.display())))
}

/// Read settings and apply the `GITHUB_TOKEN` override.
///
/// # Errors
///
/// See [`read_settings`].
pub fn load_settings(path: &Path) -> Result<Settings> {
    let settings = read_settings(path)?.with_token_override(std::env::var(TOKEN_ENV).ok());
    Ok(settings)
}

/// Write settings as pretty JSON, creating parent directories.
///
/// # Errors
///
/// Returns `Io` or `Json` on failure.
pub fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(settings)?;
    fs::write(path, format!("{content}\n"))?;
    debug!(path = %path.display(), "Saved config");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = read_settings(&dir.path().join("config.json")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.page_size, 50);
        assert_eq!(settings.max_retries, 1);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"page_size": 25, "destination_folder": "Stars"}"#).unwrap();

        let settings = read_settings(&path).unwrap();
        assert_eq!(settings.page_size, 25);
        assert_eq!(settings.destination_folder, PathBuf::from("Stars"));
        assert_eq!(settings.db_file_name, "stars.db");
        assert_eq!(settings.db_path(), PathBuf::from("Stars/db/stars.db"));
    }

    #[test]
    fn test_save_and_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let settings = Settings {
            access_token: "ghp_test".to_string(),
            remove_unstarred_on_sync: true,
            ..Settings::default()
        };

        save_settings(&path, &settings).unwrap();
        assert_eq!(read_settings(&path).unwrap(), settings);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(read_settings(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_page_size() {
        let settings = Settings {
            page_size: 0,
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(Error::InvalidArgument(_))));
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_token_override() {
        let settings = Settings::default().with_token_override(Some("from-env".to_string()));
        assert_eq!(settings.access_token, "from-env");

        let kept = Settings {
            access_token: "from-file".to_string(),
            ..Settings::default()
        }
        .with_token_override(Some("  ".to_string()));
        assert_eq!(kept.access_token, "from-file");
    }

    #[test]
    fn test_repository_note_path() {
        assert_eq!(
            Settings::repository_note_path("rust-lang", "cargo"),
            PathBuf::from("repositories/rust-lang/cargo.md")
        );
    }

    #[test]
    fn test_resolve_config_path_with_explicit() {
        let explicit = PathBuf::from("/custom/ghstars.json");
        assert_eq!(resolve_config_path(Some(&explicit)).unwrap(), explicit);
    }
}
