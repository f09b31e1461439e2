//! Create the config file, the destination folders and the database.
//!
//! Running `init` again is safe: the existing database is opened as is,
//! and the config file is only rewritten when a flag changes it.

use std::path::PathBuf;

use serde::Serialize;

use crate::config::{read_settings, resolve_config_path, save_settings};
use crate::error::Result;
use crate::service::StarsService;

#[derive(Serialize)]
struct InitOutput {
    config: PathBuf,
    database: PathBuf,
    starred_count: u64,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns an error if the config cannot be written or the store cannot
/// be created.
pub fn execute(
    config: Option<&PathBuf>,
    token: Option<&str>,
    destination: Option<&PathBuf>,
    json: bool,
) -> Result<()> {
    let config_path = resolve_config_path(config.map(PathBuf::as_path))?;
    let mut settings = read_settings(&config_path)?;

    let mut changed = !config_path.exists();
    if let Some(token) = token {
        settings.access_token = token.to_string();
        changed = true;
    }
    if let Some(destination) = destination {
        settings.destination_folder.clone_from(destination);
        changed = true;
    }
    settings.validate()?;
    if changed {
        save_settings(&config_path, &settings)?;
    }

    let database = settings.db_path();
    let service = StarsService::open_local(settings)?;
    let stats = service.stats()?;
    service.close()?;

    if json {
        let output = InitOutput {
            config: config_path,
            database,
            starred_count: stats.starred_count,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Config:   {}", config_path.display());
        println!("Database: {}", database.display());
        if stats.starred_count > 0 {
            println!("Existing store with {} starred repositories", stats.starred_count);
        }
    }

    Ok(())
}
