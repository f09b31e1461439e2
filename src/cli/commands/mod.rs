//! Command implementations.

pub mod completions;
pub mod export;
pub mod init;
pub mod list;
pub mod prune;
pub mod stats;
pub mod sync;
pub mod version;

use std::path::PathBuf;

use crate::config::{Settings, load_settings, resolve_config_path};
use crate::error::{Error, Result};
use crate::service::StarsService;
use crate::vault::FsDocumentStore;

/// Load settings from the resolved config path.
pub(crate) fn load(config: Option<&PathBuf>) -> Result<Settings> {
    let path = resolve_config_path(config.map(PathBuf::as_path))?;
    load_settings(&path)
}

/// Open the service for a store that `init` has already created.
pub(crate) fn open_existing(config: Option<&PathBuf>) -> Result<StarsService<FsDocumentStore>> {
    let settings = load(config)?;
    if !settings.db_path().exists() {
        return Err(Error::DatabaseIsNotInitialized);
    }
    StarsService::open_local(settings)
}
