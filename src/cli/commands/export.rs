//! Export command implementation.

use std::path::{Path, PathBuf};

use crate::cli::commands::open_existing;
use crate::error::Result;

/// Execute the export command.
///
/// # Errors
///
/// Returns `DatabaseIsNotInitialized` before `init`, a read error, or the
/// write error.
pub fn execute(config: Option<&PathBuf>, output: &Path, json: bool) -> Result<()> {
    let service = open_existing(config)?;
    let written = service.export_snapshot(output)?;
    service.close()?;

    if json {
        println!("{}", serde_json::json!({ "path": written }));
    } else {
        println!("Exported to {}", written.display());
    }
    Ok(())
}
