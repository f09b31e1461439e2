//! Prune command: delete unstarred repositories and their notes.

use std::path::PathBuf;

use colored::Colorize;

use crate::cli::commands::open_existing;
use crate::error::Result;

/// Execute the prune command.
///
/// # Errors
///
/// Returns `DatabaseIsNotInitialized` before `init`, or
/// `RemoveUnstarredRepositoriesFailed`.
pub fn execute(config: Option<&PathBuf>, json: bool) -> Result<()> {
    let service = open_existing(config)?;
    let removed = service.remove_unstarred()?;
    service.close()?;

    if json {
        println!("{}", serde_json::json!({ "removed": removed }));
        return Ok(());
    }

    if removed.is_empty() {
        println!("No unstarred repositories to remove.");
    } else {
        println!("{} {} repositories", "Removed".green(), removed.len());
        for repo in &removed {
            println!("  {}/{}", repo.owner, repo.name);
        }
    }
    Ok(())
}
