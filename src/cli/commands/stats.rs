//! Stats command implementation.

use std::path::PathBuf;

use colored::Colorize;

use crate::cli::commands::open_existing;
use crate::error::Result;
use crate::storage::serialization::format_timestamp;

/// Execute the stats command.
///
/// # Errors
///
/// Returns `DatabaseIsNotInitialized` before `init`, or a read error.
pub fn execute(config: Option<&PathBuf>, json: bool) -> Result<()> {
    let service = open_existing(config)?;
    let stats = service.stats()?;
    service.close()?;

    if json {
        println!("{}", serde_json::to_string(&stats)?);
        return Ok(());
    }

    let date = |d: Option<chrono::DateTime<chrono::Utc>>| {
        d.as_ref().map_or_else(|| "never".to_string(), format_timestamp)
    };

    println!("{}", "GitHub Stars".cyan().bold());
    println!("  Starred:     {}", stats.starred_count.to_string().green());
    println!("  Unstarred:   {}", stats.unstarred_count.to_string().yellow());
    println!("  Last star:   {}", date(stats.last_star_date));
    println!("  Last import: {}", date(stats.last_import_date));
    if let Some(id) = &stats.last_repo_id {
        println!("  Watermark:   {}", id.dimmed());
    }
    Ok(())
}
