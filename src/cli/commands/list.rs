//! List command implementation.

use std::path::PathBuf;

use colored::Colorize;

use crate::cli::commands::open_existing;
use crate::error::Result;
use crate::model::Repository;

/// Execute the list command.
///
/// # Errors
///
/// Returns `DatabaseIsNotInitialized` before `init`, or a read error.
pub fn execute(
    config: Option<&PathBuf>,
    unstarred: bool,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let service = open_existing(config)?;
    let repositories: Vec<Repository> = service
        .snapshot()?
        .into_iter()
        .filter(|r| r.is_starred() != unstarred)
        .take(limit.unwrap_or(usize::MAX))
        .collect();
    service.close()?;

    if json {
        println!("{}", serde_json::to_string(&repositories)?);
        return Ok(());
    }

    if repositories.is_empty() {
        println!("No repositories.");
        return Ok(());
    }

    for repo in &repositories {
        let full_name = format!("{}/{}", repo.owner.login, repo.name);
        let marker = if repo.is_starred() {
            String::new()
        } else {
            format!(" {}", "(unstarred)".yellow())
        };
        println!(
            "{} {} {}{}",
            full_name.bold(),
            format!("★{}", repo.stargazer_count).yellow(),
            repo.main_language().dimmed(),
            marker
        );
        if let Some(description) = &repo.description {
            println!("    {description}");
        }
    }
    Ok(())
}
