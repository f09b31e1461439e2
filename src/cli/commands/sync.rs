//! Sync command: import starred repositories from GitHub.
//!
//! Looks up the total starred count first so progress can be shown as a
//! percentage, then runs the import on a single-threaded runtime.

use std::io::{IsTerminal, Write};
use std::path::PathBuf;

use colored::Colorize;
use tracing::debug;

use crate::cli::commands::open_existing;
use crate::error::{Error, Result};
use crate::github::GitHubClient;
use crate::service::{SyncOptions, SyncReport};

/// Percentage progress line on stderr.
struct Progress {
    total: u64,
    enabled: bool,
    last_percent: Option<u64>,
}

impl Progress {
    fn new(total: u64, enabled: bool) -> Self {
        Self {
            total,
            enabled,
            last_percent: None,
        }
    }

    fn percent(&self, done: usize) -> u64 {
        if self.total == 0 {
            return 100;
        }
        (done as u64 * 100 / self.total).min(100)
    }

    fn update(&mut self, done: usize) {
        let percent = self.percent(done);
        if !self.enabled || self.last_percent == Some(percent) {
            return;
        }
        self.last_percent = Some(percent);
        eprint!("\rSyncing starred repositories: {percent:>3}%");
        if let Err(e) = std::io::stderr().flush() {
            debug!(error = %e, "Failed to flush progress line");
        }
    }

    fn finish(&self) {
        if self.enabled && self.last_percent.is_some() {
            eprintln!();
        }
    }
}

/// Execute the sync command.
///
/// # Errors
///
/// Returns `DatabaseIsNotInitialized` before `init`, `Config` without a
/// token, or the import error.
pub fn execute(
    config: Option<&PathBuf>,
    full: bool,
    remove_unstarred: bool,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let service = open_existing(config)?;
    let client = GitHubClient::from_settings(service.settings())?;
    let options = SyncOptions {
        full_sync: full,
        remove_unstarred,
    };

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Other(format!("Failed to create tokio runtime: {e}")))?;

    let show_progress = !json && !quiet && std::io::stderr().is_terminal();
    let report = rt.block_on(async {
        let total = client.total_starred_count().await?;
        debug!(total, "Starred repositories on GitHub");

        let mut progress = Progress::new(total, show_progress);
        let result = service
            .synchronize(&client, options, |done| progress.update(done))
            .await;
        progress.finish();
        result
    })?;
    service.close()?;

    print_report(&report, json)
}

fn print_report(report: &SyncReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
        return Ok(());
    }

    let import = &report.import;
    println!("{}", "Sync complete".green().bold());
    println!("  Processed: {}", import.total_processed());
    println!("  New:       {}", import.created);
    println!("  Updated:   {}", import.updated);
    if import.unstarred > 0 {
        println!("  Unstarred: {}", import.unstarred.to_string().yellow());
    }
    if !report.removed.is_empty() {
        println!("  Removed:   {}", report.removed.len());
    }
    if import.stopped_early {
        println!("  {}", "Stopped at the last imported repository".dimmed());
    }
    println!(
        "  Store:     {} starred, {} unstarred",
        report.stats.starred_count, report.stats.unstarred_count
    );
    Ok(())
}
