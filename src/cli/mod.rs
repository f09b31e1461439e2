//! CLI definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// ghstars - mirror your GitHub stars into a local SQLite store
#[derive(Parser, Debug)]
#[command(name = "ghstars", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path (default: ~/.ghstars/config.json)
    #[arg(long, global = true, env = "GHSTARS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the config file, folders and database
    Init {
        /// GitHub access token to store in the config file
        #[arg(long)]
        token: Option<String>,

        /// Destination folder for the database and notes
        #[arg(long)]
        destination: Option<PathBuf>,
    },

    /// Import starred repositories from GitHub
    Sync {
        /// Read every page and mark repositories no longer starred
        #[arg(long)]
        full: bool,

        /// Delete unstarred repositories after the import
        #[arg(long)]
        remove_unstarred: bool,
    },

    /// Show store counters
    Stats,

    /// List stored repositories, newest star first
    List {
        /// Only repositories that are no longer starred
        #[arg(long)]
        unstarred: bool,

        /// Maximum number of repositories to print
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Delete unstarred repositories and their notes
    Prune,

    /// Write all stored repositories as JSON
    Export {
        /// Output file, relative to the destination folder
        #[arg(short, long, default_value = "stars.json")]
        output: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print version information
    Version,
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sync_flags() {
        let cli = Cli::parse_from(["ghstars", "sync", "--full", "--remove-unstarred", "-vv"]);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Commands::Sync {
                full: true,
                remove_unstarred: true
            }
        ));
    }
}
