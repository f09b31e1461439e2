//! Incremental synchronization of starred repositories.
//!
//! The [`Importer`] drains a `github::StarredRepositories` paginator into
//! the store in one transaction:
//!
//! - **Incremental**: stop at the newest repository already stored
//! - **Full**: walk every page, then mark repositories no longer starred
//!
//! # Example
//!
//! ```ignore
//! use ghstars::github::{GitHubClient, PageSize, StarredRepositories};
//! use ghstars::sync::{ImportConfig, Importer};
//!
//! let config = ImportConfig::incremental(storage.get_stats()?.last_repo_id);
//! let mut pages = StarredRepositories::new(&client, PageSize::default());
//! let stats = Importer::new(&mut storage).import(&mut pages, &config, |_| {}).await?;
//! ```

#[cfg(test)]
pub(crate) mod fixtures;
mod import;
mod types;

pub use import::Importer;
pub use types::{ImportConfig, ImportStats};
