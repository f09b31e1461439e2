//! Import of starred repositories into the store.
//!
//! One import pass is one SQLite transaction: either every page read in
//! the pass is applied, or none is. The store is saved to disk after the
//! pass whatever its outcome, so a rolled-back import still leaves the
//! last committed state on disk.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Transaction, named_params};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::github::pagination::{StarredRepositories, StarredRepositoriesSource};
use crate::model::Repository;
use crate::storage::StarsStorage;
use crate::storage::queries;
use crate::storage::serialization::{
    StoredRepositoryRow, format_timestamp, from_wire_format, to_stored_row,
};
use crate::sync::types::{ImportConfig, ImportStats};

fn import_failed(err: rusqlite::Error) -> Error {
    Error::ImportFailed(err.to_string())
}

/// Importer for starred repositories.
pub struct Importer<'a> {
    storage: &'a mut StarsStorage,
}

impl<'a> Importer<'a> {
    #[must_use]
    pub fn new(storage: &'a mut StarsStorage) -> Self {
        Self { storage }
    }

    /// Pull pages and upsert every repository in a single transaction.
    ///
    /// An incremental import (`full_sync == false`) stops at the first
    /// repository whose id equals `last_repo_id`; no further page is
    /// requested. A full import walks every page and then marks each
    /// stored repository that was not seen as unstarred.
    ///
    /// `progress` is called after each upsert with the number of distinct
    /// repositories written so far.
    ///
    /// # Errors
    ///
    /// - `RequestFailed` when a page cannot be fetched
    /// - `DeserializationFailed` when a repository is malformed
    /// - `ImportFailed` when a write fails
    /// - `DatabaseSaveFailed` when the pass committed but could not be saved
    ///
    /// On any import error the transaction is rolled back.
    pub async fn import<S, F>(
        &mut self,
        pages: &mut StarredRepositories<'_, S>,
        config: &ImportConfig,
        mut progress: F,
    ) -> Result<ImportStats>
    where
        S: StarredRepositoriesSource,
        F: FnMut(usize),
    {
        let now = Utc::now();
        let outcome = {
            let conn = self.storage.connection_mut()?;
            run_import(conn, pages, config, now, &mut progress).await
        };

        match (outcome, self.storage.save()) {
            (Ok(stats), Ok(())) => {
                info!(
                    processed = stats.total_processed(),
                    created = stats.created,
                    updated = stats.updated,
                    unstarred = stats.unstarred,
                    stopped_early = stats.stopped_early,
                    "Import complete"
                );
                Ok(stats)
            }
            (Ok(_), Err(save_err)) => Err(save_err),
            (Err(e), Ok(())) => {
                warn!(error = %e, "Import rolled back");
                Err(e)
            }
            (Err(e), Err(save_err)) => {
                warn!(error = %e, save_error = %save_err, "Import rolled back and save failed");
                Err(e)
            }
        }
    }
}

async fn run_import<S, F>(
    conn: &mut Connection,
    pages: &mut StarredRepositories<'_, S>,
    config: &ImportConfig,
    now: DateTime<Utc>,
    progress: &mut F,
) -> Result<ImportStats>
where
    S: StarredRepositoriesSource,
    F: FnMut(usize),
{
    let tx = conn.transaction().map_err(import_failed)?;
    let mut seen: HashSet<String> = HashSet::new();
    let mut stats = ImportStats::default();
    let watermark = config
        .last_repo_id
        .as_deref()
        .filter(|_| !config.full_sync);

    'pages: while let Some(batch) = pages.next_batch().await {
        let edges = batch?;
        stats.total_count = pages.total_count();

        for edge in &edges {
            let repo = from_wire_format(edge)?;

            if watermark == Some(repo.id.as_str()) {
                debug!(id = %repo.id, "Reached last imported repository");
                stats.stopped_early = true;
                break 'pages;
            }

            let row = to_stored_row(&repo, now)?;
            let existed = upsert_repository(&tx, &row, &repo).map_err(import_failed)?;
            if seen.insert(repo.id.clone()) {
                if existed {
                    stats.updated += 1;
                } else {
                    stats.created += 1;
                }
            }
            progress(seen.len());
        }
    }

    if config.full_sync {
        stats.unstarred = mark_unstarred(&tx, &seen, now).map_err(import_failed)?;
    }

    tx.commit().map_err(import_failed)?;
    Ok(stats)
}

/// Write one repository with its license, owner and topic links, in that
/// order.
///
/// Returns whether the repository was already stored.
fn upsert_repository(
    tx: &Transaction<'_>,
    row: &StoredRepositoryRow,
    repo: &Repository,
) -> rusqlite::Result<bool> {
    let existed = tx
        .prepare_cached("SELECT 1 FROM repositories WHERE id = ?1")?
        .exists([&row.id])?;

    if let Some(spdx_id) = &row.license {
        tx.prepare_cached(queries::UPSERT_LICENSE)?.execute(named_params! {
            ":spdx_id": spdx_id,
            ":name": row.license_name,
            ":nickname": row.license_nickname,
            ":url": row.license_url,
        })?;
    }

    tx.prepare_cached(queries::UPSERT_OWNER)?.execute(named_params! {
        ":login": row.owner_login,
        ":url": row.owner_url,
        ":is_organization": row.owner_is_organization,
    })?;

    tx.prepare_cached(queries::UPSERT_REPOSITORY)?.execute(named_params! {
        ":id": row.id,
        ":name": row.name,
        ":description": row.description,
        ":url": row.url,
        ":homepage_url": row.homepage_url,
        ":owner": row.owner_login,
        ":is_archived": row.is_archived,
        ":is_fork": row.is_fork,
        ":is_private": row.is_private,
        ":is_template": row.is_template,
        ":latest_release": row.latest_release,
        ":license": row.license,
        ":stargazer_count": row.stargazer_count,
        ":fork_count": row.fork_count,
        ":created_at": row.created_at,
        ":pushed_at": row.pushed_at,
        ":starred_at": row.starred_at,
        ":updated_at": row.updated_at,
        ":imported_at": row.imported_at,
        ":languages": row.languages,
        ":funding_links": row.funding_links,
    })?;

    tx.prepare_cached(queries::DELETE_TOPIC_LINKS)?
        .execute(named_params! { ":repo_id": row.id })?;
    for topic in &repo.repository_topics {
        tx.prepare_cached(queries::UPSERT_TOPIC)?.execute(named_params! {
            ":name": topic.name,
            ":stargazer_count": topic.stargazer_count,
        })?;
        tx.prepare_cached(queries::INSERT_TOPIC_LINK)?.execute(named_params! {
            ":repo_id": row.id,
            ":topic_name": topic.name,
        })?;
    }

    Ok(existed)
}

/// Mark every starred repository not in `seen` as unstarred.
fn mark_unstarred(
    tx: &Transaction<'_>,
    seen: &HashSet<String>,
    now: DateTime<Utc>,
) -> rusqlite::Result<usize> {
    let starred: Vec<String> = tx
        .prepare(queries::SELECT_STARRED_IDS)?
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<_>>()?;

    let unstarred_at = format_timestamp(&now);
    let mut stmt = tx.prepare(queries::MARK_UNSTARRED)?;
    let mut count = 0;
    for id in starred.iter().filter(|id| !seen.contains(*id)) {
        count += stmt.execute(named_params! { ":id": id, ":unstarred_at": unstarred_at })?;
    }

    if count > 0 {
        info!(count, "Marked repositories as unstarred");
    }
    Ok(count)
}
