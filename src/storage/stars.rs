//! Query facade over the stars database.
//!
//! [`StarsStorage`] owns the database lifecycle and exposes the read
//! operations (stats, full snapshot) and the unstarred-removal pass.
//! Writes during a sync go through `sync::Importer`, which borrows the
//! storage for the length of one transaction.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, named_params};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{Repository, Topic};
use crate::storage::database::StarsDatabase;
use crate::storage::queries;
use crate::storage::schema::apply_schema;
use crate::storage::serialization::{
    StoredRepositoryRow, attach_topics, from_stored_row, parse_timestamp,
};

/// Aggregate counters over the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub starred_count: u64,
    pub unstarred_count: u64,
    /// Most recently starred repository still starred; the incremental
    /// sync watermark.
    pub last_repo_id: Option<String>,
    pub last_star_date: Option<DateTime<Utc>>,
    pub last_import_date: Option<DateTime<Utc>>,
}

/// A repository removed by [`StarsStorage::remove_unstarred_repositories`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovedRepository {
    pub owner: String,
    pub name: String,
}

/// Stars store: database lifecycle plus queries.
#[derive(Default)]
pub struct StarsStorage {
    db: StarsDatabase,
}

impl StarsStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or create) the database at `<folder>/<file_name>`, apply the
    /// schema and persist it.
    ///
    /// # Errors
    ///
    /// Returns `InitializationFailed` wrapping the underlying cause. When
    /// this call opened the database it is closed again on failure; an
    /// already open store is left untouched, whatever the target.
    pub fn init(&mut self, folder: &Path, file_name: &str) -> Result<()> {
        if self.db.is_initialized() {
            return self.db.init(folder, file_name);
        }

        let result = self.try_init(folder, file_name);
        if let Err(e) = &result {
            warn!(error = %e, "Stars storage initialization failed");
            if let Err(close_err) = self.db.close() {
                warn!(error = %close_err, "Failed to close database after init failure");
            }
        }
        result.map_err(|e| match e {
            Error::InitializationFailed(_) => e,
            other => Error::InitializationFailed(other.to_string()),
        })
    }

    fn try_init(&mut self, folder: &Path, file_name: &str) -> Result<()> {
        self.db.init(folder, file_name)?;
        apply_schema(self.db.instance_mut()?)
            .map_err(|e| Error::SchemaCreationFailed(e.to_string()))?;
        self.db.save()
    }

    /// Open the store in one step.
    ///
    /// # Errors
    ///
    /// See [`StarsStorage::init`].
    pub fn open(folder: &Path, file_name: &str) -> Result<Self> {
        let mut storage = Self::new();
        storage.init(folder, file_name)?;
        Ok(storage)
    }

    /// Release the database. Unsaved changes are discarded.
    ///
    /// # Errors
    ///
    /// Returns `Database` if SQLite refuses to close.
    pub fn close(&mut self) -> Result<()> {
        self.db.close()
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.db.is_initialized()
    }

    /// Persist the current state.
    ///
    /// # Errors
    ///
    /// See [`StarsDatabase::save`].
    pub fn save(&self) -> Result<()> {
        self.db.save()
    }

    pub(crate) fn connection_mut(&mut self) -> Result<&mut Connection> {
        self.db.instance_mut()
    }

    /// Counters and the sync watermark.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseIsNotInitialized`, `Database` on query failure, or
    /// `DeserializationFailed` on a malformed stored timestamp.
    pub fn get_stats(&self) -> Result<Stats> {
        let conn = self.db.instance()?;
        let (starred, unstarred, last_repo_id, last_star, last_import) = conn.query_row(
            queries::SELECT_STATS,
            [],
            |row| {
                Ok((
                    row.get::<_, i64>("starred_count")?,
                    row.get::<_, i64>("unstarred_count")?,
                    row.get::<_, Option<String>>("last_repo_id")?,
                    row.get::<_, Option<String>>("last_star_date")?,
                    row.get::<_, Option<String>>("last_import_date")?,
                ))
            },
        )?;

        Ok(Stats {
            starred_count: u64::try_from(starred).unwrap_or_default(),
            unstarred_count: u64::try_from(unstarred).unwrap_or_default(),
            last_repo_id,
            last_star_date: last_star
                .map(|v| parse_timestamp("last_star_date", &v))
                .transpose()?,
            last_import_date: last_import
                .map(|v| parse_timestamp("last_import_date", &v))
                .transpose()?,
        })
    }

    /// Every stored repository, starred and unstarred, newest star first,
    /// with owner, license and topics attached.
    ///
    /// # Errors
    ///
    /// Returns `DeserializationFailed` if any row is malformed; no partial
    /// result is returned.
    pub fn get_repositories(&self) -> Result<Vec<Repository>> {
        let conn = self.db.instance()?;
        let mut stmt = conn.prepare(queries::SELECT_REPOSITORIES)?;
        let rows = stmt
            .query_map([], StoredRepositoryRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::DeserializationFailed(format!("repository row: {e}")))?;

        let mut topics_stmt = conn.prepare(queries::SELECT_REPOSITORY_TOPICS)?;
        let mut repositories = Vec::with_capacity(rows.len());
        for row in rows {
            let mut repo = from_stored_row(row)?;
            let topics = topics_stmt
                .query_map(named_params! { ":repo_id": repo.id }, |row| {
                    Ok(Topic::new(
                        row.get::<_, String>("name")?,
                        row.get::<_, i64>("stargazer_count")?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(|e| Error::DeserializationFailed(format!("topic row: {e}")))?;
            attach_topics(&mut repo, topics);
            repositories.push(repo);
        }

        debug!(count = repositories.len(), "Loaded repositories");
        Ok(repositories)
    }

    /// Hard-delete unstarred repositories, then sweep owners, licenses and
    /// topics no longer referenced. Runs in one transaction followed by a
    /// save.
    ///
    /// # Errors
    ///
    /// Returns `RemoveUnstarredRepositoriesFailed`; the store is unchanged.
    /// The save is attempted whether the removal committed or rolled back;
    /// a save failure after a rollback is logged and the removal error wins.
    pub fn remove_unstarred_repositories(&mut self) -> Result<Vec<RemovedRepository>> {
        let outcome = remove_unstarred(self.db.instance_mut()?)
            .map_err(|e| Error::RemoveUnstarredRepositoriesFailed(e.to_string()));

        match (outcome, self.db.save()) {
            (Ok(removed), Ok(())) => {
                info!(count = removed.len(), "Removed unstarred repositories");
                Ok(removed)
            }
            (Ok(_), Err(save_err)) => Err(save_err),
            (Err(e), Ok(())) => {
                warn!(error = %e, "Removal rolled back");
                Err(e)
            }
            (Err(e), Err(save_err)) => {
                warn!(error = %e, save_error = %save_err, "Removal rolled back and save failed");
                Err(e)
            }
        }
    }
}

fn remove_unstarred(conn: &mut Connection) -> rusqlite::Result<Vec<RemovedRepository>> {
    let tx = conn.transaction()?;

    let removed = {
        let mut stmt = tx.prepare(queries::DELETE_UNSTARRED_REPOSITORIES)?;
        stmt.query_map([], |row| {
            Ok(RemovedRepository {
                owner: row.get("owner")?,
                name: row.get("name")?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?
    };

    tx.execute(queries::DELETE_DANGLING_TOPIC_LINKS, [])?;
    let owners = tx.execute(queries::DELETE_ORPHAN_OWNERS, [])?;
    let licenses = tx.execute(queries::DELETE_ORPHAN_LICENSES, [])?;
    let topics = tx.execute(queries::DELETE_ORPHAN_TOPICS, [])?;
    debug!(owners, licenses, topics, "Swept orphaned rows");

    tx.commit()?;
    Ok(removed)
}
