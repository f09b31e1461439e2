//! Top-level orchestration.
//!
//! [`StarsService`] owns the store, the operation lock, the settings and
//! the document store. Every operation takes the lock first, so a sync,
//! a removal pass and a snapshot never overlap; a second caller gets
//! `Error::Locked`.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::config::Settings;
use crate::error::Result;
use crate::github::{StarredRepositories, StarredRepositoriesSource};
use crate::lock::OperationLock;
use crate::model::Repository;
use crate::storage::{RemovedRepository, Stats, StarsStorage};
use crate::sync::{ImportConfig, ImportStats, Importer};
use crate::vault::{DocumentStore, FsDocumentStore};

/// What a sync should do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    pub full_sync: bool,
    pub remove_unstarred: bool,
}

/// Result of [`StarsService::synchronize`].
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub import: ImportStats,
    pub removed: Vec<RemovedRepository>,
    pub stats: Stats,
}

/// Stars store with its lock and collaborators.
pub struct StarsService<D> {
    settings: Settings,
    storage: RefCell<StarsStorage>,
    lock: OperationLock,
    documents: D,
}

impl StarsService<FsDocumentStore> {
    /// Open the service over the local destination folder.
    ///
    /// # Errors
    ///
    /// See [`StarsService::open`].
    pub fn open_local(settings: Settings) -> Result<Self> {
        let documents = FsDocumentStore::new(settings.destination_folder.clone());
        Self::open(settings, documents)
    }
}

impl<D: DocumentStore> StarsService<D> {
    /// Validate settings, create the folder layout and open the store.
    ///
    /// # Errors
    ///
    /// Returns the validation error, an I/O error for the folders, or
    /// `InitializationFailed`.
    pub fn open(settings: Settings, documents: D) -> Result<Self> {
        settings.validate()?;
        documents.get_or_create_folder(&Settings::repositories_folder())?;

        let storage = StarsStorage::open(&settings.db_folder(), &settings.db_file_name)?;
        Ok(Self {
            settings,
            storage: RefCell::new(storage),
            lock: OperationLock::new(),
            documents,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn lock(&self) -> &OperationLock {
        &self.lock
    }

    /// Import starred repositories from `source`.
    ///
    /// An incremental sync stops at the newest stored repository. When
    /// removal is requested (by `options` or by the settings) the removal
    /// pass runs after a successful import, under the same lock.
    ///
    /// # Errors
    ///
    /// Returns `Locked` if another operation is running, otherwise the
    /// import or removal error.
    // Storage is only borrowed under the operation lock.
    #[allow(clippy::await_holding_refcell_ref)]
    pub async fn synchronize<S, F>(
        &self,
        source: &S,
        options: SyncOptions,
        progress: F,
    ) -> Result<SyncReport>
    where
        S: StarredRepositoriesSource,
        F: FnMut(usize),
    {
        let _guard = self.lock.try_acquire()?;
        let page_size = self.settings.page_size()?;
        let mut storage = self.storage.borrow_mut();

        let config = if options.full_sync {
            ImportConfig::full()
        } else {
            ImportConfig::incremental(storage.get_stats()?.last_repo_id)
        }
        .removing_unstarred(options.remove_unstarred || self.settings.remove_unstarred_on_sync);
        info!(
            full_sync = config.full_sync,
            remove_unstarred = config.remove_unstarred,
            last_repo_id = config.last_repo_id.as_deref().unwrap_or(""),
            page_size = page_size.get(),
            "Starting sync"
        );

        let mut pages = StarredRepositories::new(source, page_size);
        let import = Importer::new(&mut storage)
            .import(&mut pages, &config, progress)
            .await?;

        let removed = if config.remove_unstarred {
            remove_unstarred_pass(&mut storage, &self.documents)?
        } else {
            Vec::new()
        };

        Ok(SyncReport {
            import,
            removed,
            stats: storage.get_stats()?,
        })
    }

    /// Delete unstarred repositories and their notes.
    ///
    /// # Errors
    ///
    /// Returns `Locked`, `RemoveUnstarredRepositoriesFailed`, or the I/O
    /// error of a note that could not be deleted.
    pub fn remove_unstarred(&self) -> Result<Vec<RemovedRepository>> {
        let _guard = self.lock.try_acquire()?;
        remove_unstarred_pass(&mut self.storage.borrow_mut(), &self.documents)
    }

    /// All stored repositories, newest star first.
    ///
    /// # Errors
    ///
    /// Returns `Locked` or `DeserializationFailed`.
    pub fn snapshot(&self) -> Result<Vec<Repository>> {
        let _guard = self.lock.try_acquire()?;
        self.storage.borrow().get_repositories()
    }

    /// Write the snapshot as pretty JSON to `path` in the document store.
    ///
    /// # Errors
    ///
    /// Returns `Locked`, a read error, or the write error.
    pub fn export_snapshot(&self, path: &Path) -> Result<PathBuf> {
        let repositories = self.snapshot()?;
        let content = serde_json::to_string_pretty(&repositories)?;
        let written = self.documents.write_file(path, &content)?;
        info!(count = repositories.len(), path = %written.display(), "Exported snapshot");
        Ok(written)
    }

    /// Store counters.
    ///
    /// # Errors
    ///
    /// Returns `Locked` while another operation runs.
    pub fn stats(&self) -> Result<Stats> {
        let _guard = self.lock.try_acquire()?;
        self.storage.borrow().get_stats()
    }

    /// Close the store.
    ///
    /// # Errors
    ///
    /// Returns `Database` if SQLite refuses to close.
    pub fn close(self) -> Result<()> {
        self.storage.into_inner().close()
    }
}

fn remove_unstarred_pass<D: DocumentStore>(
    storage: &mut StarsStorage,
    documents: &D,
) -> Result<Vec<RemovedRepository>> {
    let removed = storage.remove_unstarred_repositories()?;

    let mut notes_removed = 0;
    for repo in &removed {
        let note = Settings::repository_note_path(&repo.owner, &repo.name);
        match documents.remove_file(&note) {
            Ok(true) => notes_removed += 1,
            Ok(false) => {}
            Err(e) => {
                warn!(path = %note.display(), error = %e, "Failed to remove repository note");
                return Err(e);
            }
        }
    }

    info!(
        repositories = removed.len(),
        notes = notes_removed,
        "Removed unstarred repositories"
    );
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::github::PageSize;
    use crate::github::StarredPage;
    use crate::github::pagination::testing::FakeSource;
    use crate::sync::fixtures::starred_edge;
    use tempfile::TempDir;

    /// Yields to the scheduler before every page.
    struct YieldingSource(FakeSource);

    impl StarredRepositoriesSource for YieldingSource {
        async fn fetch_page(&self, after: &str, page_size: PageSize) -> Result<StarredPage> {
            tokio::task::yield_now().await;
            self.0.fetch_page(after, page_size).await
        }
    }

    fn service(dir: &TempDir) -> StarsService<FsDocumentStore> {
        let settings = Settings {
            destination_folder: dir.path().join("GitHub"),
            ..Settings::default()
        };
        StarsService::open_local(settings).unwrap()
    }

    #[test]
    fn test_open_creates_layout() {
        let dir = TempDir::new().unwrap();
        let _service = service(&dir);

        assert!(dir.path().join("GitHub/db/stars.db").exists());
        assert!(dir.path().join("GitHub/repositories").is_dir());
    }

    #[tokio::test]
    async fn test_incremental_sync_uses_stored_watermark() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);

        let first = FakeSource::single(vec![starred_edge("A", "alice", 1)]);
        service
            .synchronize(&first, SyncOptions::default(), |_| {})
            .await
            .unwrap();

        let second = FakeSource::new(vec![
            Ok(vec![starred_edge("B", "alice", 2), starred_edge("A", "alice", 1)]),
            Ok(vec![starred_edge("OLD", "alice", 0)]),
        ]);
        let report = service
            .synchronize(&second, SyncOptions::default(), |_| {})
            .await
            .unwrap();

        assert!(report.import.stopped_early);
        assert_eq!(report.import.created, 1);
        assert_eq!(second.requests.get(), 1);
        assert_eq!(report.stats.starred_count, 2);
        assert_eq!(report.stats.last_repo_id.as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn test_full_sync_with_removal_deletes_notes() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);
        let note = dir.path().join("GitHub/repositories/bob/repo-b.md");

        let first = FakeSource::single(vec![starred_edge("B", "bob", 2), starred_edge("A", "alice", 1)]);
        service
            .synchronize(&first, SyncOptions::default(), |_| {})
            .await
            .unwrap();
        std::fs::create_dir_all(note.parent().unwrap()).unwrap();
        std::fs::write(&note, "# repo-b").unwrap();

        let second = FakeSource::single(vec![starred_edge("A", "alice", 1)]);
        let options = SyncOptions {
            full_sync: true,
            remove_unstarred: true,
        };
        let report = service.synchronize(&second, options, |_| {}).await.unwrap();

        assert_eq!(report.import.unstarred, 1);
        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.removed[0].owner, "bob");
        assert!(!note.exists());
        assert_eq!(report.stats.unstarred_count, 0);
    }

    #[tokio::test]
    async fn test_concurrent_operations_are_rejected() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);
        let source = YieldingSource(FakeSource::single(vec![starred_edge("A", "alice", 1)]));

        let (synced, removed) = tokio::join!(
            service.synchronize(&source, SyncOptions::default(), |_| {}),
            async { service.remove_unstarred() }
        );

        assert!(synced.is_ok());
        assert!(matches!(removed, Err(Error::Locked)));
        assert!(!service.lock().is_locked());
    }

    #[tokio::test]
    async fn test_export_snapshot_writes_json() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);
        let source = FakeSource::single(vec![starred_edge("A", "alice", 1)]);
        service
            .synchronize(&source, SyncOptions::default(), |_| {})
            .await
            .unwrap();

        let path = service.export_snapshot(Path::new("stars.json")).unwrap();
        let exported: Vec<Repository> =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(exported, service.snapshot().unwrap());
    }
}
