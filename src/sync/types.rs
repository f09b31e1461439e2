//! Types shared by the sync engine and its callers.

use serde::Serialize;

/// Options for one import pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportConfig {
    /// Walk every page and mark repositories missing from the remote as
    /// unstarred.
    pub full_sync: bool,
    /// Delete unstarred repositories once the import has committed. The
    /// importer itself never deletes; the caller acts on this flag.
    pub remove_unstarred: bool,
    /// Newest repository already stored; an incremental import stops when
    /// it reaches this id.
    pub last_repo_id: Option<String>,
}

impl ImportConfig {
    /// Incremental import stopping at `last_repo_id`.
    #[must_use]
    pub fn incremental(last_repo_id: Option<String>) -> Self {
        Self {
            full_sync: false,
            remove_unstarred: false,
            last_repo_id,
        }
    }

    /// Request the removal pass after the import.
    #[must_use]
    pub fn removing_unstarred(mut self, remove_unstarred: bool) -> Self {
        self.remove_unstarred = remove_unstarred;
        self
    }

    /// Full import with unstar reconciliation.
    #[must_use]
    pub fn full() -> Self {
        Self {
            full_sync: true,
            remove_unstarred: false,
            last_repo_id: None,
        }
    }
}

/// Outcome of one import pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    /// Repositories seen for the first time.
    pub created: usize,
    /// Repositories already stored and refreshed.
    pub updated: usize,
    /// Repositories marked unstarred by this pass (full sync only).
    pub unstarred: usize,
    /// The incremental watermark was reached before the last page.
    pub stopped_early: bool,
    /// Total starred count reported by GitHub.
    pub total_count: Option<u64>,
}

impl ImportStats {
    /// Total number of repositories written.
    #[must_use]
    pub fn total_processed(&self) -> usize {
        self.created + self.updated
    }
}
