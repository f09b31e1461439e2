//! Cursor pagination over starred repositories.
//!
//! [`StarredRepositories`] turns a [`StarredRepositoriesSource`] into a lazy,
//! forward-only sequence of edge batches. The consumer pulls with
//! [`StarredRepositories::next_batch`] and stops early with a plain `break`;
//! no further request is made once it stops pulling.

use std::future::Future;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::github::types::StarredRepositoryEdge;

/// Largest page GitHub accepts for connection queries.
pub const MAX_PAGE_SIZE: u8 = 100;

/// Validated page size (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSize(u8);

impl PageSize {
    /// Validate a page size.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when the size is outside 1-100.
    pub fn new(size: u8) -> Result<Self> {
        if size == 0 || size > MAX_PAGE_SIZE {
            return Err(Error::InvalidArgument(format!(
                "page size must be 1-{MAX_PAGE_SIZE}, got {size}"
            )));
        }
        Ok(Self(size))
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(50)
    }
}

/// One fetched page.
#[derive(Debug, Clone)]
pub struct StarredPage {
    pub repositories: Vec<StarredRepositoryEdge>,
    /// Total number of starred repositories, stable across a sync.
    pub total_count: u64,
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// Anything that can serve pages of starred repositories.
///
/// Implemented by the GitHub client; tests provide in-memory sources.
/// Retrying is the source's concern, the paginator never retries.
pub trait StarredRepositoriesSource {
    /// Fetch the page following `after` (empty string = first page).
    fn fetch_page(&self, after: &str, page_size: PageSize)
    -> impl Future<Output = Result<StarredPage>>;
}

/// Lazy, non-restartable sequence of edge batches.
pub struct StarredRepositories<'a, S> {
    source: &'a S,
    page_size: PageSize,
    after: String,
    has_next_page: bool,
    total_count: Option<u64>,
    pages_fetched: usize,
    edges_fetched: usize,
}

impl<'a, S: StarredRepositoriesSource> StarredRepositories<'a, S> {
    /// Start from the newest star.
    #[must_use]
    pub fn new(source: &'a S, page_size: PageSize) -> Self {
        Self::starting_after(source, page_size, String::new())
    }

    /// Start after an opaque cursor from a previous page.
    #[must_use]
    pub fn starting_after(source: &'a S, page_size: PageSize, cursor: String) -> Self {
        Self {
            source,
            page_size,
            after: cursor,
            has_next_page: true,
            total_count: None,
            pages_fetched: 0,
            edges_fetched: 0,
        }
    }

    /// Total count reported by the last fetched page.
    #[must_use]
    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    /// Number of edges handed out so far.
    #[must_use]
    pub fn edges_fetched(&self) -> usize {
        self.edges_fetched
    }

    /// Whether another call to `next_batch` may yield a batch.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        !self.has_next_page
    }

    /// Fetch the next batch.
    ///
    /// Returns `None` once the remote reports no further pages. A failure is
    /// yielded exactly once and ends the sequence.
    pub async fn next_batch(&mut self) -> Option<Result<Vec<StarredRepositoryEdge>>> {
        if !self.has_next_page {
            return None;
        }

        match self.source.fetch_page(&self.after, self.page_size).await {
            Ok(page) => {
                self.pages_fetched += 1;
                self.edges_fetched += page.repositories.len();
                self.total_count = Some(page.total_count);
                self.has_next_page = page.has_next_page;

                match page.end_cursor {
                    Some(cursor) => self.after = cursor,
                    None if page.has_next_page => {
                        // Without a cursor the next request would restart from the top.
                        warn!(page = self.pages_fetched, "Page has more results but no end cursor, stopping");
                        self.has_next_page = false;
                    }
                    None => self.after.clear(),
                }

                debug!(
                    page = self.pages_fetched,
                    fetched = self.edges_fetched,
                    total = page.total_count,
                    has_next_page = self.has_next_page,
                    "Fetched page of starred repositories"
                );
                Some(Ok(page.repositories))
            }
            Err(e) => {
                self.has_next_page = false;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory page source shared by pagination and sync tests.

    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    use super::{PageSize, StarredPage, StarredRepositoriesSource};
    use crate::error::{Error, Result};
    use crate::github::types::StarredRepositoryEdge;

    /// Serves pre-built pages in order, recording the cursors it was asked for.
    pub struct FakeSource {
        pages: RefCell<VecDeque<Result<Vec<StarredRepositoryEdge>>>>,
        total_count: u64,
        pub requests: Cell<usize>,
        pub cursors: RefCell<Vec<String>>,
    }

    impl FakeSource {
        pub fn new(pages: Vec<Result<Vec<StarredRepositoryEdge>>>) -> Self {
            let total_count = pages
                .iter()
                .filter_map(|p| p.as_ref().ok())
                .map(|p| p.len() as u64)
                .sum();
            Self {
                pages: RefCell::new(pages.into()),
                total_count,
                requests: Cell::new(0),
                cursors: RefCell::new(Vec::new()),
            }
        }

        /// A single successful page.
        pub fn single(edges: Vec<StarredRepositoryEdge>) -> Self {
            Self::new(vec![Ok(edges)])
        }
    }

    impl StarredRepositoriesSource for FakeSource {
        async fn fetch_page(&self, after: &str, _page_size: PageSize) -> Result<StarredPage> {
            self.requests.set(self.requests.get() + 1);
            self.cursors.borrow_mut().push(after.to_string());

            let next = self
                .pages
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(Error::Other("no more pages".to_string())))?;
            let has_next_page = !self.pages.borrow().is_empty();
            let page_number = self.requests.get();

            Ok(StarredPage {
                repositories: next,
                total_count: self.total_count,
                has_next_page,
                end_cursor: has_next_page.then(|| format!("cursor-{page_number}")),
            })
        }
    }
}
