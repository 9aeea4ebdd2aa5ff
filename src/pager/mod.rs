//! Cursor-based pagination controller.
//!
//! Owns the browsing session state (category/search filter, current page,
//! cursor stack) and talks to the external [`CatalogStore`] one page at a
//! time. After each successful load it publishes the new record list through
//! its [`RecordFeed`] and hands the list to the prefetch scheduler for
//! thumbnail resolution.
//!
//! # Concurrency Model
//!
//! - One active load per controller: a `next_page`/`prev_page`/`load_page`
//!   call while a load is outstanding is rejected, never queued, so
//!   interleaved completions cannot corrupt the cursor stack.
//! - State commits only after a successful query; a failed or timed-out load
//!   leaves the prior state and record list untouched.
//! - Two controller instances are fully independent; there is no hidden
//!   process-wide state.

mod feed;

pub use feed::RecordFeed;

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::config::PagerConfig;
use crate::model::CatalogRecord;
use crate::prefetch::PrefetchScheduler;
use crate::store::{CatalogStore, Cursor, PageQuery, StoreError, title_prefix_range};

/// Errors surfaced by page loads.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A load is already in flight for this controller.
    #[error("a page load is already in flight for this controller")]
    Busy,

    /// The catalog query exceeded the overall page-load timeout.
    #[error("catalog page query timed out after {timeout:?}")]
    Timeout {
        /// The configured bound that was exceeded.
        timeout: Duration,
    },

    /// The catalog store failed the query.
    #[error("catalog store error: {0}")]
    Store(#[from] StoreError),
}

/// Immutable view of the controller's pagination state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationSnapshot {
    /// Active category filter.
    pub category: String,
    /// Active search term (empty when unfiltered).
    pub search: String,
    /// 0-based index of the current page.
    pub page_index: usize,
    /// Number of page cursors recorded so far.
    pub cursor_depth: usize,
    /// Whether the last query indicated more records are available.
    pub has_next: bool,
}

impl PaginationSnapshot {
    /// 1-based page number for display.
    #[must_use]
    pub fn display_page(&self) -> usize {
        self.page_index + 1
    }
}

#[derive(Debug)]
struct PagerState {
    category: String,
    search: String,
    page_index: usize,
    /// `cursor_stack[i]` resumes the query after page `i`'s final record,
    /// i.e. it is the cursor needed to fetch page `i + 1`. Appended only the
    /// first time a page index is visited forward.
    cursor_stack: Vec<Cursor>,
    has_next: bool,
}

impl PagerState {
    fn new() -> Self {
        Self {
            category: String::new(),
            search: String::new(),
            page_index: 0,
            cursor_stack: Vec::new(),
            has_next: true,
        }
    }
}

/// Pagination controller for one browsing session.
pub struct PageController {
    store: Arc<dyn CatalogStore>,
    prefetch: Option<Arc<PrefetchScheduler>>,
    config: PagerConfig,
    state: Mutex<PagerState>,
    loading: AtomicBool,
    feed: Arc<RecordFeed>,
}

impl std::fmt::Debug for PageController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageController")
            .field("config", &self.config)
            .field("loading", &self.loading.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// RAII flag marking a load in flight; cleared on drop so every exit path
/// (success, error, panic unwind) releases the controller.
struct LoadGuard<'a> {
    loading: &'a AtomicBool,
}

impl<'a> LoadGuard<'a> {
    fn try_acquire(loading: &'a AtomicBool) -> Option<Self> {
        loading
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { loading })
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.loading.store(false, Ordering::SeqCst);
    }
}

impl PageController {
    /// Creates a controller over the given store, with optional thumbnail
    /// prefetching.
    #[must_use]
    pub fn new(
        store: Arc<dyn CatalogStore>,
        prefetch: Option<Arc<PrefetchScheduler>>,
        config: PagerConfig,
    ) -> Self {
        Self {
            store,
            prefetch,
            config,
            state: Mutex::new(PagerState::new()),
            loading: AtomicBool::new(false),
            feed: Arc::new(RecordFeed::new()),
        }
    }

    /// Returns the current record-list snapshot.
    #[must_use]
    pub fn records(&self) -> Arc<Vec<CatalogRecord>> {
        self.feed.snapshot()
    }

    /// Subscribes to record-list replacements and incremental thumbnail
    /// fills.
    #[must_use]
    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<Arc<Vec<CatalogRecord>>> {
        self.feed.subscribe()
    }

    /// Returns a snapshot of the pagination state.
    #[must_use]
    pub fn pagination(&self) -> PaginationSnapshot {
        let state = self.lock_state();
        PaginationSnapshot {
            category: state.category.clone(),
            search: state.search.clone(),
            page_index: state.page_index,
            cursor_depth: state.cursor_stack.len(),
            has_next: state.has_next,
        }
    }

    /// Loads one catalog page.
    ///
    /// Changing `category` or `search` resets the session to page 0 with an
    /// empty cursor stack before applying `page`; otherwise `page` becomes
    /// the current index. On success the record list is replaced and the
    /// prefetch scheduler is triggered on it.
    ///
    /// # Errors
    ///
    /// [`LoadError::Busy`] if a load is already in flight (the call is
    /// rejected, not queued); [`LoadError::Timeout`] or
    /// [`LoadError::Store`] on query failure, with prior state and record
    /// list untouched.
    #[instrument(level = "debug", skip(self))]
    pub async fn load_page(
        &self,
        category: &str,
        search: &str,
        page: usize,
    ) -> Result<Arc<Vec<CatalogRecord>>, LoadError> {
        let Some(_guard) = LoadGuard::try_acquire(&self.loading) else {
            return Err(LoadError::Busy);
        };
        self.load_page_inner(category, search, page).await
    }

    /// Advances to the next page.
    ///
    /// Returns `Ok(false)` without loading when there is no next page or a
    /// load is already in flight.
    ///
    /// # Errors
    ///
    /// Propagates the underlying [`load_page`](Self::load_page) failure.
    pub async fn next_page(&self) -> Result<bool, LoadError> {
        let Some(_guard) = LoadGuard::try_acquire(&self.loading) else {
            return Ok(false);
        };
        let (category, search, target) = {
            let state = self.lock_state();
            if !state.has_next {
                return Ok(false);
            }
            (
                state.category.clone(),
                state.search.clone(),
                state.page_index + 1,
            )
        };
        self.load_page_inner(&category, &search, target).await?;
        Ok(true)
    }

    /// Steps back to the previous page.
    ///
    /// Returns `Ok(false)` without loading when already on page 0 or a load
    /// is already in flight.
    ///
    /// # Errors
    ///
    /// Propagates the underlying [`load_page`](Self::load_page) failure.
    pub async fn prev_page(&self) -> Result<bool, LoadError> {
        let Some(_guard) = LoadGuard::try_acquire(&self.loading) else {
            return Ok(false);
        };
        let (category, search, target) = {
            let state = self.lock_state();
            if state.page_index == 0 {
                return Ok(false);
            }
            (
                state.category.clone(),
                state.search.clone(),
                state.page_index - 1,
            )
        };
        self.load_page_inner(&category, &search, target).await?;
        Ok(true)
    }

    /// Runs one load with the in-flight guard already held.
    async fn load_page_inner(
        &self,
        category: &str,
        search: &str,
        page: usize,
    ) -> Result<Arc<Vec<CatalogRecord>>, LoadError> {
        // Plan the query from current state without mutating anything;
        // commits happen only after the query succeeds.
        let (filter_changed, target_page, after) = {
            let state = self.lock_state();
            let filter_changed = state.category != category || state.search != search;
            let target_page = if filter_changed { 0 } else { page };
            let after = if target_page > 0 {
                state.cursor_stack.get(target_page - 1).cloned()
            } else {
                None
            };
            (filter_changed, target_page, after)
        };

        let query = PageQuery {
            category: category.to_string(),
            title_range: build_title_range(search),
            after,
            limit: self.config.page_size,
        };

        debug!(target_page, filter_changed, "querying catalog page");
        let result = match timeout(self.config.load_timeout, self.store.query_page(&query)).await {
            Ok(Ok(result)) => result,
            Ok(Err(error)) => {
                warn!(error = %error, "catalog page query failed");
                return Err(LoadError::Store(error));
            }
            Err(_) => {
                warn!(timeout = ?self.config.load_timeout, "catalog page query timed out");
                return Err(LoadError::Timeout {
                    timeout: self.config.load_timeout,
                });
            }
        };

        let has_next = result.records.len() >= self.config.page_size;
        {
            let mut state = self.lock_state();
            if filter_changed {
                state.cursor_stack.clear();
            }
            state.category = category.to_string();
            state.search = search.to_string();
            state.page_index = target_page;
            state.has_next = has_next;
            // First forward visit of this index records its resume cursor.
            if state.cursor_stack.len() == target_page
                && !result.records.is_empty()
                && let Some(cursor) = result.final_cursor.clone()
            {
                state.cursor_stack.push(cursor);
            }
        }

        let count = result.records.len();
        let generation = self.feed.publish(result.records);
        let snapshot = self.feed.snapshot();
        info!(
            page = target_page + 1,
            count, has_next, "catalog page loaded"
        );

        if self.config.prefetch_enabled && let Some(prefetch) = &self.prefetch {
            prefetch.schedule(Arc::clone(&snapshot), generation, Arc::clone(&self.feed));
        }
        if self.config.warm_next_page && has_next {
            self.spawn_next_page_warmup(category, search, target_page);
        }

        Ok(snapshot)
    }

    /// Speculatively runs the next page's query so the store can warm its
    /// own caches. Fire-and-forget; failures are logged and ignored.
    fn spawn_next_page_warmup(&self, category: &str, search: &str, current_page: usize) {
        let after = {
            let state = self.lock_state();
            state.cursor_stack.get(current_page).cloned()
        };
        let query = PageQuery {
            category: category.to_string(),
            title_range: build_title_range(search),
            after,
            limit: self.config.page_size,
        };
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(error) = store.query_page(&query).await {
                warn!(error = %error, "next-page warm-up query failed");
            }
        });
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, PagerState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Builds the title prefix range for a non-blank search term.
fn build_title_range(search: &str) -> Option<(String, String)> {
    if search.trim().is_empty() {
        None
    } else {
        Some(title_prefix_range(search))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    use crate::store::PageResult;

    /// Minimal in-memory store: title-ascending order, cursor = last title.
    struct MemStore {
        records: Vec<CatalogRecord>,
        queries: AtomicUsize,
    }

    impl MemStore {
        fn with_titles(category: &str, titles: &[&str]) -> Self {
            let mut records: Vec<CatalogRecord> = titles
                .iter()
                .map(|title| {
                    CatalogRecord::new(*title, format!("https://host/{title}"), category)
                })
                .collect();
            records.sort_by(|a, b| a.title.cmp(&b.title));
            Self {
                records,
                queries: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CatalogStore for MemStore {
        async fn query_page(&self, query: &PageQuery) -> Result<PageResult, StoreError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            let after_title = query.after.as_ref().map(|c| c.token().to_string());
            let records: Vec<CatalogRecord> = self
                .records
                .iter()
                .filter(|r| r.category == query.category)
                .filter(|r| {
                    query
                        .title_range
                        .as_ref()
                        .is_none_or(|(start, end)| r.title >= *start && r.title < *end)
                })
                .filter(|r| {
                    after_title
                        .as_ref()
                        .is_none_or(|after| r.title > *after)
                })
                .take(query.limit)
                .cloned()
                .collect();
            let final_cursor = records.last().map(|r| Cursor::from_token(r.title.clone()));
            Ok(PageResult {
                records,
                final_cursor,
            })
        }

        async fn update_image_url(&self, _: &str, _: &str) -> Result<(), StoreError> {
            Ok(())
        }
    }

    /// Store whose queries always fail.
    struct FailingStore;

    #[async_trait]
    impl CatalogStore for FailingStore {
        async fn query_page(&self, _: &PageQuery) -> Result<PageResult, StoreError> {
            Err(StoreError::unavailable("connection refused"))
        }

        async fn update_image_url(&self, _: &str, _: &str) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn config() -> PagerConfig {
        PagerConfig {
            page_size: 3,
            // Warm-up queries would skew query counting in tests.
            warm_next_page: false,
            ..PagerConfig::default()
        }
    }

    fn titles(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("title-{i:02}")).collect()
    }

    fn controller_over(titles: &[String]) -> PageController {
        let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
        let store = Arc::new(MemStore::with_titles("Classics", &refs));
        PageController::new(store, None, config())
    }

    #[tokio::test]
    async fn test_first_page_and_has_next() {
        let all = titles(7);
        let pager = controller_over(&all);
        let records = pager.load_page("Classics", "", 0).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].title, "title-00");
        let snapshot = pager.pagination();
        assert!(snapshot.has_next);
        assert_eq!(snapshot.page_index, 0);
        assert_eq!(snapshot.display_page(), 1);
        assert_eq!(snapshot.cursor_depth, 1);
    }

    #[tokio::test]
    async fn test_next_prev_walk() {
        let all = titles(7);
        let pager = controller_over(&all);
        pager.load_page("Classics", "", 0).await.unwrap();

        assert!(pager.next_page().await.unwrap());
        assert_eq!(pager.records()[0].title, "title-03");
        assert!(pager.next_page().await.unwrap());
        // Final partial page: one record, no further pages.
        assert_eq!(pager.records().len(), 1);
        assert!(!pager.pagination().has_next);
        assert!(!pager.next_page().await.unwrap());

        assert!(pager.prev_page().await.unwrap());
        assert_eq!(pager.records()[0].title, "title-03");
        assert!(pager.prev_page().await.unwrap());
        assert_eq!(pager.records()[0].title, "title-00");
        assert!(!pager.prev_page().await.unwrap());
    }

    #[tokio::test]
    async fn test_page_index_never_exceeds_cursor_depth() {
        let all = titles(20);
        let pager = controller_over(&all);
        pager.load_page("Classics", "", 0).await.unwrap();
        for _ in 0..5 {
            pager.next_page().await.unwrap();
            let snapshot = pager.pagination();
            assert!(snapshot.cursor_depth >= snapshot.page_index);
        }
        for _ in 0..10 {
            pager.prev_page().await.unwrap();
            let snapshot = pager.pagination();
            assert!(snapshot.cursor_depth >= snapshot.page_index);
        }
        assert_eq!(pager.pagination().page_index, 0);
    }

    #[tokio::test]
    async fn test_filter_change_resets_session() {
        let all = titles(9);
        let pager = controller_over(&all);
        pager.load_page("Classics", "", 0).await.unwrap();
        pager.next_page().await.unwrap();
        assert_eq!(pager.pagination().page_index, 1);

        // New search term: back to page 0, cursor stack rebuilt.
        pager.load_page("Classics", "title-0", 5).await.unwrap();
        let snapshot = pager.pagination();
        assert_eq!(snapshot.page_index, 0);
        assert_eq!(snapshot.search, "title-0");
        assert_eq!(snapshot.cursor_depth, 1);
    }

    #[tokio::test]
    async fn test_search_restricts_to_prefix() {
        let store = Arc::new(MemStore::with_titles(
            "Classics",
            &["Dune", "Dungeon", "Duo", "Emma"],
        ));
        let pager = PageController::new(store, None, config());
        let records = pager.load_page("Classics", "Dun", 0).await.unwrap();
        let got: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(got, ["Dune", "Dungeon"]);
    }

    #[tokio::test]
    async fn test_failure_preserves_state() {
        let all = titles(7);
        let pager = controller_over(&all);
        pager.load_page("Classics", "", 0).await.unwrap();
        pager.next_page().await.unwrap();
        let before = pager.pagination();
        let records_before = pager.records();

        let failing = PageController::new(Arc::new(FailingStore), None, config());
        let error = failing.load_page("Classics", "", 0).await.unwrap_err();
        assert!(matches!(error, LoadError::Store(_)));
        assert_eq!(failing.pagination().page_index, 0);
        assert!(failing.records().is_empty());

        // The healthy controller is unaffected.
        assert_eq!(pager.pagination(), before);
        assert_eq!(*pager.records(), *records_before);
    }

    #[tokio::test]
    async fn test_empty_category_has_no_next() {
        let pager = controller_over(&titles(5));
        let records = pager.load_page("Unknown", "", 0).await.unwrap();
        assert!(records.is_empty());
        assert!(!pager.pagination().has_next);
        assert_eq!(pager.pagination().cursor_depth, 0);
    }

    #[tokio::test]
    async fn test_revisit_does_not_duplicate_cursor() {
        let pager = controller_over(&titles(9));
        pager.load_page("Classics", "", 0).await.unwrap();
        pager.next_page().await.unwrap();
        pager.prev_page().await.unwrap();
        pager.next_page().await.unwrap();
        assert_eq!(pager.pagination().cursor_depth, 2);
    }

    #[tokio::test]
    async fn test_two_controllers_are_independent() {
        let all = titles(9);
        let first = controller_over(&all);
        let second = controller_over(&all);
        first.load_page("Classics", "", 0).await.unwrap();
        first.next_page().await.unwrap();
        second.load_page("Classics", "", 0).await.unwrap();
        assert_eq!(first.pagination().page_index, 1);
        assert_eq!(second.pagination().page_index, 0);
    }
}
