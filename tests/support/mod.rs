//! Shared test doubles for integration tests.
#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Notify;

use catalog_core::model::CatalogRecord;
use catalog_core::store::{CatalogStore, Cursor, PageQuery, PageResult, StoreError};

/// In-memory catalog store: title-ascending order, cursor = final title.
/// Counts queries and records write-backs so tests can observe both.
pub struct MemStore {
    records: Mutex<Vec<CatalogRecord>>,
    queries: AtomicUsize,
    failing: AtomicBool,
}

impl MemStore {
    pub fn new(records: Vec<CatalogRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            queries: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    /// Builds `count` records titled `title-00..` in the given category.
    pub fn with_numbered(category: &str, count: usize) -> Self {
        let records = (0..count)
            .map(|i| {
                CatalogRecord::new(
                    format!("title-{i:02}"),
                    format!("https://host.example/{category}/{i:02}"),
                    category,
                )
            })
            .collect();
        Self::new(records)
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Makes every subsequent query fail with `StoreError::Unavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Returns the stored image URL for a record, if any was written back.
    pub fn image_url_of(&self, source_link: &str) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|record| record.source_link == source_link)
            .map(|record| record.image_url.clone())
            .filter(|url| !url.is_empty())
    }
}

#[async_trait]
impl CatalogStore for MemStore {
    async fn query_page(&self, query: &PageQuery) -> Result<PageResult, StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("store marked failing"));
        }
        let mut matching: Vec<CatalogRecord> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|record| record.category == query.category)
            .filter(|record| {
                query
                    .title_range
                    .as_ref()
                    .is_none_or(|(start, end)| record.title >= *start && record.title < *end)
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.title.cmp(&b.title));
        let after_title = query.after.as_ref().map(|cursor| cursor.token().to_string());
        let records: Vec<CatalogRecord> = matching
            .into_iter()
            .filter(|record| {
                after_title
                    .as_ref()
                    .is_none_or(|after| record.title > *after)
            })
            .take(query.limit)
            .collect();
        let final_cursor = records
            .last()
            .map(|record| Cursor::from_token(record.title.clone()));
        Ok(PageResult {
            records,
            final_cursor,
        })
    }

    async fn update_image_url(
        &self,
        source_link: &str,
        image_url: &str,
    ) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        if let Some(record) = records
            .iter_mut()
            .find(|record| record.source_link == source_link)
        {
            record.image_url = image_url.to_string();
        }
        Ok(())
    }
}

/// Store whose query blocks until released; used to hold a load in flight.
pub struct BlockingStore {
    entered: Notify,
    release: Notify,
}

impl BlockingStore {
    pub fn new() -> Self {
        Self {
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    /// Waits until a query has started.
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    /// Lets the blocked query complete.
    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl CatalogStore for BlockingStore {
    async fn query_page(&self, _query: &PageQuery) -> Result<PageResult, StoreError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(PageResult {
            records: Vec::new(),
            final_cursor: None,
        })
    }

    async fn update_image_url(&self, _: &str, _: &str) -> Result<(), StoreError> {
        Ok(())
    }
}
