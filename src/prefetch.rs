//! Two-wave thumbnail prefetching for freshly loaded pages.
//!
//! Wave 1 resolves a thumbnail for every record on the page that lacks one,
//! applying each result to the live record list as it arrives (partial
//! results are visible incrementally). Wave 2 then speculatively re-resolves
//! the trailing window of the page so the cache is warm when the user pages
//! forward; its failures are logged and otherwise ignored.
//!
//! A global semaphore caps concurrent resolutions across every page that
//! ever calls [`PrefetchScheduler::schedule`], bounding outbound connection
//! count. Results are tagged with the record-list generation active when
//! they were scheduled; results arriving after the user navigated away are
//! discarded by the feed, never applied to a newer list.

use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, instrument, warn};

use crate::config::PrefetchConfig;
use crate::model::CatalogRecord;
use crate::pager::RecordFeed;
use crate::resolver::ThumbnailResolver;

/// Orchestrates bounded, cancellable thumbnail resolution for page loads.
#[derive(Debug)]
pub struct PrefetchScheduler {
    resolver: Arc<ThumbnailResolver>,
    /// Global cap shared by every wave of every page.
    permits: Arc<Semaphore>,
    window: usize,
}

impl PrefetchScheduler {
    /// Creates a scheduler over the given resolver.
    #[must_use]
    pub fn new(resolver: Arc<ThumbnailResolver>, config: &PrefetchConfig) -> Self {
        Self {
            resolver,
            permits: Arc::new(Semaphore::new(config.concurrency.max(1))),
            window: config.window,
        }
    }

    /// Schedules both waves for a freshly published page and returns
    /// immediately. `generation` must be the feed generation the page was
    /// published under.
    pub fn schedule(
        &self,
        records: Arc<Vec<CatalogRecord>>,
        generation: u64,
        feed: Arc<RecordFeed>,
    ) {
        let resolver = Arc::clone(&self.resolver);
        let permits = Arc::clone(&self.permits);
        let window = self.window;
        tokio::spawn(async move {
            run_waves(resolver, permits, window, records, generation, feed).await;
        });
    }
}

/// Resolves the visible page, then warms the trailing window.
#[instrument(
    level = "debug",
    skip(resolver, permits, feed, records),
    fields(records = records.len())
)]
async fn run_waves(
    resolver: Arc<ThumbnailResolver>,
    permits: Arc<Semaphore>,
    window: usize,
    records: Arc<Vec<CatalogRecord>>,
    generation: u64,
    feed: Arc<RecordFeed>,
) {
    let pending: Vec<String> = records
        .iter()
        .filter(|record| record.needs_image())
        .map(|record| record.source_link.clone())
        .collect();

    let first_wave = pending.iter().map(|link| {
        let resolver = Arc::clone(&resolver);
        let permits = Arc::clone(&permits);
        let feed = Arc::clone(&feed);
        async move {
            let Ok(_permit) = permits.acquire().await else {
                // Semaphore closed: the scheduler is being torn down.
                return;
            };
            if feed.generation() != generation {
                debug!(link = %link, "page abandoned before resolution started");
                return;
            }
            match resolver.resolve(link).await {
                Some(image_url) => {
                    // apply_image re-checks the generation on arrival.
                    feed.apply_image(generation, link, &image_url);
                }
                None => debug!(link = %link, "thumbnail unresolved"),
            }
        }
    });
    join_all(first_wave).await;

    if feed.generation() != generation {
        debug!("skipping prefetch window for abandoned page");
        return;
    }

    // Second, lower-priority wave: warm the cache for the records the user
    // is most likely to reach next. Outcomes are not applied anywhere.
    let trailing: Vec<String> = records
        .iter()
        .rev()
        .take(window)
        .map(|record| record.source_link.clone())
        .collect();
    for link in trailing.into_iter().rev() {
        let Ok(_permit) = permits.acquire().await else {
            return;
        };
        if feed.generation() != generation {
            debug!("prefetch window cancelled mid-wave");
            return;
        }
        if resolver.resolve(&link).await.is_none() {
            warn!(link = %link, "prefetch window resolution failed");
        }
    }
}
