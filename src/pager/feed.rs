//! Observable record-list snapshots with stale-result suppression.
//!
//! The UI-facing record list is published as whole `Arc` snapshots through a
//! watch channel: readers always observe a complete list, never a
//! half-updated record. Every published list carries a generation number;
//! thumbnail results scheduled against an older generation are discarded on
//! arrival instead of being applied to a newer page's list.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::debug;

use crate::model::CatalogRecord;

/// Shared, observable record list with generation tagging.
#[derive(Debug)]
pub struct RecordFeed {
    tx: watch::Sender<Arc<Vec<CatalogRecord>>>,
    generation: AtomicU64,
}

impl RecordFeed {
    /// Creates an empty feed at generation 0.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(Vec::new()));
        Self {
            tx,
            generation: AtomicU64::new(0),
        }
    }

    /// Replaces the record list atomically and returns the new generation.
    ///
    /// Results tagged with an older generation are rejected by
    /// [`apply_image`](Self::apply_image) from this point on.
    pub fn publish(&self, records: Vec<CatalogRecord>) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.tx.send_replace(Arc::new(records));
        generation
    }

    /// Returns the generation the feed is currently on.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Fills in the thumbnail for `source_link` if `generation` is still
    /// current. Returns false when the result was stale and discarded, or
    /// the link is no longer in the list.
    pub fn apply_image(&self, generation: u64, source_link: &str, image_url: &str) -> bool {
        let mut applied = false;
        self.tx.send_modify(|records| {
            // Checked inside the modify closure so a concurrent publish
            // cannot slip between the check and the write.
            if self.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            let list = Arc::make_mut(records);
            if let Some(record) = list
                .iter_mut()
                .find(|record| record.source_link == source_link)
            {
                record.image_url = image_url.to_string();
                applied = true;
            }
        });
        if !applied {
            debug!(link = %source_link, generation, "discarded stale thumbnail result");
        }
        applied
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<CatalogRecord>> {
        self.tx.borrow().clone()
    }

    /// Subscribes to list replacements and incremental thumbnail fills.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<CatalogRecord>>> {
        self.tx.subscribe()
    }
}

impl Default for RecordFeed {
    fn default() -> Self {
        Self::new()
    }
}
