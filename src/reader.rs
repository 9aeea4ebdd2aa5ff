//! Progressive content loading for a single selected item.
//!
//! Opening an item fetches its detail page exactly once, extracts the
//! ordered list of embedded image URLs, and hands the caller the first few
//! immediately plus the remainder as a lazy, single-pass sequence to drain
//! for progressive rendering. A failed fetch or a page with no images is
//! "no content", not a hard error; a fresh [`ContentLoader::open_item`]
//! call starts over from scratch.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::resolver::scrape;
use crate::user_agent::DESKTOP_USER_AGENT;

/// Connect timeout for the single detail-page fetch.
const DETAIL_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Read timeout for the single detail-page fetch. Detail pages run larger
/// than thumbnail pages, so this sits at the top of the 5-8s range.
const DETAIL_READ_TIMEOUT: Duration = Duration::from_secs(8);

/// Error constructing a [`ContentLoader`].
#[derive(Debug, thiserror::Error)]
pub enum ContentLoaderBuildError {
    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client construction failed: {source}")]
    ClientBuild {
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
}

/// Outcome of opening one item.
#[derive(Debug)]
pub enum ItemContent {
    /// The detail page yielded at least one image.
    Ready {
        /// The first `initial_count` image URLs, in document order.
        first_batch: Vec<String>,
        /// The remaining image URLs as a lazy, order-preserving,
        /// single-pass sequence.
        remainder: MediaSequence,
    },
    /// The fetch failed or the page contained no usable images.
    Empty,
}

impl ItemContent {
    /// Returns true for the no-content outcome.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Lazy remainder of an item's media list.
///
/// Order-preserving and non-restartable: each URL is yielded exactly once,
/// in document order, until exhaustion.
#[derive(Debug)]
pub struct MediaSequence {
    inner: std::vec::IntoIter<String>,
}

impl MediaSequence {
    fn new(urls: Vec<String>) -> Self {
        Self {
            inner: urls.into_iter(),
        }
    }

    /// Number of URLs not yet drained.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.inner.len()
    }
}

impl Iterator for MediaSequence {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Loads a single item's full media list progressively.
#[derive(Debug, Clone)]
pub struct ContentLoader {
    client: Client,
}

impl ContentLoader {
    /// Creates a loader with the standard detail-page fetch policy.
    ///
    /// # Errors
    ///
    /// Returns [`ContentLoaderBuildError::ClientBuild`] if the HTTP client
    /// cannot be constructed.
    pub fn new() -> Result<Self, ContentLoaderBuildError> {
        let client = Client::builder()
            .connect_timeout(DETAIL_CONNECT_TIMEOUT)
            .timeout(DETAIL_READ_TIMEOUT)
            .user_agent(DESKTOP_USER_AGENT)
            .gzip(true)
            .build()
            .map_err(|source| ContentLoaderBuildError::ClientBuild { source })?;
        Ok(Self { client })
    }

    /// Fetches `source_link`'s detail page once and splits its image URLs
    /// into the first `initial_count` plus a drainable remainder.
    ///
    /// Duplicates and blanks are filtered; document order is preserved.
    /// Fetch failure or zero images yields [`ItemContent::Empty`].
    #[instrument(level = "debug", skip(self))]
    pub async fn open_item(&self, source_link: &str, initial_count: usize) -> ItemContent {
        let (html, base_url) = match self.fetch_detail_page(source_link).await {
            Ok(page) => page,
            Err(error) => {
                warn!(error = %error, "detail page fetch failed");
                return ItemContent::Empty;
            }
        };

        let mut urls = scrape::all_images(&html, &base_url);
        if urls.is_empty() {
            debug!("detail page contained no images");
            return ItemContent::Empty;
        }

        let split = initial_count.min(urls.len());
        let rest = urls.split_off(split);
        debug!(first = urls.len(), rest = rest.len(), "item content ready");
        ItemContent::Ready {
            first_batch: urls,
            remainder: MediaSequence::new(rest),
        }
    }

    async fn fetch_detail_page(
        &self,
        source_link: &str,
    ) -> Result<(String, url::Url), reqwest::Error> {
        let response = self
            .client
            .get(source_link)
            .send()
            .await?
            .error_for_status()?;
        let base_url = response.url().clone();
        let html = response.text().await?;
        Ok((html, base_url))
    }
}
