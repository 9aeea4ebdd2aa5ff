//! Thumbnail resolution through an ordered list of mirror hosts.
//!
//! Resolving a thumbnail means fetching the item's remote page, scraping the
//! first raster image out of it, and remembering the result. This is
//! expensive and unreliable, so the resolver layers three defenses:
//!
//! - a bounded LRU [`ImageCache`] consulted before any network activity,
//! - single-flight dedupe so concurrent requests for the same link share one
//!   fetch sequence,
//! - mirror-host fallback: the link's host is rewritten to each configured
//!   candidate in declared order, first success wins.
//!
//! A resolution that fails on every candidate is a normal outcome, returned
//! as `None` and never cached, so a later call may retry.

pub(crate) mod scrape;

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use reqwest::Client;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

use crate::cache::ImageCache;
use crate::config::ResolverConfig;
use crate::store::CatalogStore;
use crate::user_agent::DESKTOP_USER_AGENT;

/// Error constructing a [`ThumbnailResolver`].
#[derive(Debug, Error)]
pub enum ResolverBuildError {
    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client construction failed: {source}")]
    ClientBuild {
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
}

/// Resolves source links to thumbnail image URLs.
///
/// Cheap to share: wrap in an `Arc` and clone the handle. All interior state
/// (cache, in-flight map) is concurrency-safe.
pub struct ThumbnailResolver {
    client: Client,
    cache: Arc<ImageCache>,
    /// One shared cell per link currently being resolved. Callers joining
    /// mid-flight await the same cell; the entry is removed once the
    /// resolution completes.
    inflight: DashMap<String, Arc<OnceCell<Option<String>>>>,
    config: ResolverConfig,
    /// Write-back target for resolved URLs, if the caller wants catalog
    /// records updated. Fire-and-forget; failures are logged and swallowed.
    store: Option<Arc<dyn CatalogStore>>,
}

impl std::fmt::Debug for ThumbnailResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThumbnailResolver")
            .field("config", &self.config)
            .field("inflight", &self.inflight.len())
            .finish_non_exhaustive()
    }
}

impl ThumbnailResolver {
    /// Creates a resolver over the given cache and optional write-back store.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverBuildError::ClientBuild`] if the HTTP client cannot
    /// be constructed.
    pub fn new(
        config: ResolverConfig,
        cache: Arc<ImageCache>,
        store: Option<Arc<dyn CatalogStore>>,
    ) -> Result<Self, ResolverBuildError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .user_agent(DESKTOP_USER_AGENT)
            .gzip(true)
            .build()
            .map_err(|source| ResolverBuildError::ClientBuild { source })?;
        Ok(Self {
            client,
            cache,
            inflight: DashMap::new(),
            config,
            store,
        })
    }

    /// Returns the cache this resolver consults and populates.
    #[must_use]
    pub fn cache(&self) -> &Arc<ImageCache> {
        &self.cache
    }

    /// Resolves `source_link` to a thumbnail URL, or `None` if no candidate
    /// host yields a matching image.
    ///
    /// Cache hits return immediately with no network activity. Concurrent
    /// calls for the same link collapse into one fetch sequence; every
    /// caller observes the identical outcome. A `None` outcome is not
    /// cached, so the next call retries from scratch.
    #[instrument(level = "debug", skip(self))]
    pub async fn resolve(&self, source_link: &str) -> Option<String> {
        if let Some(cached) = self.cache.get(source_link) {
            debug!("thumbnail served from cache");
            return Some(cached);
        }

        let cell = self
            .inflight
            .entry(source_link.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();
        let outcome = cell
            .get_or_init(|| self.resolve_uncached(source_link))
            .await
            .clone();
        // Remove only after completion, and only our own cell: a miss must
        // not pin a stale None that would block future retries.
        self.inflight
            .remove_if(source_link, |_, current| Arc::ptr_eq(current, &cell));
        outcome
    }

    /// Runs the mirror fallback sequence for a link with no cached value.
    async fn resolve_uncached(&self, source_link: &str) -> Option<String> {
        let mut attempted = HashSet::new();
        for candidate in self.config.hosts.candidates() {
            let target = rewrite_host(source_link, &self.config.hosts.primary, candidate);
            if !attempted.insert(target.clone()) {
                // Link not under the primary host: every rewrite is the
                // same URL, one attempt is enough.
                continue;
            }
            match self.fetch_first_image(&target).await {
                Ok(Some(image_url)) => {
                    self.cache.put(source_link, &image_url);
                    self.spawn_write_back(source_link, &image_url);
                    info!(host = candidate, image = %image_url, "thumbnail resolved");
                    return Some(image_url);
                }
                Ok(None) => {
                    debug!(host = candidate, "page fetched but no matching image");
                }
                Err(error) => {
                    warn!(host = candidate, error = %error, "thumbnail fetch failed");
                }
            }
        }
        debug!("no candidate host yielded a thumbnail");
        None
    }

    /// Fetches one candidate page and scrapes the first raster image.
    async fn fetch_first_image(&self, target: &str) -> Result<Option<String>, reqwest::Error> {
        let response = self.client.get(target).send().await?.error_for_status()?;
        // Absolutize against the final URL so redirects keep images correct.
        let base_url = response.url().clone();
        let html = response.text().await?;
        Ok(scrape::first_raster_image(
            &html,
            &base_url,
            &self.config.image_extensions,
        ))
    }

    /// Best-effort propagation of a resolved URL back to the catalog store.
    fn spawn_write_back(&self, source_link: &str, image_url: &str) {
        let Some(store) = self.store.clone() else {
            return;
        };
        let link = source_link.to_string();
        let url = image_url.to_string();
        tokio::spawn(async move {
            if let Err(error) = store.update_image_url(&link, &url).await {
                warn!(link = %link, error = %error, "thumbnail write-back failed");
            }
        });
    }
}

/// Rewrites `link`'s host to `candidate` by substituting the primary base
/// URL. Returns the link unchanged when the candidate is the primary or the
/// link is not under the primary.
fn rewrite_host(link: &str, primary: &str, candidate: &str) -> String {
    if candidate == primary {
        return link.to_string();
    }
    link.replacen(primary, candidate, 1)
}
