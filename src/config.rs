//! Configuration for the browsing engine components.
//!
//! All tunables live here as plain structs with documented defaults. The
//! crate owns no config files, environment parsing, or CLI flags; the
//! embedding application constructs these and passes them down.

use std::time::Duration;

/// Default number of records per catalog page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Default overall timeout for a single catalog page query.
pub const DEFAULT_PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(8);

/// Default capacity of the thumbnail URL cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Default global cap on concurrent thumbnail resolutions.
pub const DEFAULT_RESOLVE_CONCURRENCY: usize = 8;

/// Default size of the speculative prefetch window (trailing records).
pub const DEFAULT_PREFETCH_WINDOW: usize = 5;

/// Default connect timeout for a single mirror-host attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Default read timeout for a single mirror-host attempt.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Pagination controller settings.
#[derive(Debug, Clone)]
pub struct PagerConfig {
    /// Records requested per page. Constant for the controller's lifetime.
    pub page_size: usize,
    /// Overall bound on one catalog page query.
    pub load_timeout: Duration,
    /// Whether thumbnails are resolved after each page load.
    pub prefetch_enabled: bool,
    /// Whether the next page's store query is warmed speculatively after a
    /// successful load that reports more records available.
    pub warm_next_page: bool,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            load_timeout: DEFAULT_PAGE_LOAD_TIMEOUT,
            prefetch_enabled: true,
            warm_next_page: true,
        }
    }
}

/// Prefetch scheduler settings.
#[derive(Debug, Clone)]
pub struct PrefetchConfig {
    /// Global cap on concurrent resolutions across all scheduled pages.
    pub concurrency: usize,
    /// Number of trailing records whose thumbnails are warmed speculatively
    /// after the visible page has resolved.
    pub window: usize,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_RESOLVE_CONCURRENCY,
            window: DEFAULT_PREFETCH_WINDOW,
        }
    }
}

/// Ordered host list for thumbnail-page fetches.
///
/// A source link is rewritten to each candidate host in turn: the primary
/// first, then every mirror in declared order. First success wins; hosts
/// after the first success are never attempted.
#[derive(Debug, Clone)]
pub struct MirrorHosts {
    /// Base URL of the primary host, e.g. `https://telegra.ph`.
    pub primary: String,
    /// Alternate base URLs substituted for the primary, tried in order.
    pub mirrors: Vec<String>,
}

impl MirrorHosts {
    /// Creates a host list from a primary base URL and ordered mirrors.
    #[must_use]
    pub fn new(primary: impl Into<String>, mirrors: Vec<String>) -> Self {
        Self {
            primary: primary.into(),
            mirrors,
        }
    }

    /// Yields candidate base URLs in attempt order (primary first).
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary.as_str()).chain(self.mirrors.iter().map(String::as_str))
    }
}

/// Image resolver settings.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Primary host plus ordered fallback mirrors.
    pub hosts: MirrorHosts,
    /// Lowercase path extensions accepted as "the" thumbnail. This is a
    /// lightweight heuristic for picking one representative raster image per
    /// page, kept configurable rather than hardened into the contract.
    pub image_extensions: Vec<String>,
    /// Connect timeout per host attempt.
    pub connect_timeout: Duration,
    /// Read timeout per host attempt.
    pub read_timeout: Duration,
}

impl ResolverConfig {
    /// Creates a resolver config for the given host list with default
    /// extensions and timeouts.
    #[must_use]
    pub fn new(hosts: MirrorHosts) -> Self {
        Self {
            hosts,
            image_extensions: default_image_extensions(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// Default raster extension heuristic: `jpg`, `jpeg`, `png`.
#[must_use]
pub fn default_image_extensions() -> Vec<String> {
    vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()]
}

/// Thumbnail cache settings.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of link -> image URL entries retained.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}
