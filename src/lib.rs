//! Catalog Browsing Core Library
//!
//! This library implements the engine behind a catalog browser for a
//! remotely-stored, paginated collection whose items need an expensive,
//! unreliable network-and-parse step to resolve a representative thumbnail.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`store`] - Catalog store contract (paged queries, opaque cursors)
//! - [`pager`] - Cursor-based pagination controller and record feed
//! - [`cache`] - Bounded LRU cache of resolved thumbnail URLs
//! - [`resolver`] - Mirror-fallback thumbnail resolution with single-flight
//! - [`prefetch`] - Bounded two-wave thumbnail prefetching
//! - [`reader`] - Progressive per-item content loading
//! - [`config`] - Tunables for all of the above
//!
//! The presentation layer owns rendering, navigation, and preferences; the
//! catalog store's own query engine is consumed through [`store::CatalogStore`]
//! as a black box.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use catalog_core::{
//!     CacheConfig, ImageCache, MirrorHosts, PageController, PagerConfig,
//!     PrefetchConfig, PrefetchScheduler, ResolverConfig, ThumbnailResolver,
//! };
//! # use catalog_core::store::CatalogStore;
//!
//! # async fn example(store: Arc<dyn CatalogStore>) -> Result<(), Box<dyn std::error::Error>> {
//! let cache = Arc::new(ImageCache::new(&CacheConfig::default()));
//! let hosts = MirrorHosts::new(
//!     "https://telegra.ph",
//!     vec!["https://graph.org".into(), "https://te.legra.ph".into()],
//! );
//! let resolver = Arc::new(ThumbnailResolver::new(
//!     ResolverConfig::new(hosts),
//!     cache,
//!     Some(Arc::clone(&store)),
//! )?);
//! let prefetch = Arc::new(PrefetchScheduler::new(resolver, &PrefetchConfig::default()));
//! let pager = PageController::new(store, Some(prefetch), PagerConfig::default());
//!
//! let records = pager.load_page("Classics", "", 0).await?;
//! println!("page 1: {} records", records.len());
//! # Ok(())
//! # }
//! ```

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod config;
pub mod model;
pub mod pager;
pub mod prefetch;
pub mod reader;
pub mod resolver;
pub mod store;

mod user_agent;

// Re-export commonly used types
pub use cache::ImageCache;
pub use config::{CacheConfig, MirrorHosts, PagerConfig, PrefetchConfig, ResolverConfig};
pub use model::CatalogRecord;
pub use pager::{LoadError, PageController, PaginationSnapshot, RecordFeed};
pub use prefetch::PrefetchScheduler;
pub use reader::{ContentLoader, ItemContent, MediaSequence};
pub use resolver::ThumbnailResolver;
pub use store::{CatalogStore, Cursor, PageQuery, PageResult, StoreError, title_prefix_range};
