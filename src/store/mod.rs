//! Catalog store contract consumed by the pagination controller.
//!
//! The remote store's query engine is an external collaborator: this module
//! defines only the paged query interface, the opaque resume cursor it
//! produces, and the error taxonomy surfaced to callers. Implementations
//! adapt a concrete backend (remote document store, in-memory double) to
//! this trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::CatalogRecord;

/// High sentinel code point closing the title prefix range for search.
///
/// `[term, term + U+F8FF)` approximates "title starts with term" in a store
/// that only supports ordered range queries.
pub const TITLE_RANGE_SENTINEL: char = '\u{f8ff}';

/// Opaque resume token marking the last record of a fetched page.
///
/// Produced only by a [`CatalogStore`] from the final record of a page;
/// the pagination controller records and replays it but never constructs
/// one itself. Serializes transparently as its token string so store
/// adapters can round-trip it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Creates a cursor from a store-defined token. Store-adapter API.
    #[must_use]
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the store-defined token. Store-adapter API.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.0
    }
}

/// One bounded-range catalog query.
#[derive(Debug, Clone)]
pub struct PageQuery {
    /// Category filter (exact match).
    pub category: String,
    /// Optional half-open title range `[start, end)` for prefix search.
    pub title_range: Option<(String, String)>,
    /// Resume after this cursor, if resuming mid-collection.
    pub after: Option<Cursor>,
    /// Maximum records to return.
    pub limit: usize,
}

/// Result of one page query.
#[derive(Debug, Clone)]
pub struct PageResult {
    /// Matching records in title-ascending order.
    pub records: Vec<CatalogRecord>,
    /// Cursor derived from the final returned record; `None` for an empty
    /// page.
    pub final_cursor: Option<Cursor>,
}

/// Errors surfaced by catalog store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached (network, DNS, connection refused).
    #[error("catalog store unavailable: {reason}")]
    Unavailable {
        /// Human-readable description of the fault.
        reason: String,
    },

    /// The store rejected or failed the query itself.
    #[error("catalog query failed: {reason}")]
    Query {
        /// Human-readable description of the fault.
        reason: String,
    },

    /// Backend-specific failure with a source error attached.
    #[error("catalog backend error: {source}")]
    Backend {
        /// The underlying backend error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StoreError {
    /// Creates an unavailability error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Creates a query-failure error.
    pub fn query(reason: impl Into<String>) -> Self {
        Self::Query {
            reason: reason.into(),
        }
    }

    /// Wraps a backend error.
    pub fn backend(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend {
            source: Box::new(source),
        }
    }
}

/// Black-box paged query API of the remote catalog store.
///
/// Ordering contract: results are ordered by title ascending; ties among
/// equal titles are broken however the store chooses (store responsibility,
/// not controlled here). The returned cursor must resume the same ordering.
///
/// # Object Safety
///
/// Uses `async_trait` so controllers can hold `Arc<dyn CatalogStore>`;
/// Rust 2024 native async traits are not object-safe.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Runs one bounded-range query and returns the page plus its resume
    /// cursor.
    async fn query_page(&self, query: &PageQuery) -> Result<PageResult, StoreError>;

    /// Best-effort write-back of a resolved thumbnail URL onto the record
    /// identified by `source_link`. Callers treat this as fire-and-forget.
    async fn update_image_url(&self, source_link: &str, image_url: &str)
    -> Result<(), StoreError>;
}

/// Builds the half-open title range `[term, term + U+F8FF)` approximating
/// "title starts with `term`".
#[must_use]
pub fn title_prefix_range(term: &str) -> (String, String) {
    let mut end = String::with_capacity(term.len() + TITLE_RANGE_SENTINEL.len_utf8());
    end.push_str(term);
    end.push(TITLE_RANGE_SENTINEL);
    (term.to_string(), end)
}
