//! Shared data types for catalog browsing.

use serde::{Deserialize, Serialize};

/// One item of the remote catalog as seen by the browsing layer.
///
/// `source_link` is the identity key used everywhere: cache key, resolver
/// key, write-back key. Records are immutable once fetched except for
/// `image_url`, which starts empty and is filled in post-hoc by the
/// thumbnail resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    /// Display title; the store's sole declared sort key (ascending).
    pub title: String,
    /// Unique link to the item's detail page.
    pub source_link: String,
    /// Category the record was filed under.
    pub category: String,
    /// Resolved thumbnail URL; empty until resolution succeeds.
    #[serde(default)]
    pub image_url: String,
}

impl CatalogRecord {
    /// Creates a record with no resolved thumbnail yet.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        source_link: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            source_link: source_link.into(),
            category: category.into(),
            image_url: String::new(),
        }
    }

    /// Returns true if the record still lacks a resolved thumbnail.
    #[must_use]
    pub fn needs_image(&self) -> bool {
        self.image_url.is_empty()
    }
}
