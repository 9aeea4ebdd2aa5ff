//! Shared User-Agent string for catalog scrape traffic.
//!
//! Single source for the UA so resolver and reader clients stay consistent.
//! Mirror hosts serve plain article pages intended for browsers, so the
//! default identifies as a standard desktop browser rather than a tool.

/// Default desktop User-Agent for detail-page and thumbnail-page fetches.
pub(crate) const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
