//! Crawl target definitions
//!
//! A target is one URL the crawler still has to fetch, together with what the
//! page is expected to contain.

use crate::state::RetryState;
use chrono::{DateTime, Utc};
use std::fmt;

/// What kind of page a target points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// A page of search results; yields product links and maybe a next page
    Listing {
        /// 1-based position in the pagination sequence
        page: u32,
    },

    /// A single product page; yields one product record
    Detail,
}

impl TargetKind {
    /// Returns true for listing pages
    pub fn is_listing(&self) -> bool {
        matches!(self, Self::Listing { .. })
    }

    /// Returns true for product detail pages
    pub fn is_detail(&self) -> bool {
        matches!(self, Self::Detail)
    }

    /// Short label used in log lines
    pub fn label(&self) -> &'static str {
        match self {
            Self::Listing { .. } => "listing",
            Self::Detail => "detail",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Listing { page } => write!(f, "listing page {}", page),
            Self::Detail => write!(f, "detail page"),
        }
    }
}

/// A URL waiting in (or taken from) the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    /// The URL to request, exactly as resolved
    pub url: String,

    /// Listing or detail page
    pub kind: TargetKind,

    /// Retry bookkeeping, owned by this target until it finishes
    pub retry: RetryState,

    /// When the target was first discovered
    pub discovered_at: DateTime<Utc>,
}

impl CrawlTarget {
    /// Creates a fresh target with no attempts recorded
    pub fn new(url: impl Into<String>, kind: TargetKind) -> Self {
        Self {
            url: url.into(),
            kind,
            retry: RetryState::new(),
            discovered_at: Utc::now(),
        }
    }

    /// Creates a listing target for the given page number
    pub fn listing(url: impl Into<String>, page: u32) -> Self {
        Self::new(url, TargetKind::Listing { page })
    }

    /// Creates a product detail target
    pub fn detail(url: impl Into<String>) -> Self {
        Self::new(url, TargetKind::Detail)
    }

    /// Number of retries already issued for this target
    pub fn attempt(&self) -> u32 {
        self.retry.attempt()
    }
}
