//! Page extraction
//!
//! The crawl engine depends only on the [`Extractor`] trait: given a page
//! body it returns product links (listing pages) or product fields (detail
//! pages). [`SelectorExtractor`] implements it with configurable CSS
//! selectors, so no knowledge of a particular site is built in.

mod selector;

pub use selector::SelectorExtractor;

/// What a listing page yielded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Product page links, as written in the page (possibly relative)
    pub detail_urls: Vec<String>,

    /// Whether the listing continues on another page
    pub has_next_page: bool,
}

/// Fields found on a product page; `None` means the field was not located
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFields {
    pub title: Option<String>,
    pub asin: Option<String>,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
}

/// Turns page bodies into structured data
///
/// Implementations must tolerate partial or garbled markup: a field that
/// cannot be found is reported as absent, never as an error.
pub trait Extractor: Send + Sync {
    /// Extracts product links and pagination state from a listing page
    fn extract_listing_page(&self, body: &str) -> ListingPage;

    /// Extracts product fields from a detail page
    fn extract_detail_page(&self, body: &str) -> ProductFields;
}
