//! URL handling module for Listing-Harvester
//!
//! This module provides de-duplication keys, origin extraction for rate
//! limiting, link resolution and listing pagination.

mod normalize;
mod origin;

use crate::UrlError;
use url::Url;

// Re-export main functions
pub use normalize::{dedup_key, normalize_url};
pub use origin::{extract_origin, origin_of};

/// Builds the URL of a listing page from the seed URL
///
/// Page 1 is the seed exactly as configured. Later pages set `page_param` to
/// the page number, replacing any value the seed already carried and keeping
/// every other query parameter in place.
///
/// # Arguments
///
/// * `seed` - The first listing page
/// * `page_param` - Name of the query parameter holding the page number
/// * `page` - 1-based page number
///
/// # Examples
///
/// ```
/// use listing_harvester::url::page_url;
///
/// let seed = "https://shop.example.com/s?k=bags";
/// assert_eq!(page_url(seed, "page", 1).unwrap(), seed);
/// assert_eq!(
///     page_url(seed, "page", 3).unwrap(),
///     "https://shop.example.com/s?k=bags&page=3"
/// );
/// ```
pub fn page_url(seed: &str, page_param: &str, page: u32) -> Result<String, UrlError> {
    if page <= 1 {
        return Ok(seed.to_string());
    }

    let mut url = Url::parse(seed).map_err(|e| UrlError::Parse(e.to_string()))?;

    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != page_param)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(retained.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .append_pair(page_param, &page.to_string());

    Ok(url.to_string())
}

/// Resolves a link href found on `base` to an absolute URL
///
/// Returns None if the link should be ignored:
/// - empty hrefs and fragment-only anchors
/// - javascript:, mailto:, tel: and data: links
///
/// An href that cannot be resolved is returned unchanged so that the fetcher
/// can report it as a malformed URL instead of it vanishing silently.
pub fn resolve_link(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    match base.join(href) {
        Ok(absolute) => Some(absolute.to_string()),
        Err(_) => Some(href.to_string()),
    }
}
