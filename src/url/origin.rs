use url::Url;

/// Extracts the origin a URL belongs to, for per-origin rate limiting
///
/// The origin is `scheme://host[:port]` with the host lowercased and the port
/// omitted when it is the scheme default. Two URLs share a rate limit exactly
/// when their origins are equal.
///
/// # Arguments
///
/// * `url` - The URL to extract the origin from
///
/// # Returns
///
/// * `Some(String)` - The serialized origin
/// * `None` - If the URL has no host (e.g. `data:` URLs)
///
/// # Examples
///
/// ```
/// use url::Url;
/// use listing_harvester::url::extract_origin;
///
/// let url = Url::parse("https://Shop.Example.com/item/1").unwrap();
/// assert_eq!(extract_origin(&url), Some("https://shop.example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/s?k=bags").unwrap();
/// assert_eq!(extract_origin(&url), Some("http://127.0.0.1:8080".to_string()));
/// ```
pub fn extract_origin(url: &Url) -> Option<String> {
    url.host_str()?;
    let origin = url.origin();
    origin
        .is_tuple()
        .then(|| origin.ascii_serialization())
}

/// Like [`extract_origin`], for a URL that has not been parsed yet
pub fn origin_of(url_str: &str) -> Option<String> {
    Url::parse(url_str).ok().as_ref().and_then(extract_origin)
}
