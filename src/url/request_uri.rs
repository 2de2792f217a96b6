use url::Url;

/// Checks that a link is a well-formed absolute request URI
///
/// A valid request URI parses as a URL with a scheme and a host and has a
/// hierarchical path. Opaque URIs such as `mailto:` or `javascript:` and
/// relative references are rejected, as is anything containing control
/// characters (the URL parser would otherwise strip tabs and newlines
/// silently).
///
/// # Examples
///
/// ```
/// use scope_crawl::url::is_valid_request_uri;
///
/// assert!(is_valid_request_uri("https://example.com/page?id=1"));
/// assert!(!is_valid_request_uri("/relative/path"));
/// assert!(!is_valid_request_uri("mailto:someone@example.com"));
/// ```
pub fn is_valid_request_uri(candidate: &str) -> bool {
    if candidate.is_empty() || candidate.chars().any(|c| c.is_control()) {
        return false;
    }

    match Url::parse(candidate) {
        Ok(url) => !url.cannot_be_a_base() && url.host_str().is_some_and(|h| !h.is_empty()),
        Err(_) => false,
    }
}
