use url::Url;

/// Turns an href into the form that gets recorded and scope-checked
///
/// Absolute hrefs are returned verbatim so that the prefix comparison sees
/// exactly what the page contained. Relative hrefs are joined onto the page
/// address. Fragment-only hrefs and hrefs that cannot be joined are returned
/// unchanged; the scope filter later rejects them as invalid.
///
/// # Arguments
///
/// * `href` - The raw attribute value
/// * `base_url` - The address of the page the href was found on
///
/// # Examples
///
/// ```
/// use scope_crawl::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("http://x.test/a").unwrap();
/// assert_eq!(resolve_link("/a/b", &base), "http://x.test/a/b");
/// assert_eq!(resolve_link("HTTP://Other.test/X", &base), "HTTP://Other.test/X");
/// assert_eq!(resolve_link("#top", &base), "#top");
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> String {
    if href.starts_with('#') || Url::parse(href).is_ok() {
        return href.to_string();
    }

    match base_url.join(href) {
        Ok(absolute_url) => absolute_url.to_string(),
        Err(_) => href.to_string(),
    }
}
