//! Utility functions and helpers.

use url::Url;

/// Resolve a potentially relative link against a base URL.
///
/// Returns `None` for blank links, unparseable links and anything that
/// does not resolve to an `http`/`https` URL (`mailto:`, `javascript:`, ...).
pub fn resolve_http_url(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let resolved = base.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
