//! Scope-key and route-identifier extraction from request paths

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// First path segment, both slashes included: `/inventory-service/`
    static ref SCOPE_KEY_PATTERN: Regex = Regex::new(r"^/([\w-]+)/").unwrap();

    /// Proxied-route prefix: `/r/{identifier}/`
    static ref ROUTE_IDENTIFIER_PATTERN: Regex = Regex::new(r"/r/([^/]+)/").unwrap();
}

/// Derive the scope lookup key for a path.
///
/// The key is the matched first segment (slashes included) plus `**`, so
/// `/inventory-service/items` yields `/inventory-service/**`. Paths with
/// no matching segment fall back to `path + "**"`.
pub fn extract_scope_key(path: &str) -> String {
    match SCOPE_KEY_PATTERN.find(path) {
        Some(m) => format!("{}**", m.as_str()),
        None => format!("{path}**"),
    }
}

/// Extract the route identifier from a proxied path.
///
/// Matches the gateway's routing prefix `/r/{identifier}/` anywhere in
/// the path; non-proxied paths yield `None`.
pub fn extract_route_identifier(path: &str) -> Option<String> {
    ROUTE_IDENTIFIER_PATTERN
        .captures(path)
        .map(|captures| captures[1].to_string())
}
