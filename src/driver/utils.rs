//! Shared helpers for driver modules: host normalization and static regexes.

use regex::Regex;
use url::Url;

/// Compiles a regex at static init; panics on invalid pattern.
pub fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Normalizes a host string: trim, strip leading "www.", trailing '.', and lowercases.
#[must_use]
pub fn canonical_host(host: &str) -> String {
    let lowered = host.trim().trim_end_matches('.').to_ascii_lowercase();
    lowered
        .strip_prefix("www.")
        .map_or_else(|| lowered.clone(), str::to_string)
}

/// Parses `url_or_host` as a URL and returns its host (with port when
/// present), or normalizes it as a bare host string.
#[must_use]
pub fn parse_host_or_fallback(url_or_host: &str) -> String {
    Url::parse(url_or_host)
        .ok()
        .and_then(|url| host_with_port(&url))
        .unwrap_or_else(|| canonical_host(url_or_host))
}

/// Returns `host[:port]` for `url`, keeping explicit ports so local test
/// servers are distinguishable.
#[must_use]
pub fn host_with_port(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{port}", canonical_host(host)),
        None => canonical_host(host),
    })
}
