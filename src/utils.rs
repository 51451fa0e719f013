//! Shared helpers: static regex compilation, host normalization and URL path checks.

use regex::Regex;
use url::Url;

/// Compiles a regex at static init; panics on invalid pattern.
pub fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Normalizes a host string: trim, strip leading "www.", trailing '.', and lowercases.
#[must_use]
pub fn canonical_host(host: &str) -> String {
    host.trim()
        .trim_start_matches("www.")
        .trim_end_matches('.')
        .to_ascii_lowercase()
}

/// Returns the canonical host of `url`, or `"unknown"` if it has none.
#[must_use]
pub fn host_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(canonical_host))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Common URL path fragments indicating a login/SSO page.
const LOGIN_PATTERNS: &[&str] = &[
    "/login",
    "/signin",
    "/sign-in",
    "/auth/",
    "/sso",
    "/cas/login",
    "/saml",
    "/oauth",
    "/openid",
    "/idp/",
];

/// Returns true if the URL's path (and query) looks like a login or SSO endpoint.
#[must_use]
pub fn is_login_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let mut tail = parsed.path().to_ascii_lowercase();
    if let Some(query) = parsed.query() {
        tail.push('?');
        tail.push_str(&query.to_ascii_lowercase());
    }
    LOGIN_PATTERNS.iter().any(|pattern| tail.contains(pattern))
}
