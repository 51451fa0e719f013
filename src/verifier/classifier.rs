//! Marker-phrase content classifier.

use super::ContentClassifier;

const PAYWALL_MARKERS: &[&str] = &[
    "purchase pdf",
    "purchase access",
    "buy article",
    "buy this article",
    "rent this article",
    "add to cart",
    "pay per view",
    "subscribe to",
    "get access",
    "access through your institution",
    "check access",
];

const LOGIN_MARKERS: &[&str] = &[
    "sign in to continue",
    "please log in",
    "please sign in",
    "log in to access",
    "login required",
    "institutional sign in",
    "forgot your password",
];

const PASSWORD_FIELD_MARKERS: &[&str] = &["type=\"password\"", "type='password'", "type=password"];

/// Counts known paywall and login phrases in page text.
///
/// A single stray phrase is common on ordinary landing pages, so a signal
/// requires `min_hits` distinct markers. A password input counts as a login
/// wall on its own.
#[derive(Debug, Clone)]
pub struct MarkerClassifier {
    min_hits: usize,
}

impl MarkerClassifier {
    /// Creates a classifier requiring `min_hits` markers (at least 1).
    #[must_use]
    pub fn new(min_hits: usize) -> Self {
        Self {
            min_hits: min_hits.max(1),
        }
    }

    fn hits(markers: &[&str], normalized: &str) -> usize {
        markers
            .iter()
            .filter(|marker| normalized.contains(**marker))
            .count()
    }
}

impl Default for MarkerClassifier {
    fn default() -> Self {
        Self::new(2)
    }
}

impl ContentClassifier for MarkerClassifier {
    fn is_paywalled(&self, body: &str) -> bool {
        Self::hits(PAYWALL_MARKERS, &body.to_lowercase()) >= self.min_hits
    }

    fn is_login_wall(&self, body: &str) -> bool {
        let normalized = body.to_lowercase();
        if PASSWORD_FIELD_MARKERS
            .iter()
            .any(|marker| normalized.contains(marker))
        {
            return true;
        }
        Self::hits(LOGIN_MARKERS, &normalized) >= self.min_hits
    }
}
