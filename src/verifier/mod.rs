//! Single-shot network verification of candidate URLs.
//!
//! The [`Verifier`] performs exactly one bounded fetch per check and maps the
//! response onto a [`VerificationOutcome`]. It never retries; retry policy
//! belongs to whoever calls `resolve`.
//!
//! Both collaborators are injected behind traits so verification can be
//! exercised without a network:
//! - [`Fetcher`] - one GET with a timeout, returning status, headers and a body prefix
//! - [`ContentClassifier`] - boolean paywall / login-wall signals from response text
//!
//! [`ReqwestFetcher`] and [`MarkerClassifier`] are the production defaults.

mod classifier;
mod http;

pub use classifier::MarkerClassifier;
pub use http::{HttpFetcherConfig, ReqwestFetcher};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::utils::is_login_url;

/// Default per-check timeout.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Response data a [`Fetcher`] hands back to the verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code of the final response.
    pub status: u16,
    /// URL after any redirects were followed.
    pub final_url: String,
    /// Raw `Content-Type` header value, if present.
    pub content_type: Option<String>,
    /// Leading bytes of the body (may be truncated).
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// Creates a response with no content type and an empty body.
    #[must_use]
    pub fn new(status: u16, final_url: impl Into<String>) -> Self {
        Self {
            status,
            final_url: final_url.into(),
            content_type: None,
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Body decoded as UTF-8, lossily.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Media type without parameters, lowercased.
    #[must_use]
    pub fn media_type(&self) -> Option<String> {
        self.content_type.as_deref().map(|raw| {
            raw.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
    }
}

/// Transport-level failures reported by a [`Fetcher`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// No response within the allowed time.
    #[error("timeout fetching {url}")]
    Timeout { url: String },

    /// Redirect chain exceeded the configured limit.
    #[error("too many redirects fetching {url}")]
    TooManyRedirects { url: String },

    /// DNS, TCP or TLS connection failure.
    #[error("connection failed fetching {url}: {reason}")]
    Connect { url: String, reason: String },

    /// Any other request failure.
    #[error("request failed fetching {url}: {reason}")]
    Request { url: String, reason: String },

    /// The HTTP client itself could not be built.
    #[error("HTTP client construction failed: {reason}")]
    ClientBuild { reason: String },
}

/// Network-fetch collaborator: one GET, one attempt, bounded by `timeout`.
///
/// Uses `async_trait` so implementations can be held as `Arc<dyn Fetcher>`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url` once.
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchResponse, FetchError>;
}

/// Content-classifier collaborator.
pub trait ContentClassifier: Send + Sync {
    /// True if the text signals a paywall or purchase page.
    fn is_paywalled(&self, body: &str) -> bool;

    /// True if the text is an explicit login wall (distinct from a paywall).
    fn is_login_wall(&self, _body: &str) -> bool {
        false
    }
}

/// Classification of one checked URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// A document is served at the URL.
    Confirmed { url: String },
    /// A paywall or purchase page is served instead of the document.
    PaywallDetected { url: String },
    /// An explicit login wall blocks the document.
    Denied { url: String },
    /// Server error, timeout, connection failure, or too many redirects.
    TransientError { url: String, cause: String },
    /// Nothing document-like lives at the URL.
    NotFound { url: String, reason: String },
}

impl VerificationOutcome {
    /// The URL that was checked.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Confirmed { url }
            | Self::PaywallDetected { url }
            | Self::Denied { url }
            | Self::TransientError { url, .. }
            | Self::NotFound { url, .. } => url,
        }
    }

    /// Short stable label for logging.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Confirmed { .. } => "confirmed",
            Self::PaywallDetected { .. } => "paywall_detected",
            Self::Denied { .. } => "denied",
            Self::TransientError { .. } => "transient_error",
            Self::NotFound { .. } => "not_found",
        }
    }
}

impl fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransientError { url, cause } => write!(f, "transient error at {url}: {cause}"),
            Self::NotFound { url, reason } => write!(f, "not found at {url}: {reason}"),
            other => write!(f, "{} at {}", other.label(), other.url()),
        }
    }
}

/// Verifier tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifierConfig {
    /// Upper bound for a single check.
    pub request_timeout: Duration,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Checks candidate URLs against the live network.
#[derive(Clone)]
pub struct Verifier {
    fetcher: Arc<dyn Fetcher>,
    classifier: Arc<dyn ContentClassifier>,
    config: VerifierConfig,
}

impl Verifier {
    /// Creates a verifier with default configuration.
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>, classifier: Arc<dyn ContentClassifier>) -> Self {
        Self::with_config(fetcher, classifier, VerifierConfig::default())
    }

    #[must_use]
    pub fn with_config(
        fetcher: Arc<dyn Fetcher>,
        classifier: Arc<dyn ContentClassifier>,
        config: VerifierConfig,
    ) -> Self {
        Self {
            fetcher,
            classifier,
            config,
        }
    }

    /// Builds the production verifier: [`ReqwestFetcher`] + [`MarkerClassifier`].
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] if the HTTP client cannot be built.
    pub fn with_defaults(
        http: HttpFetcherConfig,
        config: VerifierConfig,
    ) -> Result<Self, FetchError> {
        Ok(Self::with_config(
            Arc::new(ReqwestFetcher::with_config(http)?),
            Arc::new(MarkerClassifier::default()),
            config,
        ))
    }

    #[must_use]
    pub fn config(&self) -> VerifierConfig {
        self.config
    }

    /// Checks `url` with the configured timeout.
    pub async fn check(&self, url: &str) -> VerificationOutcome {
        self.check_within(url, self.config.request_timeout).await
    }

    /// Checks `url`, giving up after `limit` (capped at the configured timeout).
    #[tracing::instrument(skip(self), fields(url = %url))]
    pub async fn check_within(&self, url: &str, limit: Duration) -> VerificationOutcome {
        let limit = limit.min(self.config.request_timeout);
        let fetched = tokio::time::timeout(limit, self.fetcher.fetch(url, limit)).await;
        let outcome = match fetched {
            Err(_) => VerificationOutcome::TransientError {
                url: url.to_string(),
                cause: format!("no response within {}ms", limit.as_millis()),
            },
            Ok(Err(error)) => outcome_for_fetch_error(url, &error),
            Ok(Ok(response)) => classify_response(url, &response, self.classifier.as_ref()),
        };
        debug!(outcome = outcome.label(), "Verification finished");
        outcome
    }
}

impl fmt::Debug for Verifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Verifier")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Maps a transport failure onto an outcome. All are transient.
#[must_use]
pub fn outcome_for_fetch_error(url: &str, error: &FetchError) -> VerificationOutcome {
    VerificationOutcome::TransientError {
        url: url.to_string(),
        cause: error.to_string(),
    }
}

const DOCUMENT_MEDIA_TYPES: &[&str] = &[
    "application/pdf",
    "application/x-pdf",
    "application/octet-stream",
    "application/epub+zip",
    "application/postscript",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "image/vnd.djvu",
];

/// Returns true if the response carries a document rather than a web page.
#[must_use]
pub fn looks_like_document(response: &FetchResponse) -> bool {
    if response.body.starts_with(b"%PDF-") {
        return true;
    }
    response
        .media_type()
        .is_some_and(|media| DOCUMENT_MEDIA_TYPES.contains(&media.as_str()))
}

/// Classifies a completed response for the checked `url`.
#[must_use]
pub fn classify_response(
    url: &str,
    response: &FetchResponse,
    classifier: &dyn ContentClassifier,
) -> VerificationOutcome {
    let url = url.to_string();
    let status = response.status;

    match status {
        200..=299 => {
            if looks_like_document(response) {
                return VerificationOutcome::Confirmed { url };
            }
            let text = response.text();
            if is_login_url(&response.final_url) || classifier.is_login_wall(&text) {
                return VerificationOutcome::Denied { url };
            }
            if classifier.is_paywalled(&text) {
                return VerificationOutcome::PaywallDetected { url };
            }
            VerificationOutcome::NotFound {
                url,
                reason: format!(
                    "HTTP {status} but content is not a document ({})",
                    response.media_type().unwrap_or_else(|| "no content type".to_string())
                ),
            }
        }
        401 | 407 => VerificationOutcome::Denied { url },
        402 => VerificationOutcome::PaywallDetected { url },
        403 => {
            if classifier.is_login_wall(&response.text()) || is_login_url(&response.final_url) {
                VerificationOutcome::Denied { url }
            } else {
                VerificationOutcome::PaywallDetected { url }
            }
        }
        404 | 410 => VerificationOutcome::NotFound {
            url,
            reason: format!("HTTP {status}"),
        },
        408 | 425 | 429 | 500..=599 => VerificationOutcome::TransientError {
            url,
            cause: format!("HTTP {status}"),
        },
        400..=499 => VerificationOutcome::NotFound {
            url,
            reason: format!("HTTP {status}"),
        },
        _ => VerificationOutcome::TransientError {
            url,
            cause: format!("unexpected HTTP {status}"),
        },
    }
}
