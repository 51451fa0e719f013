//! Closed failure taxonomy and the final per-call resolution result.

use std::fmt;

use serde::Serialize;

/// Placeholder recorded when construction never produced a URL.
pub const NO_ATTEMPTED_URL: &str = "none";

/// The four failure categories a resolution can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Required identifying fields absent, or journal unrecognized.
    MissingData,
    /// Publisher blocks access behind a paywall or login.
    AccessDenied,
    /// Transient network or server failure.
    TechnicalError,
    /// Delivery mechanism cannot be expressed as a direct document URL.
    ArchitecturalIncompatibility,
}

impl FailureKind {
    /// Returns the stable label used in logs and JSON output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingData => "missing_data",
            Self::AccessDenied => "access_denied",
            Self::TechnicalError => "technical_error",
            Self::ArchitecturalIncompatibility => "architectural_incompatibility",
        }
    }

    /// Returns true if the caller may retry later with the same input.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::TechnicalError)
    }

    /// Returns the user-facing What/Why/Fix descriptor for this kind.
    #[must_use]
    pub fn descriptor(self) -> FailureDescriptor {
        match self {
            Self::MissingData => FailureDescriptor {
                kind: self,
                what: "Record could not be turned into a URL",
                why: "The journal is unknown or the record lacks fields the publisher's URL scheme needs.",
                fix: "Complete the record (DOI, volume, pages) or add the journal to the catalogue.",
            },
            Self::AccessDenied => FailureDescriptor {
                kind: self,
                what: "Publisher denied access",
                why: "The document sits behind a paywall or login wall.",
                fix: "Obtain institutional access or a purchase; this tool will not bypass it.",
            },
            Self::TechnicalError => FailureDescriptor {
                kind: self,
                what: "Verification failed for technical reasons",
                why: "The server errored, timed out, or the URL no longer resolves.",
                fix: "Retry later; check connectivity or VPN settings if it persists.",
            },
            Self::ArchitecturalIncompatibility => FailureDescriptor {
                kind: self,
                what: "Document is not reachable by direct URL",
                why: "The publisher delivers files through a form submission or session-only flow.",
                fix: "Open the attached article page in a browser and download manually.",
            },
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-oriented explanation for a [`FailureKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureDescriptor {
    pub kind: FailureKind,
    pub what: &'static str,
    pub why: &'static str,
    pub fix: &'static str,
}

/// A classified failure, always carrying the last URL tried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionFailure {
    pub kind: FailureKind,
    pub message: String,
    /// Last attempted URL, or [`NO_ATTEMPTED_URL`] if none was built.
    pub attempted_url: String,
}

impl ResolutionFailure {
    /// Creates a failure; an empty `attempted_url` is recorded as `"none"`.
    #[must_use]
    pub fn new(kind: FailureKind, message: impl Into<String>, attempted_url: &str) -> Self {
        let attempted_url = if attempted_url.trim().is_empty() {
            NO_ATTEMPTED_URL.to_string()
        } else {
            attempted_url.to_string()
        };
        Self {
            kind,
            message: message.into(),
            attempted_url,
        }
    }

    /// Creates a `MissingData` failure with no attempted URL.
    #[must_use]
    pub fn missing_data(message: impl Into<String>) -> Self {
        Self::new(FailureKind::MissingData, message, NO_ATTEMPTED_URL)
    }

    /// Creates an `AccessDenied` failure.
    #[must_use]
    pub fn access_denied(message: impl Into<String>, attempted_url: &str) -> Self {
        Self::new(FailureKind::AccessDenied, message, attempted_url)
    }

    /// Creates a `TechnicalError` failure.
    #[must_use]
    pub fn technical(message: impl Into<String>, attempted_url: &str) -> Self {
        Self::new(FailureKind::TechnicalError, message, attempted_url)
    }

    /// Creates an `ArchitecturalIncompatibility` failure pointing at `page_url`.
    #[must_use]
    pub fn incompatible(message: impl Into<String>, page_url: &str) -> Self {
        Self::new(FailureKind::ArchitecturalIncompatibility, message, page_url)
    }

    /// Returns true if no URL was ever constructed.
    #[must_use]
    pub fn attempted_nothing(&self) -> bool {
        self.attempted_url == NO_ATTEMPTED_URL
    }
}

impl fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} (attempted: {})\n  Suggestion: {}",
            self.kind,
            self.message,
            self.attempted_url,
            self.kind.descriptor().fix
        )
    }
}

/// Final result of one `resolve` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    Success { url: String },
    Failure(ResolutionFailure),
}

impl Resolution {
    /// Creates a success result.
    #[must_use]
    pub fn success(url: impl Into<String>) -> Self {
        Self::Success { url: url.into() }
    }

    /// Returns true for `Success`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns the resolved URL on success.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Success { url } => Some(url),
            Self::Failure(_) => None,
        }
    }

    /// Returns the failure on failure.
    #[must_use]
    pub fn failure(&self) -> Option<&ResolutionFailure> {
        match self {
            Self::Success { .. } => None,
            Self::Failure(failure) => Some(failure),
        }
    }
}

impl From<ResolutionFailure> for Resolution {
    fn from(failure: ResolutionFailure) -> Self {
        Self::Failure(failure)
    }
}
