//! Per-publisher URL construction.
//!
//! A [`ConstructionStrategy`] turns an [`ArticleRecord`] into at most two
//! candidate URLs by pure template substitution. Strategies never touch the
//! network; verification is the [`crate::verifier`] module's job.
//!
//! # Architecture
//!
//! - [`ConstructionStrategy`] - Single-method trait every publisher strategy implements
//! - [`ConstructionResult`] - Candidates, missing data, or an incompatible delivery mechanism
//! - [`CandidateSet`] - First candidate plus an optional fallback (never more)
//! - [`DirectStrategy`] - Publishers whose documents are reachable with a plain GET
//! - [`GatedStrategy`] - Publishers that release documents only through forms or sessions
//! - [`build_strategy`] - Default strategy table keyed on [`DeliveryMode`]

mod direct;
mod gated;

pub use direct::DirectStrategy;
pub use gated::GatedStrategy;

use std::sync::Arc;

use crate::record::{ArticleRecord, RecordField};
use crate::registry::{ConfigurationError, DeliveryMode, PublisherProfile, TemplateRole};

/// A constructed URL tagged with the template role that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub url: String,
    pub role: TemplateRole,
}

impl Candidate {
    #[must_use]
    pub fn new(url: impl Into<String>, role: TemplateRole) -> Self {
        Self {
            url: url.into(),
            role,
        }
    }
}

/// One or two candidates, in attempt order.
///
/// The shape itself enforces the bounded-attempt rule: there is no way to
/// carry a third URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSet {
    first: Candidate,
    fallback: Option<Candidate>,
}

impl CandidateSet {
    /// A single candidate.
    #[must_use]
    pub fn single(candidate: Candidate) -> Self {
        Self {
            first: candidate,
            fallback: None,
        }
    }

    /// A candidate followed by a fallback to try if the first fails verification.
    #[must_use]
    pub fn with_fallback(first: Candidate, fallback: Candidate) -> Self {
        Self {
            first,
            fallback: Some(fallback),
        }
    }

    /// The candidate to attempt first.
    #[must_use]
    pub fn first(&self) -> &Candidate {
        &self.first
    }

    /// The candidate to attempt after the first fails verification.
    #[must_use]
    pub fn fallback(&self) -> Option<&Candidate> {
        self.fallback.as_ref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        1 + usize::from(self.fallback.is_some())
    }

    /// Always false; present for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Candidates in attempt order.
    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        std::iter::once(&self.first).chain(self.fallback.as_ref())
    }
}

/// Outcome of [`ConstructionStrategy::construct`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructionResult {
    /// At least one URL could be built.
    Candidates(CandidateSet),
    /// The record lacks fields every available template needs.
    MissingData {
        missing: Vec<RecordField>,
        message: String,
    },
    /// Documents are not reachable by URL; `page_url` is for a human.
    ArchitecturalIncompatibility { page_url: String, reason: String },
}

/// Builds URLs for one publisher.
///
/// Implementations are stateless beyond their template bindings and are
/// shared across concurrent resolutions.
pub trait ConstructionStrategy: Send + Sync + std::fmt::Debug {
    /// Returns the strategy's name for logging (e.g. "direct", "gated").
    fn name(&self) -> &str;

    /// Builds candidate URLs for `record` without any I/O.
    fn construct(&self, record: &ArticleRecord) -> ConstructionResult;
}

/// Creates the strategy instance for a publisher profile.
pub type StrategyBuilder =
    fn(&PublisherProfile) -> Result<Arc<dyn ConstructionStrategy>, ConfigurationError>;

/// Default strategy table: chooses an implementation from the delivery mode.
///
/// # Errors
///
/// Returns [`ConfigurationError`] if the profile has no primary template.
pub fn build_strategy(
    profile: &PublisherProfile,
) -> Result<Arc<dyn ConstructionStrategy>, ConfigurationError> {
    match profile.delivery() {
        DeliveryMode::Direct => Ok(Arc::new(DirectStrategy::from_profile(profile)?)),
        DeliveryMode::FormPost | DeliveryMode::SessionOnly => {
            Ok(Arc::new(GatedStrategy::from_profile(profile)?))
        }
    }
}

fn describe_missing(publisher_id: &str, missing: &[RecordField]) -> String {
    let names: Vec<&str> = missing.iter().map(|field| field.as_str()).collect();
    format!(
        "record lacks fields required by publisher '{publisher_id}': {}",
        names.join(", ")
    )
}
