//! Resolution orchestration: lookup → construct → verify → result.
//!
//! [`HandlerDispatcher`] is the crate's single inbound surface. Each call to
//! [`HandlerDispatcher::resolve`] is independent; the only state shared
//! between calls is the immutable [`Registry`] and an append-only cache of
//! strategy instances keyed by publisher id.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use doclink_core::{ArticleRecord, HandlerDispatcher, Registry, Verifier};
//! use doclink_core::verifier::{HttpFetcherConfig, VerifierConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(Registry::load_json_file("catalogue.json".as_ref())?);
//! let verifier = Verifier::with_defaults(HttpFetcherConfig::default(), VerifierConfig::default())?;
//! let dispatcher = HandlerDispatcher::new(registry, verifier);
//!
//! let record = ArticleRecord::new("acc-1").with_journal("Acme Letters").with_doi("10.1/x");
//! let resolution = dispatcher.resolve(&record, true).await?;
//! println!("{resolution:?}");
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use futures_util::StreamExt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::failure::{Resolution, ResolutionFailure};
use crate::record::{ArticleRecord, RecordField};
use crate::registry::{ConfigurationError, PublisherProfile, Registry};
use crate::strategy::{
    CandidateSet, ConstructionResult, ConstructionStrategy, StrategyBuilder, build_strategy,
};
use crate::utils::host_of;
use crate::verifier::{VerificationOutcome, Verifier};

/// Default number of concurrent resolutions in [`HandlerDispatcher::resolve_many`].
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Per-call resolution options.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Check candidates against the network before returning them.
    pub verify: bool,
    /// Give up on verification once this instant passes.
    pub deadline: Option<Instant>,
    /// Cancel verification when this token fires.
    pub cancel: Option<CancellationToken>,
}

impl ResolveOptions {
    #[must_use]
    pub fn new(verify: bool) -> Self {
        Self {
            verify,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Maps records to publisher strategies, runs them, and verifies results.
pub struct HandlerDispatcher {
    registry: Arc<Registry>,
    verifier: Verifier,
    builders: HashMap<String, StrategyBuilder>,
    strategies: DashMap<String, Arc<dyn ConstructionStrategy>>,
}

impl HandlerDispatcher {
    /// Creates a dispatcher using the default strategy table.
    #[must_use]
    pub fn new(registry: Arc<Registry>, verifier: Verifier) -> Self {
        Self {
            registry,
            verifier,
            builders: HashMap::new(),
            strategies: DashMap::new(),
        }
    }

    /// Registers a publisher-specific strategy builder, replacing the default.
    ///
    /// Intended for startup wiring, before the first resolution.
    #[must_use]
    pub fn with_strategy(mut self, publisher_id: impl Into<String>, builder: StrategyBuilder) -> Self {
        self.builders.insert(publisher_id.into(), builder);
        self
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Number of strategy instances created so far.
    #[must_use]
    pub fn cached_strategy_count(&self) -> usize {
        self.strategies.len()
    }

    /// Resolves `record`, verifying the candidate when `verify` is true.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] only for catalogue defects. Every other
    /// failure is reported as [`Resolution::Failure`].
    pub async fn resolve(
        &self,
        record: &ArticleRecord,
        verify: bool,
    ) -> Result<Resolution, ConfigurationError> {
        self.resolve_with(record, &ResolveOptions::new(verify)).await
    }

    /// Resolves `record` with explicit options (deadline, cancellation).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] only for catalogue defects.
    #[tracing::instrument(
        skip(self, record, options),
        fields(record_id = %record.record_id, verify = options.verify)
    )]
    pub async fn resolve_with(
        &self,
        record: &ArticleRecord,
        options: &ResolveOptions,
    ) -> Result<Resolution, ConfigurationError> {
        let Some(journal) = record.field(RecordField::Journal) else {
            return Ok(fail(
                record,
                ResolutionFailure::missing_data("journal not recognized: record has no journal"),
            ));
        };

        let entry = match self.registry.lookup(journal) {
            Ok(entry) => entry,
            Err(lookup_error) => {
                debug!(error = %lookup_error, "Registry lookup failed");
                return Ok(fail(
                    record,
                    ResolutionFailure::missing_data(format!("journal not recognized: '{journal}'")),
                ));
            }
        };

        let profile = self
            .registry
            .publisher(&entry.publisher_id)
            .inspect_err(|config_error| error!(error = %config_error, "Catalogue defect"))?;
        let strategy = self.strategy_for(profile)?;
        debug!(
            publisher = %entry.publisher_id,
            strategy = strategy.name(),
            "Constructing candidates"
        );

        let candidates = match strategy.construct(record) {
            ConstructionResult::Candidates(set) => set,
            ConstructionResult::MissingData { message, .. } => {
                return Ok(fail(record, ResolutionFailure::missing_data(message)));
            }
            ConstructionResult::ArchitecturalIncompatibility { page_url, reason } => {
                return Ok(fail(
                    record,
                    ResolutionFailure::incompatible(
                        format!("{reason}; open {page_url} to retrieve it manually"),
                        &page_url,
                    ),
                ));
            }
        };

        if !options.verify {
            let url = candidates.first().url.clone();
            info!(url = %url, role = %candidates.first().role, "Resolved without verification");
            return Ok(Resolution::success(url));
        }

        Ok(self.verify_candidates(record, &candidates, options).await)
    }

    /// Resolves many records concurrently, preserving input order.
    pub async fn resolve_many(
        &self,
        records: &[ArticleRecord],
        options: &ResolveOptions,
        concurrency: usize,
    ) -> Vec<Result<Resolution, ConfigurationError>> {
        futures_util::stream::iter(records)
            .map(|record| self.resolve_with(record, options))
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    fn strategy_for(
        &self,
        profile: &PublisherProfile,
    ) -> Result<Arc<dyn ConstructionStrategy>, ConfigurationError> {
        if let Some(existing) = self.strategies.get(profile.id()) {
            return Ok(Arc::clone(existing.value()));
        }
        // Built outside the map lock; a racing duplicate is discarded.
        let builder = self
            .builders
            .get(profile.id())
            .copied()
            .unwrap_or(build_strategy as StrategyBuilder);
        let built = builder(profile)?;
        let cached = self
            .strategies
            .entry(profile.id().to_string())
            .or_insert(built);
        Ok(Arc::clone(cached.value()))
    }

    async fn verify_candidates(
        &self,
        record: &ArticleRecord,
        candidates: &CandidateSet,
        options: &ResolveOptions,
    ) -> Resolution {
        let mut last_attempted: Option<&str> = None;
        let mut last_failure: Option<ResolutionFailure> = None;

        for candidate in candidates.iter() {
            let outcome = match self.check_bounded(&candidate.url, options).await {
                Ok(outcome) => outcome,
                Err(Interruption::BeforeFetch(cause)) => {
                    let attempted = last_attempted.unwrap_or(&candidate.url);
                    return fail(record, ResolutionFailure::technical(cause, attempted));
                }
                Err(Interruption::DuringFetch(cause)) => {
                    return fail(record, ResolutionFailure::technical(cause, &candidate.url));
                }
            };
            last_attempted = Some(&candidate.url);

            match outcome {
                VerificationOutcome::Confirmed { url } => {
                    info!(url = %url, role = %candidate.role, "Resolved and verified");
                    return Resolution::success(url);
                }
                VerificationOutcome::PaywallDetected { url } => {
                    return fail(
                        record,
                        ResolutionFailure::access_denied("paywall or purchase page detected", &url),
                    );
                }
                VerificationOutcome::Denied { url } => {
                    return fail(
                        record,
                        ResolutionFailure::access_denied("login required to access document", &url),
                    );
                }
                VerificationOutcome::TransientError { url, cause } => {
                    warn!(
                        attempted_url = %url,
                        host = %host_of(&url),
                        role = %candidate.role,
                        cause = %cause,
                        "Candidate verification failed"
                    );
                    last_failure = Some(ResolutionFailure::technical(cause, &url));
                }
                VerificationOutcome::NotFound { url, reason } => {
                    warn!(
                        attempted_url = %url,
                        host = %host_of(&url),
                        role = %candidate.role,
                        reason = %reason,
                        "Candidate not found"
                    );
                    last_failure = Some(ResolutionFailure::technical(
                        format!("document not found: {reason}"),
                        &url,
                    ));
                }
            }
        }

        let failure = last_failure.unwrap_or_else(|| {
            ResolutionFailure::technical(
                "verification produced no outcome",
                &candidates.first().url,
            )
        });
        fail(record, failure)
    }

    /// Runs one verification bounded by the caller's deadline and cancel token.
    ///
    /// `Err` carries the interruption cause and whether a request was in
    /// flight; no shared lock is held while waiting.
    async fn check_bounded(
        &self,
        url: &str,
        options: &ResolveOptions,
    ) -> Result<VerificationOutcome, Interruption> {
        if options
            .cancel
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
        {
            return Err(Interruption::BeforeFetch(
                "resolution cancelled before verification".to_string(),
            ));
        }

        let limit = match options.deadline {
            Some(deadline) => {
                let now = Instant::now();
                if deadline <= now {
                    return Err(Interruption::BeforeFetch(
                        "deadline exceeded before verification".to_string(),
                    ));
                }
                deadline - now
            }
            None => self.verifier.config().request_timeout,
        };

        let check = self.verifier.check_within(url, limit);
        match &options.cancel {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => Err(Interruption::DuringFetch(
                    "resolution cancelled during verification".to_string(),
                )),
                outcome = check => Ok(outcome),
            },
            None => Ok(check.await),
        }
    }
}

/// Why a verification did not produce an outcome.
#[derive(Debug)]
enum Interruption {
    /// Stopped before the request was sent.
    BeforeFetch(String),
    /// Stopped while the request was in flight.
    DuringFetch(String),
}

impl std::fmt::Debug for HandlerDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut overrides: Vec<&str> = self.builders.keys().map(String::as_str).collect();
        overrides.sort_unstable();
        f.debug_struct("HandlerDispatcher")
            .field("publishers", &self.registry.publisher_count())
            .field("strategy_overrides", &overrides)
            .field("cached_strategies", &self.strategies.len())
            .finish_non_exhaustive()
    }
}

fn fail(record: &ArticleRecord, failure: ResolutionFailure) -> Resolution {
    warn!(
        record_id = %record.record_id,
        kind = %failure.kind,
        attempted_url = %failure.attempted_url,
        message = %failure.message,
        "Resolution failed"
    );
    Resolution::Failure(failure)
}
