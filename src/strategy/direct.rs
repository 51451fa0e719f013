//! Strategy for publishers serving documents at a plain, constructible URL.

use tracing::debug;

use crate::record::{ArticleRecord, RecordField};
use crate::registry::{ConfigurationError, PublisherProfile, RenderError, UrlTemplate};

use super::{Candidate, CandidateSet, ConstructionResult, ConstructionStrategy, describe_missing};

/// Fills the primary template, falling back to the fallback template only
/// when the primary cannot be built.
///
/// When the publisher declares `fallback_after_verification_failure`, a
/// rendered fallback rides along behind the primary so the dispatcher may
/// try it once if the primary fails verification.
#[derive(Debug, Clone)]
pub struct DirectStrategy {
    publisher_id: String,
    primary: UrlTemplate,
    fallback: Option<UrlTemplate>,
    fallback_after_verification_failure: bool,
}

impl DirectStrategy {
    /// Binds the strategy to a publisher's templates.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if the profile has no primary template.
    pub fn from_profile(profile: &PublisherProfile) -> Result<Self, ConfigurationError> {
        let primary = profile
            .primary()
            .cloned()
            .ok_or_else(|| ConfigurationError::new(profile.id(), "no primary template"))?;
        Ok(Self {
            publisher_id: profile.id().to_string(),
            primary,
            fallback: profile.fallback().cloned(),
            fallback_after_verification_failure: profile.fallback_after_verification_failure(),
        })
    }

    fn render_fallback(&self, record: &ArticleRecord) -> Option<Result<Candidate, RenderError>> {
        self.fallback.as_ref().map(|template| {
            template
                .render(record)
                .map(|url| Candidate::new(url, template.role()))
        })
    }
}

impl ConstructionStrategy for DirectStrategy {
    fn name(&self) -> &'static str {
        "direct"
    }

    #[tracing::instrument(skip(self, record), fields(publisher = %self.publisher_id, record_id = %record.record_id))]
    fn construct(&self, record: &ArticleRecord) -> ConstructionResult {
        match self.primary.render(record) {
            Ok(url) => {
                let first = Candidate::new(url, self.primary.role());
                if self.fallback_after_verification_failure
                    && let Some(Ok(fallback)) = self.render_fallback(record)
                    && fallback.url != first.url
                {
                    return ConstructionResult::Candidates(CandidateSet::with_fallback(
                        first, fallback,
                    ));
                }
                ConstructionResult::Candidates(CandidateSet::single(first))
            }
            Err(primary_error) => {
                debug!(error = ?primary_error, "Primary template unusable, trying fallback");
                let mut missing = render_error_fields(&primary_error);
                match self.render_fallback(record) {
                    Some(Ok(fallback)) => {
                        ConstructionResult::Candidates(CandidateSet::single(fallback))
                    }
                    Some(Err(fallback_error)) => {
                        for field in render_error_fields(&fallback_error) {
                            if !missing.contains(&field) {
                                missing.push(field);
                            }
                        }
                        missing_data(
                            &self.publisher_id,
                            missing,
                            &[&primary_error, &fallback_error],
                        )
                    }
                    None => missing_data(&self.publisher_id, missing, &[&primary_error]),
                }
            }
        }
    }
}

fn render_error_fields(error: &RenderError) -> Vec<RecordField> {
    match error {
        RenderError::MissingFields(fields) => fields.clone(),
        RenderError::InvalidUrl(_) => Vec::new(),
    }
}

fn missing_data(
    publisher_id: &str,
    missing: Vec<RecordField>,
    errors: &[&RenderError],
) -> ConstructionResult {
    let invalid: Vec<&str> = errors
        .iter()
        .filter_map(|error| match error {
            RenderError::InvalidUrl(url) => Some(url.as_str()),
            RenderError::MissingFields(_) => None,
        })
        .collect();

    let mut causes = Vec::with_capacity(2);
    if !missing.is_empty() {
        causes.push(describe_missing(publisher_id, &missing));
    }
    if !invalid.is_empty() {
        causes.push(format!(
            "record fields for publisher '{publisher_id}' do not form a valid URL: {}",
            invalid.join(", ")
        ));
    }
    ConstructionResult::MissingData {
        missing,
        message: causes.join("; "),
    }
}
