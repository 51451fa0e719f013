//! Strategy for publishers whose documents cannot be fetched by URL alone.

use crate::record::ArticleRecord;
use crate::registry::{ConfigurationError, DeliveryMode, PublisherProfile, UrlTemplate};

use super::{ConstructionResult, ConstructionStrategy, describe_missing};

/// Reports architectural incompatibility with the best human-navigable page.
///
/// The primary template names the article landing page; the fallback, if
/// any, an alternate page used when the primary's fields are missing. The
/// strategy never approximates a form POST or session flow with a GET.
#[derive(Debug, Clone)]
pub struct GatedStrategy {
    publisher_id: String,
    delivery: DeliveryMode,
    landing: UrlTemplate,
    alternate: Option<UrlTemplate>,
}

impl GatedStrategy {
    /// Binds the strategy to a publisher's landing-page templates.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if the profile has no primary template.
    pub fn from_profile(profile: &PublisherProfile) -> Result<Self, ConfigurationError> {
        let landing = profile
            .primary()
            .cloned()
            .ok_or_else(|| ConfigurationError::new(profile.id(), "no primary template"))?;
        Ok(Self {
            publisher_id: profile.id().to_string(),
            delivery: profile.delivery(),
            landing,
            alternate: profile.fallback().cloned(),
        })
    }

    fn reason(&self) -> String {
        let mechanism = match self.delivery {
            DeliveryMode::SessionOnly => "requires an established browser session",
            DeliveryMode::FormPost | DeliveryMode::Direct => "requires a stateful form submission",
        };
        format!(
            "publisher '{}' {mechanism}; documents have no direct URL",
            self.publisher_id
        )
    }
}

impl ConstructionStrategy for GatedStrategy {
    fn name(&self) -> &'static str {
        "gated"
    }

    #[tracing::instrument(skip(self, record), fields(publisher = %self.publisher_id, record_id = %record.record_id))]
    fn construct(&self, record: &ArticleRecord) -> ConstructionResult {
        let page = self.landing.render(record).or_else(|primary_error| {
            self.alternate
                .as_ref()
                .map_or(Err(primary_error), |template| template.render(record))
        });
        match page {
            Ok(page_url) => ConstructionResult::ArchitecturalIncompatibility {
                page_url,
                reason: self.reason(),
            },
            Err(_) => {
                let mut missing = self.landing.missing_fields(record);
                if let Some(alternate) = &self.alternate {
                    for field in alternate.missing_fields(record) {
                        if !missing.contains(&field) {
                            missing.push(field);
                        }
                    }
                }
                let message = describe_missing(&self.publisher_id, &missing);
                ConstructionResult::MissingData { missing, message }
            }
        }
    }
}
