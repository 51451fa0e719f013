//! Serde model of the on-disk catalogue.
//!
//! ```json
//! {
//!   "publishers": [{
//!     "id": "acme",
//!     "delivery": "direct",
//!     "fallback_after_verification_failure": true,
//!     "templates": [
//!       {"role": "primary", "pattern": "https://acme.example/pdf/{doi}"},
//!       {"role": "fallback", "pattern": "https://acme.example/v{volume}/p{first_page}.pdf"}
//!     ]
//!   }],
//!   "journals": [{"key": "Acme Letters", "publisher": "acme", "aliases": ["Acme Lett."]}]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::record::RecordField;

use super::{
    CatalogueError, DeliveryMode, PublisherProfile, RegistryBuilder, TemplateRole, UrlTemplate,
};

/// Top-level catalogue document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Catalogue {
    #[serde(default)]
    pub publishers: Vec<PublisherSpec>,
    #[serde(default)]
    pub journals: Vec<JournalSpec>,
}

/// One publisher and its URL templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublisherSpec {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub delivery: DeliveryMode,
    #[serde(default)]
    pub fallback_after_verification_failure: bool,
    pub templates: Vec<TemplateSpec>,
}

/// One URL template as written in the catalogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateSpec {
    pub role: TemplateRole,
    pub pattern: String,
    #[serde(default)]
    pub required_fields: Vec<RecordField>,
}

/// One journal with optional alternate names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JournalSpec {
    pub key: String,
    pub publisher: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl Catalogue {
    /// Converts the document into a registry builder, parsing every template.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogueError::Template`] for the first malformed pattern.
    pub fn into_builder(self) -> Result<RegistryBuilder, CatalogueError> {
        let mut builder = RegistryBuilder::default();

        for spec in self.publishers {
            let mut profile = PublisherProfile::new(spec.id.clone())
                .with_delivery(spec.delivery)
                .with_fallback_after_verification_failure(spec.fallback_after_verification_failure);
            if let Some(name) = spec.name {
                profile = profile.with_name(name);
            }
            for template in spec.templates {
                let parsed =
                    UrlTemplate::parse(template.role, template.pattern, template.required_fields)
                        .map_err(|source| CatalogueError::Template {
                            publisher_id: spec.id.clone(),
                            source,
                        })?;
                profile = profile.with_template(parsed);
            }
            builder = builder.publisher(profile);
        }

        for journal in self.journals {
            for alias in journal.aliases {
                builder = builder.journal(alias, journal.publisher.clone());
            }
            builder = builder.journal(journal.key, journal.publisher);
        }

        Ok(builder)
    }
}
