//! Journal → publisher → URL template registry.
//!
//! The [`Registry`] is built once from a validated catalogue and is
//! immutable afterwards, so it can be shared (`Arc<Registry>`) across any
//! number of concurrent resolutions without locking.
//!
//! # Example
//!
//! ```
//! use doclink_core::registry::Registry;
//!
//! let registry = Registry::from_json_str(r#"{
//!     "publishers": [{"id": "p1", "templates": [
//!         {"role": "primary", "pattern": "https://p1.example/{doi}"}
//!     ]}],
//!     "journals": [{"key": "Journal One", "publisher": "p1", "aliases": ["J. One"]}]
//! }"#).unwrap();
//!
//! let entry = registry.lookup("j one").unwrap();
//! assert_eq!(entry.publisher_id, "p1");
//! ```

mod catalogue;
mod error;
mod template;

pub use catalogue::{Catalogue, JournalSpec, PublisherSpec, TemplateSpec};
pub use error::{CatalogueError, ConfigurationError, RegistryError, TemplateError};
pub use template::{RenderError, TemplateRole, UrlTemplate};

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// How a publisher ultimately delivers documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Plain GET on a constructed URL.
    #[default]
    Direct,
    /// Document is released only after a stateful form POST.
    FormPost,
    /// Document requires an established session cookie.
    SessionOnly,
}

/// Result of a successful journal lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    /// Journal key after normalization.
    pub journal_key: String,
    /// Publisher owning the journal.
    pub publisher_id: String,
}

/// Everything the registry knows about one publisher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublisherProfile {
    id: String,
    name: Option<String>,
    delivery: DeliveryMode,
    fallback_after_verification_failure: bool,
    templates: Vec<UrlTemplate>,
}

impl PublisherProfile {
    /// Creates a profile with direct delivery and no templates.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            delivery: DeliveryMode::Direct,
            fallback_after_verification_failure: false,
            templates: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_delivery(mut self, delivery: DeliveryMode) -> Self {
        self.delivery = delivery;
        self
    }

    /// Declares that the fallback candidate may be tried after the primary
    /// fails verification, not only when primary fields are missing.
    #[must_use]
    pub fn with_fallback_after_verification_failure(mut self, enabled: bool) -> Self {
        self.fallback_after_verification_failure = enabled;
        self
    }

    #[must_use]
    pub fn with_template(mut self, template: UrlTemplate) -> Self {
        self.templates.push(template);
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn delivery(&self) -> DeliveryMode {
        self.delivery
    }

    #[must_use]
    pub fn fallback_after_verification_failure(&self) -> bool {
        self.fallback_after_verification_failure
    }

    /// Templates in catalogue order.
    #[must_use]
    pub fn templates(&self) -> &[UrlTemplate] {
        &self.templates
    }

    /// The primary template, if declared.
    #[must_use]
    pub fn primary(&self) -> Option<&UrlTemplate> {
        self.template_for(TemplateRole::Primary)
    }

    /// The fallback template, if declared.
    #[must_use]
    pub fn fallback(&self) -> Option<&UrlTemplate> {
        self.template_for(TemplateRole::Fallback)
    }

    fn template_for(&self, role: TemplateRole) -> Option<&UrlTemplate> {
        self.templates.iter().find(|t| t.role() == role)
    }

    fn validate(&self) -> Result<(), CatalogueError> {
        for role in [TemplateRole::Primary, TemplateRole::Fallback] {
            if self.templates.iter().filter(|t| t.role() == role).count() > 1 {
                return Err(CatalogueError::DuplicateRole {
                    publisher_id: self.id.clone(),
                    role,
                });
            }
        }
        if self.primary().is_none() {
            return Err(CatalogueError::MissingPrimary {
                publisher_id: self.id.clone(),
            });
        }
        Ok(())
    }
}

/// Immutable journal and publisher catalogue.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    journals: HashMap<String, String>,
    publishers: HashMap<String, PublisherProfile>,
}

impl Registry {
    /// Starts a programmatic registry build.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Builds a registry from a deserialized catalogue.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogueError`] if any catalogue integrity rule is broken.
    pub fn from_catalogue(catalogue: Catalogue) -> Result<Self, CatalogueError> {
        catalogue.into_builder()?.build()
    }

    /// Parses and validates a JSON catalogue.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogueError::Parse`] for malformed JSON and any
    /// validation error from [`Registry::from_catalogue`].
    pub fn from_json_str(raw: &str) -> Result<Self, CatalogueError> {
        let catalogue: Catalogue = serde_json::from_str(raw)?;
        Self::from_catalogue(catalogue)
    }

    /// Reads, parses and validates a JSON catalogue file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogueError::Io`] if the file cannot be read, plus any
    /// error from [`Registry::from_json_str`].
    #[tracing::instrument(fields(path = %path.display()))]
    pub fn load_json_file(path: &Path) -> Result<Self, CatalogueError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogueError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::from_json_str(&raw)?;
        info!(
            journals = registry.journal_count(),
            publishers = registry.publisher_count(),
            "Catalogue loaded"
        );
        Ok(registry)
    }

    /// Looks up the publisher for a journal name, abbreviation or alias.
    ///
    /// Matching is exact after [`normalize_journal_key`]; there is no fuzzy
    /// matching.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::JournalNotFound`] when nothing matches.
    pub fn lookup(&self, journal_key: &str) -> Result<RegistryEntry, RegistryError> {
        let normalized = normalize_journal_key(journal_key);
        match self.journals.get(&normalized) {
            Some(publisher_id) => Ok(RegistryEntry {
                journal_key: normalized,
                publisher_id: publisher_id.clone(),
            }),
            None => Err(RegistryError::JournalNotFound {
                journal: journal_key.to_string(),
                normalized,
            }),
        }
    }

    /// Returns the publisher's profile.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if the publisher is unknown or has no
    /// primary template.
    pub fn publisher(&self, publisher_id: &str) -> Result<&PublisherProfile, ConfigurationError> {
        let profile = self
            .publishers
            .get(publisher_id)
            .ok_or_else(|| ConfigurationError::new(publisher_id, "publisher is not in the catalogue"))?;
        if profile.primary().is_none() {
            return Err(ConfigurationError::new(publisher_id, "no primary template"));
        }
        Ok(profile)
    }

    /// Returns the publisher's templates in catalogue order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] under the same conditions as
    /// [`Registry::publisher`].
    pub fn templates_for(&self, publisher_id: &str) -> Result<&[UrlTemplate], ConfigurationError> {
        self.publisher(publisher_id).map(PublisherProfile::templates)
    }

    /// Number of distinct normalized journal keys (aliases included).
    #[must_use]
    pub fn journal_count(&self) -> usize {
        self.journals.len()
    }

    #[must_use]
    pub fn publisher_count(&self) -> usize {
        self.publishers.len()
    }

    /// Publisher ids in sorted order.
    #[must_use]
    pub fn publisher_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.publishers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

/// Incremental, validating registry constructor.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    publishers: Vec<PublisherProfile>,
    journals: Vec<(String, String)>,
}

impl RegistryBuilder {
    #[must_use]
    pub fn publisher(mut self, profile: PublisherProfile) -> Self {
        self.publishers.push(profile);
        self
    }

    /// Maps a journal key (or alias) to a publisher.
    #[must_use]
    pub fn journal(mut self, key: impl Into<String>, publisher_id: impl Into<String>) -> Self {
        self.journals.push((key.into(), publisher_id.into()));
        self
    }

    /// Validates and freezes the registry.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogueError`] on duplicate publishers, missing or
    /// duplicated template roles, unknown publisher references, empty keys,
    /// or a journal key claimed by two publishers.
    pub fn build(self) -> Result<Registry, CatalogueError> {
        let mut publishers = HashMap::with_capacity(self.publishers.len());
        for profile in self.publishers {
            profile.validate()?;
            match publishers.entry(profile.id.clone()) {
                Entry::Occupied(_) => {
                    return Err(CatalogueError::DuplicatePublisher {
                        publisher_id: profile.id,
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(profile);
                }
            }
        }

        let mut journals: HashMap<String, String> = HashMap::with_capacity(self.journals.len());
        for (key, publisher_id) in self.journals {
            if !publishers.contains_key(&publisher_id) {
                return Err(CatalogueError::UnknownPublisher {
                    journal: key,
                    publisher_id,
                });
            }
            let normalized = normalize_journal_key(&key);
            if normalized.is_empty() {
                return Err(CatalogueError::EmptyJournalKey { key });
            }
            match journals.entry(normalized) {
                Entry::Occupied(existing) if existing.get() != &publisher_id => {
                    return Err(CatalogueError::ConflictingJournal {
                        key: existing.key().clone(),
                        first: existing.get().clone(),
                        second: publisher_id,
                    });
                }
                Entry::Occupied(_) => {}
                Entry::Vacant(slot) => {
                    debug!(journal = %slot.key(), publisher = %publisher_id, "Registering journal");
                    slot.insert(publisher_id);
                }
            }
        }

        Ok(Registry {
            journals,
            publishers,
        })
    }
}

/// Normalizes a journal name for exact-match lookup.
///
/// Lowercases, spells `&` as `and`, turns punctuation into spaces and
/// collapses whitespace, so `"J. Chem. Phys."` and `"j chem phys"` agree.
#[must_use]
pub fn normalize_journal_key(raw: &str) -> String {
    let spaced: String = raw
        .replace('&', " and ")
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .flat_map(char::to_lowercase)
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}
