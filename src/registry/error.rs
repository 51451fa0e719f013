//! Error types for registry lookup and catalogue loading.
//!
//! Messages follow the What/Why/Suggestion pattern used across the project.

use std::path::PathBuf;

use thiserror::Error;

use super::TemplateRole;

/// Recoverable lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No journal matched after normalization.
    #[error(
        "journal not recognized: '{journal}' (normalized '{normalized}')\n  Suggestion: Add the journal or an alias to the catalogue"
    )]
    JournalNotFound {
        /// Journal key as supplied by the caller.
        journal: String,
        /// Key after normalization.
        normalized: String,
    },
}

/// A broken catalogue discovered at resolution time.
///
/// This is not part of the failure taxonomy: it signals a programmer or
/// catalogue defect and must propagate to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("catalogue configuration error for publisher '{publisher_id}': {reason}")]
pub struct ConfigurationError {
    /// Publisher whose catalogue entry is defective.
    pub publisher_id: String,
    /// What is wrong with it.
    pub reason: String,
}

impl ConfigurationError {
    /// Creates a configuration error.
    #[must_use]
    pub fn new(publisher_id: &str, reason: impl Into<String>) -> Self {
        Self {
            publisher_id: publisher_id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors while building a template from its pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// Placeholder names a field that records do not carry.
    #[error("unknown placeholder field '{field}' in pattern '{pattern}'")]
    UnknownField { pattern: String, field: String },

    /// Placeholder transform is not supported.
    #[error("unknown transform '{transform}' in pattern '{pattern}'")]
    UnknownTransform { pattern: String, transform: String },

    /// Stray `{` or `}` outside a well-formed placeholder.
    #[error("unbalanced braces in pattern '{pattern}'")]
    UnbalancedBraces { pattern: String },

    /// Pattern does not produce an absolute http(s) URL.
    #[error("pattern '{pattern}' does not produce an absolute http(s) URL")]
    NotHttpUrl { pattern: String },
}

/// Fatal catalogue load and validation failures.
#[derive(Debug, Error)]
pub enum CatalogueError {
    /// Catalogue file could not be read.
    #[error("failed to read catalogue {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Catalogue content is not valid JSON for the expected schema.
    #[error("failed to parse catalogue: {0}")]
    Parse(#[from] serde_json::Error),

    /// A template pattern is malformed.
    #[error("publisher '{publisher_id}': {source}")]
    Template {
        publisher_id: String,
        #[source]
        source: TemplateError,
    },

    /// A publisher declares no primary template.
    #[error(
        "publisher '{publisher_id}' has no primary template\n  Suggestion: Every publisher needs exactly one template with role \"primary\""
    )]
    MissingPrimary { publisher_id: String },

    /// A publisher declares a role more than once.
    #[error(
        "publisher '{publisher_id}' declares more than one {role} template\n  Suggestion: At most one primary and one fallback template are allowed"
    )]
    DuplicateRole {
        publisher_id: String,
        role: TemplateRole,
    },

    /// Two publisher entries share an id.
    #[error("publisher '{publisher_id}' is declared twice")]
    DuplicatePublisher { publisher_id: String },

    /// A journal references a publisher that is not declared.
    #[error("journal '{journal}' references unknown publisher '{publisher_id}'")]
    UnknownPublisher {
        journal: String,
        publisher_id: String,
    },

    /// One normalized journal key maps to two publishers.
    #[error(
        "journal key '{key}' maps to both '{first}' and '{second}'\n  Suggestion: Disambiguate the journal name or alias upstream"
    )]
    ConflictingJournal {
        key: String,
        first: String,
        second: String,
    },

    /// Journal key or alias normalizes to nothing.
    #[error("journal key '{key}' is empty after normalization")]
    EmptyJournalKey { key: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_journal_not_found_message() {
        let err = RegistryError::JournalNotFound {
            journal: "J. Unknown".to_string(),
            normalized: "j unknown".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("journal not recognized"));
        assert!(msg.contains("J. Unknown"));
        assert!(msg.contains("Suggestion"));
    }

    #[test]
    fn test_configuration_error_names_publisher() {
        let err = ConfigurationError::new("p9", "no primary template");
        assert!(err.to_string().contains("'p9'"));
        assert!(err.to_string().contains("no primary template"));
    }

    #[test]
    fn test_duplicate_role_message_mentions_limit() {
        let err = CatalogueError::DuplicateRole {
            publisher_id: "p1".to_string(),
            role: TemplateRole::Fallback,
        };
        let msg = err.to_string();
        assert!(msg.contains("fallback"));
        assert!(msg.contains("At most one"));
    }
}
