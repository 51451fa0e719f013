//! Structured bibliographic input consumed by construction strategies.
//!
//! An [`ArticleRecord`] is produced upstream (by whatever parses source
//! citations) and arrives here already structured. Only the record
//! identifier is guaranteed; every other field may be absent, and a field
//! holding only whitespace is treated the same as a missing one.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Immutable bibliographic record to resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Caller-side identifier (accession number or similar). Always present.
    pub record_id: String,
    /// Journal name, abbreviation, or ISSN used for registry lookup.
    #[serde(default, alias = "journal_key")]
    pub journal: Option<String>,
    /// Digital Object Identifier, without any `https://doi.org/` prefix.
    #[serde(default)]
    pub doi: Option<String>,
    /// Volume number.
    #[serde(default)]
    pub volume: Option<String>,
    /// Issue number.
    #[serde(default)]
    pub issue: Option<String>,
    /// First page of the article.
    #[serde(default)]
    pub first_page: Option<String>,
    /// Publisher-assigned item identifier (PII, article number, ...).
    #[serde(default)]
    pub item_id: Option<String>,
}

impl ArticleRecord {
    /// Creates a record carrying only its identifier.
    #[must_use]
    pub fn new(record_id: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            journal: None,
            doi: None,
            volume: None,
            issue: None,
            first_page: None,
            item_id: None,
        }
    }

    /// Sets the journal name.
    #[must_use]
    pub fn with_journal(mut self, journal: impl Into<String>) -> Self {
        self.journal = Some(journal.into());
        self
    }

    /// Sets the DOI.
    #[must_use]
    pub fn with_doi(mut self, doi: impl Into<String>) -> Self {
        self.doi = Some(doi.into());
        self
    }

    /// Sets the volume.
    #[must_use]
    pub fn with_volume(mut self, volume: impl Into<String>) -> Self {
        self.volume = Some(volume.into());
        self
    }

    /// Sets the issue.
    #[must_use]
    pub fn with_issue(mut self, issue: impl Into<String>) -> Self {
        self.issue = Some(issue.into());
        self
    }

    /// Sets the first page.
    #[must_use]
    pub fn with_first_page(mut self, first_page: impl Into<String>) -> Self {
        self.first_page = Some(first_page.into());
        self
    }

    /// Sets the publisher item identifier.
    #[must_use]
    pub fn with_item_id(mut self, item_id: impl Into<String>) -> Self {
        self.item_id = Some(item_id.into());
        self
    }

    /// Returns the trimmed value of `field`, or `None` when absent or blank.
    #[must_use]
    pub fn field(&self, field: RecordField) -> Option<&str> {
        let raw = match field {
            RecordField::RecordId => Some(self.record_id.as_str()),
            RecordField::Journal => self.journal.as_deref(),
            RecordField::Doi => self.doi.as_deref(),
            RecordField::Volume => self.volume.as_deref(),
            RecordField::Issue => self.issue.as_deref(),
            RecordField::FirstPage => self.first_page.as_deref(),
            RecordField::ItemId => self.item_id.as_deref(),
        };
        raw.map(str::trim).filter(|value| !value.is_empty())
    }

    /// Returns true if `field` holds a non-blank value.
    #[must_use]
    pub fn has(&self, field: RecordField) -> bool {
        self.field(field).is_some()
    }
}

/// Named fields of an [`ArticleRecord`] that templates may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    RecordId,
    Journal,
    Doi,
    Volume,
    Issue,
    FirstPage,
    ItemId,
}

impl RecordField {
    /// All fields, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::RecordId,
        Self::Journal,
        Self::Doi,
        Self::Volume,
        Self::Issue,
        Self::FirstPage,
        Self::ItemId,
    ];

    /// Returns the stable snake_case name used in catalogues and templates.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RecordId => "record_id",
            Self::Journal => "journal",
            Self::Doi => "doi",
            Self::Volume => "volume",
            Self::Issue => "issue",
            Self::FirstPage => "first_page",
            Self::ItemId => "item_id",
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordField {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == value)
            .ok_or_else(|| format!("unknown record field '{value}'"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_field_blank_values_are_absent() {
        let record = ArticleRecord::new("acc-1").with_doi("   ").with_volume(" 12 ");
        assert_eq!(record.field(RecordField::Doi), None);
        assert_eq!(record.field(RecordField::Volume), Some("12"));
        assert!(!record.has(RecordField::Issue));
    }

    #[test]
    fn test_record_id_always_available() {
        let record = ArticleRecord::new("acc-42");
        assert_eq!(record.field(RecordField::RecordId), Some("acc-42"));
    }

    #[test]
    fn test_record_field_from_str_roundtrips_names() {
        for field in RecordField::ALL {
            assert_eq!(field.as_str().parse::<RecordField>().unwrap(), field);
        }
        assert!("pages".parse::<RecordField>().is_err());
    }

    #[test]
    fn test_record_deserializes_with_missing_optionals() {
        let record: ArticleRecord =
            serde_json::from_str(r#"{"record_id":"r1","journal_key":"Nature"}"#).unwrap();
        assert_eq!(record.journal.as_deref(), Some("Nature"));
        assert!(record.doi.is_none());
    }
}
