//! Parameterized URL templates.
//!
//! Patterns embed `{field}` placeholders naming [`RecordField`]s, optionally
//! followed by a transform: `{doi|enc}` percent-encodes, `{doi|lower}`
//! lowercases and `{doi|suffix}` keeps the part after the registrant prefix.
//! Every placeholder field is implicitly required.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::record::{ArticleRecord, RecordField};
use crate::utils::compile_static_regex;

use super::error::TemplateError;

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"\{([a-z_]+)(?:\|([a-z]+))?\}"));

/// Position of a template within its publisher's construction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateRole {
    Primary,
    Fallback,
}

impl fmt::Display for TemplateRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transform {
    Identity,
    Encode,
    Lower,
    DoiSuffix,
}

impl Transform {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "enc" => Some(Self::Encode),
            "lower" => Some(Self::Lower),
            "suffix" => Some(Self::DoiSuffix),
            _ => None,
        }
    }

    fn apply(self, value: &str) -> Option<String> {
        match self {
            Self::Identity => Some(value.to_string()),
            Self::Encode => Some(urlencoding::encode(value).into_owned()),
            Self::Lower => Some(value.to_lowercase()),
            Self::DoiSuffix => value
                .split_once('/')
                .map(|(_, suffix)| suffix.trim())
                .filter(|suffix| !suffix.is_empty())
                .map(ToString::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder { field: RecordField, transform: Transform },
}

/// Why a template could not be rendered for a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Required fields are absent or unusable; no partial URL is produced.
    MissingFields(Vec<RecordField>),
    /// Substituted values do not form a valid URL.
    InvalidUrl(String),
}

/// A URL pattern bound to its role and required fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    role: TemplateRole,
    pattern: String,
    segments: Vec<Segment>,
    required_fields: BTreeSet<RecordField>,
}

impl UrlTemplate {
    /// Parses `pattern`; `extra_required` adds fields beyond the placeholders.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] for unknown fields or transforms, stray
    /// braces, or a pattern that is not an absolute http(s) URL.
    pub fn parse(
        role: TemplateRole,
        pattern: impl Into<String>,
        extra_required: impl IntoIterator<Item = RecordField>,
    ) -> Result<Self, TemplateError> {
        let pattern = pattern.into();
        let mut segments = Vec::new();
        let mut required_fields: BTreeSet<RecordField> = extra_required.into_iter().collect();
        let mut cursor = 0;

        for caps in PLACEHOLDER_RE.captures_iter(&pattern) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            push_literal(&mut segments, &pattern, &pattern[cursor..whole.start()])?;
            cursor = whole.end();

            let field_name = caps.get(1).map_or("", |m| m.as_str());
            let field = field_name
                .parse::<RecordField>()
                .map_err(|_| TemplateError::UnknownField {
                    pattern: pattern.clone(),
                    field: field_name.to_string(),
                })?;
            let transform = match caps.get(2) {
                None => Transform::Identity,
                Some(name) => {
                    Transform::parse(name.as_str()).ok_or_else(|| TemplateError::UnknownTransform {
                        pattern: pattern.clone(),
                        transform: name.as_str().to_string(),
                    })?
                }
            };
            required_fields.insert(field);
            segments.push(Segment::Placeholder { field, transform });
        }
        push_literal(&mut segments, &pattern, &pattern[cursor..])?;

        let template = Self {
            role,
            pattern,
            segments,
            required_fields,
        };
        template.check_url_shape()?;
        Ok(template)
    }

    #[must_use]
    pub fn role(&self) -> TemplateRole {
        self.role
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[must_use]
    pub fn required_fields(&self) -> &BTreeSet<RecordField> {
        &self.required_fields
    }

    /// Returns the required fields `record` does not supply.
    #[must_use]
    pub fn missing_fields(&self, record: &ArticleRecord) -> Vec<RecordField> {
        self.required_fields
            .iter()
            .copied()
            .filter(|field| !record.has(*field))
            .collect()
    }

    /// Substitutes record fields into the pattern.
    ///
    /// Pure: performs no I/O and never yields a partially filled URL.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::MissingFields`] if any required field is absent
    /// (or a transform cannot apply to it), and [`RenderError::InvalidUrl`]
    /// if the filled pattern does not parse as a URL.
    pub fn render(&self, record: &ArticleRecord) -> Result<String, RenderError> {
        let missing = self.missing_fields(record);
        if !missing.is_empty() {
            return Err(RenderError::MissingFields(missing));
        }
        let url = self.fill(|field| record.field(field).map(ToString::to_string))?;
        Url::parse(&url).map_err(|_| RenderError::InvalidUrl(url.clone()))?;
        Ok(url)
    }

    fn fill<F>(&self, lookup: F) -> Result<String, RenderError>
    where
        F: Fn(RecordField) -> Option<String>,
    {
        let mut out = String::with_capacity(self.pattern.len() + 32);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder { field, transform } => {
                    let value = lookup(*field)
                        .and_then(|raw| transform.apply(&raw))
                        .ok_or_else(|| RenderError::MissingFields(vec![*field]))?;
                    out.push_str(&value);
                }
            }
        }
        Ok(out)
    }

    fn check_url_shape(&self) -> Result<(), TemplateError> {
        let not_http = || TemplateError::NotHttpUrl {
            pattern: self.pattern.clone(),
        };
        let sample = self
            .fill(|_| Some("10.1/x".to_string()))
            .map_err(|_| not_http())?;
        let url = Url::parse(&sample).map_err(|_| not_http())?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(not_http());
        }
        Ok(())
    }
}

fn push_literal(segments: &mut Vec<Segment>, pattern: &str, text: &str) -> Result<(), TemplateError> {
    if text.contains('{') || text.contains('}') {
        return Err(TemplateError::UnbalancedBraces {
            pattern: pattern.to_string(),
        });
    }
    if !text.is_empty() {
        segments.push(Segment::Literal(text.to_string()));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn primary(pattern: &str) -> UrlTemplate {
        UrlTemplate::parse(TemplateRole::Primary, pattern, []).unwrap()
    }

    #[test]
    fn test_render_substitutes_doi_verbatim() {
        let template = primary("https://p1.example/{doi}");
        let record = ArticleRecord::new("r1").with_doi("10.1/x");
        assert_eq!(template.render(&record).unwrap(), "https://p1.example/10.1/x");
    }

    #[test]
    fn test_placeholders_become_required_fields() {
        let template = primary("https://p.example/{volume}/{issue}/{first_page}");
        let fields: Vec<_> = template.required_fields().iter().copied().collect();
        assert_eq!(
            fields,
            vec![RecordField::Volume, RecordField::Issue, RecordField::FirstPage]
        );
    }

    #[test]
    fn test_render_reports_every_missing_field_without_partial_url() {
        let template = primary("https://p.example/{volume}/{issue}/{first_page}");
        let record = ArticleRecord::new("r1").with_volume("3");
        assert_eq!(
            template.render(&record),
            Err(RenderError::MissingFields(vec![
                RecordField::Issue,
                RecordField::FirstPage
            ]))
        );
    }

    #[test]
    fn test_extra_required_fields_are_enforced() {
        let template = UrlTemplate::parse(
            TemplateRole::Fallback,
            "https://p.example/search?q={record_id}",
            [RecordField::Journal],
        )
        .unwrap();
        let record = ArticleRecord::new("r1");
        assert_eq!(
            template.render(&record),
            Err(RenderError::MissingFields(vec![RecordField::Journal]))
        );
    }

    #[test]
    fn test_transforms() {
        let record = ArticleRecord::new("r1").with_doi("10.1016/S0140-6736(20)30183-5");
        assert_eq!(
            primary("https://p.example/pdf/{doi|suffix}").render(&record).unwrap(),
            "https://p.example/pdf/S0140-6736(20)30183-5"
        );
        assert_eq!(
            primary("https://p.example/{doi|lower}").render(&record).unwrap(),
            "https://p.example/10.1016/s0140-6736(20)30183-5"
        );
        assert_eq!(
            primary("https://p.example/?doi={doi|enc}").render(&record).unwrap(),
            "https://p.example/?doi=10.1016%2FS0140-6736%2820%2930183-5"
        );
    }

    #[test]
    fn test_doi_suffix_without_slash_counts_as_missing() {
        let record = ArticleRecord::new("r1").with_doi("not-a-doi");
        assert_eq!(
            primary("https://p.example/{doi|suffix}").render(&record),
            Err(RenderError::MissingFields(vec![RecordField::Doi]))
        );
    }

    #[test]
    fn test_parse_rejects_unknown_field_and_transform() {
        assert!(matches!(
            UrlTemplate::parse(TemplateRole::Primary, "https://p.example/{pages}", []),
            Err(TemplateError::UnknownField { .. })
        ));
        assert!(matches!(
            UrlTemplate::parse(TemplateRole::Primary, "https://p.example/{doi|upper}", []),
            Err(TemplateError::UnknownTransform { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_stray_braces_and_non_http() {
        assert!(matches!(
            UrlTemplate::parse(TemplateRole::Primary, "https://p.example/{doi", []),
            Err(TemplateError::UnbalancedBraces { .. })
        ));
        assert!(matches!(
            UrlTemplate::parse(TemplateRole::Primary, "ftp://p.example/{doi}", []),
            Err(TemplateError::NotHttpUrl { .. })
        ));
        assert!(matches!(
            UrlTemplate::parse(TemplateRole::Primary, "/relative/{doi}", []),
            Err(TemplateError::NotHttpUrl { .. })
        ));
    }

    #[test]
    fn test_host_placeholder_rendering_invalid_value_is_invalid_url() {
        let template = primary("https://{journal}.example/{doi}");
        let record = ArticleRecord::new("r1")
            .with_journal("bad host")
            .with_doi("10.1/x");
        assert!(matches!(
            template.render(&record),
            Err(RenderError::InvalidUrl(_))
        ));
    }
}
