use crate::constants::COUNTRY_REGEX_PATTERN;
use crate::errors::{AppError, AppResult};
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::sync::OnceLock;

/// Cached regex for validating ISO-2 country codes.
static COUNTRY_REGEX: OnceLock<Regex> = OnceLock::new();

/// One row of the listing table.
///
/// Rows only exist for filings that publish a JSON rendition: `identifier` and `lang`
/// are derived from `json_url` and cannot be built without it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingRecord {
    /// ISO-2 country code of the filer
    pub country: String,
    /// Second path segment of `json_url`
    pub identifier: String,
    /// Opaque identifier of the filing entity
    pub entity_id: String,
    /// Two characters immediately before `.json` in `json_url`
    pub lang: String,
    /// Reporting period end, as provided by the API
    pub period_end: String,
    /// Unique filing identifier, used as the package file name
    pub filing_id: String,
    /// Relative URL of the report package, if one was published
    pub package_url: Option<String>,
    /// Relative URL of the JSON rendition
    pub json_url: String,
    /// When the API processed the filing
    pub processed: Option<String>,
}

/// A single page of `GET /api/filings`.
#[derive(Debug, Clone, Deserialize)]
pub struct FilingPage {
    pub data: Vec<FilingResource>,
    pub links: PageLinks,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageLinks {
    #[serde(rename = "self")]
    pub self_link: String,
    #[serde(default)]
    pub last: Option<String>,
    #[serde(default)]
    pub next: Option<String>,
}

impl PageLinks {
    /// A page is the last one when it points to itself as `last`, or carries no `last` link.
    pub fn is_last_page(&self) -> bool {
        self.last
            .as_deref()
            .map_or(true, |last| last == self.self_link)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilingResource {
    pub id: String,
    pub attributes: FilingAttributes,
    pub relationships: Relationships,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilingAttributes {
    pub country: String,
    pub period_end: String,
    #[serde(default)]
    pub processed: Option<String>,
    #[serde(default)]
    pub json_url: Option<String>,
    #[serde(default)]
    pub package_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Relationships {
    pub entity: EntityRelationship,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityRelationship {
    pub data: ResourceId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceId {
    pub id: String,
}

/// Validated, upper-cased ISO-2 country code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryCode(String);

impl CountryCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for CountryCode {
    type Error = AppError;

    fn try_from(value: &str) -> AppResult<Self> {
        let trimmed = value.trim();
        let regex = COUNTRY_REGEX.get_or_init(|| {
            Regex::new(COUNTRY_REGEX_PATTERN).expect("COUNTRY_REGEX_PATTERN is a valid regex")
        });

        if !regex.is_match(trimmed) {
            return Err(AppError::InvalidInput(format!(
                "'{value}' is not an ISO-2 country code"
            )));
        }

        Ok(Self(trimmed.to_uppercase()))
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
