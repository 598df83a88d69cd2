//! Search criteria for the insolvency publicity search form.
//!
//! [`CriteriaInput`] is the loose shape a caller fills in (CLI flags, a
//! config file, a test). [`CriteriaInput::validate`] turns it into an
//! immutable [`SearchCriteria`], rejecting inputs the portal would reject
//! before any browser work starts.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Date format the portal's calendar inputs accept.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Errors raised while validating search criteria.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CriteriaError {
    /// Neither a tax id nor an entity name was given.
    #[error("a tax id (NIF/NIPC) or an entity name (designação) is required")]
    MissingSubject,

    /// Both a tax id and an entity name were given.
    #[error("tax id and entity name are mutually exclusive")]
    ConflictingSubject,

    /// A date did not match `DD-MM-YYYY`.
    #[error("invalid {field} '{value}', expected DD-MM-YYYY")]
    InvalidDate {
        /// Which input was malformed.
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// The start date falls after the end date.
    #[error("start date {start} is after end date {end}")]
    InvertedRange {
        /// Start date as given.
        start: String,
        /// End date as given.
        end: String,
    },
}

/// Publication window filter offered by the search form.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum DaysFilter {
    /// Last 15 days.
    #[strum(serialize = "15")]
    #[serde(rename = "15")]
    Last15,
    /// Last 30 days.
    #[strum(serialize = "30")]
    #[serde(rename = "30")]
    Last30,
    /// No window.
    #[default]
    #[strum(serialize = "todos")]
    #[serde(rename = "todos")]
    All,
}

/// Which court set to search.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum CourtSet {
    /// Courts of the current judicial map ("Nova Estrutura Judiciária").
    #[strum(serialize = "nova")]
    #[serde(rename = "nova")]
    NewStructure,
    /// Courts abolished by the judicial reorganisation ("Tribunais Extintos").
    #[strum(serialize = "extintos")]
    #[serde(rename = "extintos")]
    Extinct,
}

/// What the search is keyed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchSubject {
    /// NIF/NIPC.
    TaxId(String),
    /// Entity name ("designação").
    EntityName(String),
}

impl SearchSubject {
    /// The text typed into the search box.
    #[must_use]
    pub fn query(&self) -> &str {
        match self {
            Self::TaxId(v) | Self::EntityName(v) => v,
        }
    }
}

/// Unvalidated search input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriteriaInput {
    /// NIF/NIPC.
    pub tax_id: Option<String>,
    /// Entity name.
    pub entity_name: Option<String>,
    /// First publication date, `DD-MM-YYYY`.
    pub start_date: Option<String>,
    /// Last publication date, `DD-MM-YYYY`.
    pub end_date: Option<String>,
    /// Court set filter.
    pub court: Option<CourtSet>,
    /// Act group, by its visible label.
    pub act_group: Option<String>,
    /// Specific act, by its visible label.
    pub act: Option<String>,
    /// Publication window.
    pub days: DaysFilter,
}

impl CriteriaInput {
    /// Validates the input.
    ///
    /// Blank strings count as absent.
    ///
    /// # Errors
    ///
    /// * [`CriteriaError::MissingSubject`] / [`CriteriaError::ConflictingSubject`]
    ///   unless exactly one of tax id and entity name is set
    /// * [`CriteriaError::InvalidDate`] for a date not in `DD-MM-YYYY`
    /// * [`CriteriaError::InvertedRange`] when start is after end
    pub fn validate(self) -> Result<SearchCriteria, CriteriaError> {
        let subject = match (non_blank(self.tax_id), non_blank(self.entity_name)) {
            (Some(tax_id), None) => SearchSubject::TaxId(tax_id),
            (None, Some(name)) => SearchSubject::EntityName(name),
            (Some(_), Some(_)) => return Err(CriteriaError::ConflictingSubject),
            (None, None) => return Err(CriteriaError::MissingSubject),
        };

        let start_date = non_blank(self.start_date);
        let end_date = non_blank(self.end_date);
        let start = start_date
            .as_deref()
            .map(|s| parse_date("start date", s))
            .transpose()?;
        let end = end_date
            .as_deref()
            .map(|s| parse_date("end date", s))
            .transpose()?;

        if let (Some(s), Some(e)) = (start, end)
            && s > e
        {
            return Err(CriteriaError::InvertedRange {
                start: start_date.unwrap_or_default(),
                end: end_date.unwrap_or_default(),
            });
        }

        Ok(SearchCriteria {
            subject,
            start_date,
            end_date,
            court: self.court,
            act_group: non_blank(self.act_group),
            act: non_blank(self.act),
            days: self.days,
        })
    }
}

/// Validated, immutable search criteria.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    subject: SearchSubject,
    start_date: Option<String>,
    end_date: Option<String>,
    court: Option<CourtSet>,
    act_group: Option<String>,
    act: Option<String>,
    days: DaysFilter,
}

impl SearchCriteria {
    /// Tax id or entity name.
    #[must_use]
    pub const fn subject(&self) -> &SearchSubject {
        &self.subject
    }

    /// Start date, `DD-MM-YYYY`.
    #[must_use]
    pub fn start_date(&self) -> Option<&str> {
        self.start_date.as_deref()
    }

    /// End date, `DD-MM-YYYY`.
    #[must_use]
    pub fn end_date(&self) -> Option<&str> {
        self.end_date.as_deref()
    }

    /// Court set filter.
    #[must_use]
    pub const fn court(&self) -> Option<CourtSet> {
        self.court
    }

    /// Act group label.
    #[must_use]
    pub fn act_group(&self) -> Option<&str> {
        self.act_group.as_deref()
    }

    /// Act label.
    #[must_use]
    pub fn act(&self) -> Option<&str> {
        self.act.as_deref()
    }

    /// Publication window.
    #[must_use]
    pub const fn days(&self) -> DaysFilter {
        self.days
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, CriteriaError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| CriteriaError::InvalidDate {
        field,
        value: value.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn by_tax_id() -> CriteriaInput {
        CriteriaInput {
            tax_id: Some("503504564".to_owned()),
            ..CriteriaInput::default()
        }
    }

    #[test]
    fn accepts_tax_id_only() {
        let criteria = by_tax_id().validate().unwrap();
        assert_eq!(
            criteria.subject(),
            &SearchSubject::TaxId("503504564".to_owned())
        );
        assert_eq!(criteria.days(), DaysFilter::All);
    }

    #[test]
    fn accepts_entity_name_only() {
        let input = CriteriaInput {
            entity_name: Some("  Empresa XYZ, Lda ".to_owned()),
            ..CriteriaInput::default()
        };
        let criteria = input.validate().unwrap();
        assert_eq!(criteria.subject().query(), "Empresa XYZ, Lda");
    }

    #[test]
    fn rejects_neither_subject() {
        assert_eq!(
            CriteriaInput::default().validate(),
            Err(CriteriaError::MissingSubject)
        );
    }

    #[test]
    fn blank_subject_counts_as_missing() {
        let input = CriteriaInput {
            tax_id: Some("   ".to_owned()),
            ..CriteriaInput::default()
        };
        assert_eq!(input.validate(), Err(CriteriaError::MissingSubject));
    }

    #[test]
    fn rejects_both_subjects() {
        let input = CriteriaInput {
            entity_name: Some("Empresa XYZ".to_owned()),
            ..by_tax_id()
        };
        assert_eq!(input.validate(), Err(CriteriaError::ConflictingSubject));
    }

    #[test]
    fn rejects_malformed_date() {
        let input = CriteriaInput {
            start_date: Some("2025-01-01".to_owned()),
            ..by_tax_id()
        };
        assert!(matches!(
            input.validate(),
            Err(CriteriaError::InvalidDate { field: "start date", .. })
        ));
    }

    #[test]
    fn rejects_inverted_range() {
        let input = CriteriaInput {
            start_date: Some("31-01-2025".to_owned()),
            end_date: Some("01-01-2025".to_owned()),
            ..by_tax_id()
        };
        assert!(matches!(
            input.validate(),
            Err(CriteriaError::InvertedRange { .. })
        ));
    }

    #[test]
    fn keeps_dates_as_typed() {
        let input = CriteriaInput {
            start_date: Some("01-01-2025".to_owned()),
            end_date: Some("31-01-2025".to_owned()),
            court: Some(CourtSet::Extinct),
            ..by_tax_id()
        };
        let criteria = input.validate().unwrap();
        assert_eq!(criteria.start_date(), Some("01-01-2025"));
        assert_eq!(criteria.end_date(), Some("31-01-2025"));
        assert_eq!(criteria.court(), Some(CourtSet::Extinct));
    }

    #[test]
    fn parses_filter_names() {
        assert_eq!(DaysFilter::from_str("15").unwrap(), DaysFilter::Last15);
        assert_eq!(DaysFilter::from_str("todos").unwrap(), DaysFilter::All);
        assert_eq!(CourtSet::from_str("extintos").unwrap(), CourtSet::Extinct);
        assert_eq!(CourtSet::NewStructure.to_string(), "nova");
        assert!(DaysFilter::from_str("60").is_err());
    }
}
