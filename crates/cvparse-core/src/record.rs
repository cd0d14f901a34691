use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Placeholder for a text field that could not be resolved.
pub const UNKNOWN: &str = "UNKNOWN";

/// Start date of a record whose start could not be resolved (1970-01-01).
#[must_use]
pub fn epoch_placeholder() -> NaiveDate {
    NaiveDate::default()
}

#[must_use]
pub fn is_unknown(value: &str) -> bool {
    value.is_empty() || value == UNKNOWN
}

/// Record under construction by the assembler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EducationDraft {
    pub institution: Option<String>,
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Start copied from the previous record's end; confirmed or replaced by
    /// the next date in the same year.
    pub(crate) start_inherited: bool,
}

impl EducationDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Degree known and end date set.
    #[must_use]
    pub const fn is_closing(&self) -> bool {
        self.degree.is_some() && self.end_date.is_some()
    }

    /// Closing with a real start date.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.is_closing() && self.start_date.is_some()
    }

    /// A new draft for the same institution and programme.
    #[must_use]
    pub fn follow_up(&self) -> Self {
        Self {
            institution: self.institution.clone(),
            field_of_study: self.field_of_study.clone(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn into_record(self) -> EducationRecord {
        EducationRecord {
            degree: self.degree.unwrap_or_else(|| UNKNOWN.to_string()),
            institution: self.institution.unwrap_or_else(|| UNKNOWN.to_string()),
            field_of_study: self.field_of_study.unwrap_or_else(|| UNKNOWN.to_string()),
            start_date: self.start_date.unwrap_or_else(epoch_placeholder),
            end_date: self.end_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EducationRecord {
    pub degree: String,
    pub institution: String,
    pub field_of_study: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl EducationRecord {
    #[must_use]
    pub fn new(institution: impl Into<String>) -> Self {
        Self {
            degree: UNKNOWN.to_string(),
            institution: institution.into(),
            field_of_study: UNKNOWN.to_string(),
            start_date: epoch_placeholder(),
            end_date: None,
        }
    }

    #[must_use]
    pub fn with_degree(mut self, degree: impl Into<String>) -> Self {
        self.degree = degree.into();
        self
    }

    #[must_use]
    pub fn with_field_of_study(mut self, field: impl Into<String>) -> Self {
        self.field_of_study = field.into();
        self
    }

    #[must_use]
    pub fn with_dates(mut self, start: NaiveDate, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    /// Start date, or `None` for the epoch placeholder.
    #[must_use]
    pub fn known_start(&self) -> Option<NaiveDate> {
        (self.start_date != epoch_placeholder()).then_some(self.start_date)
    }

    pub fn has_institution(&self) -> bool {
        !is_unknown(&self.institution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_draft_into_record_defaults() {
        let record = EducationDraft::new().into_record();

        assert_eq!(record.institution, UNKNOWN);
        assert_eq!(record.degree, UNKNOWN);
        assert_eq!(record.field_of_study, UNKNOWN);
        assert_eq!(record.start_date, date(1970, 1, 1));
        assert_eq!(record.end_date, None);
        assert_eq!(record.known_start(), None);
    }

    #[test]
    fn test_draft_completeness() {
        let mut draft = EducationDraft::new();
        draft.degree = Some("magister".into());
        assert!(!draft.is_closing());

        draft.end_date = Some(date(2015, 6, 30));
        assert!(draft.is_closing());
        assert!(!draft.is_complete());

        draft.start_date = Some(date(2013, 10, 1));
        assert!(draft.is_complete());
    }

    #[test]
    fn test_follow_up_keeps_institution_and_field() {
        let draft = EducationDraft {
            institution: Some("Uniwersytet Warszawski".into()),
            degree: Some("Licencjat".into()),
            field_of_study: Some("Ekonomia".into()),
            start_date: Some(date(2010, 1, 1)),
            end_date: Some(date(2013, 12, 31)),
            start_inherited: false,
        };

        let next = draft.follow_up();

        assert_eq!(next.institution.as_deref(), Some("Uniwersytet Warszawski"));
        assert_eq!(next.field_of_study.as_deref(), Some("Ekonomia"));
        assert!(next.degree.is_none());
        assert!(next.start_date.is_none());
    }

    #[test]
    fn test_record_serialization() {
        let record = EducationRecord::new("Politechnika Gdańska")
            .with_degree("inżynier")
            .with_dates(date(2012, 10, 1), None);

        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["institution"], "Politechnika Gdańska");
        assert_eq!(json["field_of_study"], "UNKNOWN");
        assert_eq!(json["start_date"], "2012-10-01");
        assert!(json["end_date"].is_null());
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(epoch_placeholder(), date(1970, 1, 1));
        assert!(is_unknown(UNKNOWN));
        assert!(is_unknown(""));
        assert!(!is_unknown("Liceum"));
    }
}
