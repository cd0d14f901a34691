use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::record::EducationRecord;

/// Value of placeholder text fields.
pub const UNDEFINED: &str = "UNDEFINED";

pub const MIN_AGE: i32 = 18;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub email: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub nationality: String,
    pub contact: Contact,
}

impl PersonalInfo {
    /// Completed years of age on `today`.
    #[must_use]
    pub fn age_on(&self, today: NaiveDate) -> i32 {
        let dob = self.date_of_birth;
        let mut age = today.year() - dob.year();
        if (today.month(), today.day()) < (dob.month(), dob.day()) {
            age -= 1;
        }
        age
    }

    pub fn validate(&self, today: NaiveDate) -> Result<()> {
        let age = self.age_on(today);
        if age < MIN_AGE {
            return Err(Error::Underage { age });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CvDocument {
    pub personal_info: PersonalInfo,
    #[serde(default)]
    pub education: Vec<EducationRecord>,
}

impl CvDocument {
    /// Document with every field set to a recognizable placeholder; parsing
    /// starts from this and overwrites what it finds.
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            personal_info: PersonalInfo {
                full_name: UNDEFINED.to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1901, 1, 1).unwrap_or(NaiveDate::MIN),
                nationality: UNDEFINED.to_string(),
                contact: Contact {
                    email: "undefined@undefined.com".to_string(),
                    phone: "+48 123458021".to_string(),
                    address: Some(UNDEFINED.to_string()),
                },
            },
            education: Vec::new(),
        }
    }

    pub fn validate(&self, today: NaiveDate) -> Result<()> {
        self.personal_info.validate(today)
    }
}

impl Default for CvDocument {
    fn default() -> Self {
        Self::placeholder()
    }
}
