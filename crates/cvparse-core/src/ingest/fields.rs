//! Single-value extractors for the CV header.
//!
//! Each extractor is paired with a typed setter on `CvDocument`; adding a
//! field means adding one row to `HEADER_FIELDS`.

use std::sync::LazyLock;

use regex::Regex;

use super::recognizer::{EntityLabel, EntityRecognizer};
use crate::cv::CvDocument;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}")
        .expect("email pattern should compile")
});

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:(?:\+\d{1,3}\s*)?(?:\(?\d{2,4}\)?[\s.-]*)?\d{3}[\s.-]*\d{3,4}[\s.-]*\d{3,4})")
        .expect("phone pattern should compile")
});

pub type ExtractFn = fn(&str, &dyn EntityRecognizer) -> Option<String>;
pub type ApplyFn = fn(&mut CvDocument, String);

#[derive(Clone, Copy)]
pub struct FieldExtractor {
    pub name: &'static str,
    pub extract: ExtractFn,
    pub apply: ApplyFn,
}

pub const HEADER_FIELDS: &[FieldExtractor] = &[
    FieldExtractor {
        name: "personal_info.contact.email",
        extract: extract_email,
        apply: set_email,
    },
    FieldExtractor {
        name: "personal_info.contact.phone",
        extract: extract_phone,
        apply: set_phone,
    },
    FieldExtractor {
        name: "personal_info.full_name",
        extract: extract_name,
        apply: set_full_name,
    },
];

/// Runs every extractor over `text` and applies the values found. Fields
/// without a match keep their current value.
pub fn apply_header_fields(
    cv: &mut CvDocument,
    text: &str,
    recognizer: &dyn EntityRecognizer,
    fields: &[FieldExtractor],
) {
    for field in fields {
        match (field.extract)(text, recognizer) {
            Some(value) => {
                tracing::debug!(field = field.name, value = %value, "header field extracted");
                (field.apply)(cv, value);
            }
            None => tracing::debug!(field = field.name, "header field not found"),
        }
    }
}

pub fn extract_email(text: &str, _recognizer: &dyn EntityRecognizer) -> Option<String> {
    EMAIL_RE.find(text).map(|m| m.as_str().to_string())
}

pub fn extract_phone(text: &str, _recognizer: &dyn EntityRecognizer) -> Option<String> {
    PHONE_RE.find(text).map(|m| m.as_str().trim().to_string())
}

/// First person entity in the text.
pub fn extract_name(text: &str, recognizer: &dyn EntityRecognizer) -> Option<String> {
    match recognizer.recognize(text) {
        Ok(entities) => entities
            .into_iter()
            .find(|e| e.label == EntityLabel::Person)
            .map(|e| e.text),
        Err(e) => {
            tracing::warn!(
                "Entity recognizer '{}' failed during name extraction: {}",
                recognizer.backend_id(),
                e
            );
            None
        }
    }
}

fn set_email(cv: &mut CvDocument, value: String) {
    cv.personal_info.contact.email = value;
}

fn set_phone(cv: &mut CvDocument, value: String) {
    cv.personal_info.contact.phone = value;
}

fn set_full_name(cv: &mut CvDocument, value: String) {
    cv.personal_info.full_name = value;
}
