use serde::{Deserialize, Serialize};

use crate::lexicon::{HEADING_RE, SECTION_END_RE};

/// A slice of the document text; offsets are byte offsets into the full
/// document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: Option<String>,
    pub content: String,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl Section {
    #[must_use]
    pub const fn new(content: String, start_offset: usize, end_offset: usize) -> Self {
        Self {
            title: None,
            content,
            start_offset,
            end_offset,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: String) -> Self {
        self.title = Some(title);
        self
    }
}

/// Locates the education section: everything after the first education
/// heading up to the next line that is exactly another known heading, or
/// the end of the text.
pub fn find_education_section(text: &str) -> Option<Section> {
    let heading = HEADING_RE.find(text)?;
    let start = heading.end();

    let end = SECTION_END_RE
        .find_at(text, start)
        .map_or(text.len(), |m| m.start());

    let title = heading.as_str().trim().trim_end_matches(':').trim_end().to_string();

    tracing::debug!(
        title = %title,
        start,
        end,
        "education section located"
    );

    Some(Section::new(text[start..end].to_string(), start, end).with_title(title))
}
