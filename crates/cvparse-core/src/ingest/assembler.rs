//! Walks the resolved timeline and turns it into education drafts.
//!
//! Record boundaries come from a small state machine. The state is derived
//! from the current draft, and `transition` maps `(state, span type,
//! boundary)` to an action. A span is a boundary when its type equals the
//! type of the first span seen, since entries tend to repeat their leading
//! annotation.

use chrono::{Datelike, NaiveDate};

use super::extractor::{Span, SpanType};
use crate::lexicon::{
    is_connector, is_ongoing, is_valid_year, month_number, FIELD_PREFIX_RE, NUMERIC_DATE_RE,
    YEAR_RE,
};
use crate::record::{EducationDraft, EducationRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftState {
    /// No draft yet.
    Empty,
    Open,
    /// The current draft has a degree and an end date but no start date.
    Closing,
    /// The current draft has a degree, a start date and an end date.
    Complete,
}

impl DraftState {
    fn of(draft: Option<&EducationDraft>) -> Self {
        match draft {
            None => Self::Empty,
            Some(d) if d.is_complete() => Self::Complete,
            Some(d) if d.is_closing() => Self::Closing,
            Some(_) => Self::Open,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Push an empty draft, then assign the span to it.
    OpenFresh,
    /// Push a draft for the same institution and field whose start is the
    /// previous end, then assign the degree to it.
    CarryOver,
    /// Push a draft for the same institution and field, then assign the date.
    Reopen,
    /// Assign the span to the current draft.
    Assign,
}

/// `after_leading_degree` is set when the first span type seen was `Degree`
/// and the previous span was a degree too.
#[must_use]
pub const fn transition(
    state: DraftState,
    kind: SpanType,
    is_boundary: bool,
    after_leading_degree: bool,
) -> Action {
    match (state, kind) {
        (DraftState::Empty, _) => Action::OpenFresh,
        _ if is_boundary => Action::OpenFresh,
        (DraftState::Closing | DraftState::Complete, SpanType::Degree) => Action::CarryOver,
        (DraftState::Complete, SpanType::Year | SpanType::Date) if !after_leading_degree => {
            Action::Reopen
        }
        _ => Action::Assign,
    }
}

pub struct Assembler {
    reference_date: NaiveDate,
    drafts: Vec<EducationDraft>,
    first_label: Option<SpanType>,
    last_kind: Option<SpanType>,
}

impl Assembler {
    /// `reference_date` is what "ongoing" markers resolve to.
    #[must_use]
    pub const fn new(reference_date: NaiveDate) -> Self {
        Self {
            reference_date,
            drafts: Vec::new(),
            first_label: None,
            last_kind: None,
        }
    }

    #[must_use]
    pub fn assemble(reference_date: NaiveDate, spans: &[Span]) -> Vec<EducationRecord> {
        let mut assembler = Self::new(reference_date);
        for span in spans {
            assembler.feed(span);
        }
        assembler.finish()
    }

    pub fn state(&self) -> DraftState {
        DraftState::of(self.drafts.last())
    }

    pub fn drafts(&self) -> &[EducationDraft] {
        &self.drafts
    }

    pub fn feed(&mut self, span: &Span) {
        let state = self.state();
        let is_boundary = self.first_label == Some(span.kind);
        let after_leading_degree = self.first_label == Some(SpanType::Degree)
            && self.last_kind == Some(SpanType::Degree);

        let action = transition(state, span.kind, is_boundary, after_leading_degree);
        tracing::trace!(?state, kind = %span.kind, ?action, text = %span.text, "assembler step");

        match action {
            Action::OpenFresh => self.drafts.push(EducationDraft::new()),
            Action::CarryOver => {
                if let Some(previous) = self.drafts.last() {
                    let mut next = previous.follow_up();
                    next.start_date = previous.end_date;
                    next.start_inherited = next.start_date.is_some();
                    self.drafts.push(next);
                }
            }
            Action::Reopen => {
                if let Some(previous) = self.drafts.last() {
                    let next = previous.follow_up();
                    self.drafts.push(next);
                }
            }
            Action::Assign => {}
        }

        self.first_label.get_or_insert(span.kind);
        self.last_kind = Some(span.kind);

        let reference_date = self.reference_date;
        if let Some(draft) = self.drafts.last_mut() {
            assign(draft, span, reference_date);
        }
    }

    /// Drops drafts with neither institution nor degree and converts the
    /// rest to records.
    #[must_use]
    pub fn finish(self) -> Vec<EducationRecord> {
        let total = self.drafts.len();
        let records: Vec<EducationRecord> = self
            .drafts
            .into_iter()
            .filter(|d| d.institution.is_some() || d.degree.is_some())
            .map(EducationDraft::into_record)
            .collect();

        tracing::debug!(drafts = total, records = records.len(), "drafts assembled");
        records
    }
}

fn assign(draft: &mut EducationDraft, span: &Span, reference_date: NaiveDate) {
    let text = span.text.trim();
    match span.kind {
        SpanType::Organization => draft.institution = Some(text.to_string()),
        SpanType::Degree => draft.degree = Some(text.to_string()),
        SpanType::FieldOfStudy => {
            if let Some(field) = clean_field(text) {
                draft.field_of_study = Some(field);
            }
        }
        SpanType::Year | SpanType::Date => assign_date(draft, text, reference_date),
        SpanType::Place => {}
    }
}

fn assign_date(draft: &mut EducationDraft, text: &str, reference_date: NaiveDate) {
    if is_ongoing(text) {
        if draft.start_date.is_none() {
            draft.start_date = Some(reference_date);
        } else {
            draft.end_date = Some(reference_date);
        }
        draft.start_inherited = false;
        return;
    }

    let Some((year, month)) = parse_year_month(text) else {
        tracing::debug!(text, "ignoring date without a year");
        return;
    };

    match draft.start_date {
        None => draft.start_date = start_of_month(year, month),
        Some(start) if draft.start_inherited && start.year() == year => {
            draft.start_date = start_of_month(year, month);
        }
        Some(_) => draft.end_date = end_of_month(year, month),
    }
    draft.start_inherited = false;
}

/// Year and optional month of a `Year` or `Date` span.
pub fn parse_year_month(text: &str) -> Option<(i32, Option<u32>)> {
    if let Some(caps) = NUMERIC_DATE_RE.captures(text) {
        let month = caps.get(1)?.as_str().parse().ok()?;
        let year = caps.get(2)?.as_str().parse().ok()?;
        return Some((year, Some(month)));
    }

    let year = YEAR_RE
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<i32>().ok())
        .find(|&y| is_valid_year(y))?;
    let month = text
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .find_map(month_number);

    Some((year, month))
}

/// First day of the month; January when the month is unknown.
pub fn start_of_month(year: i32, month: Option<u32>) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month.unwrap_or(1), 1)
}

/// Last day of the month; December when the month is unknown.
pub fn end_of_month(year: i32, month: Option<u32>) -> Option<NaiveDate> {
    match month.unwrap_or(12) {
        12 => NaiveDate::from_ymd_opt(year, 12, 31),
        m => NaiveDate::from_ymd_opt(year, m + 1, 1)?.pred_opt(),
    }
}

/// Strips field markers ("kierunek", "zawód:") and leading connectors.
fn clean_field(text: &str) -> Option<String> {
    let mut rest = text.trim();
    loop {
        let before = rest.len();
        if let Some(m) = FIELD_PREFIX_RE.find(rest) {
            rest = rest[m.end()..].trim_start();
        }
        if let Some((first, tail)) = rest.split_once(char::is_whitespace) {
            if is_connector(first) {
                rest = tail.trim_start();
            }
        }
        if rest.len() == before {
            break;
        }
    }

    let rest = rest
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':' | '-' | '–'));
    (!rest.is_empty()).then(|| rest.to_string())
}
