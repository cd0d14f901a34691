use serde::{Deserialize, Serialize};

use super::recognizer::{EntityLabel, EntityRecognizer};
use crate::lexicon::{
    has_institution_keyword, is_connector, is_valid_year, DEGREE_RE, FIELD_MARKER_RE,
    INSTITUTION_RE, MONTH_ABBREV_YEAR_RE, MONTH_NAME_RE, NUMERIC_DATE_RE, ONGOING_RE, YEAR_RE,
};

/// Maximum number of characters between a month name and a year for the two
/// to form one date.
const MONTH_YEAR_GAP: usize = 3;

/// Characters stripped from both ends of free-text spans.
const EDGE_PUNCTUATION: &[char] = &[',', ';', ':', '|', '-', '–', '—', '/', '(', ')', '.', '"'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanType {
    Organization,
    Degree,
    Year,
    Date,
    FieldOfStudy,
    Place,
}

impl SpanType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Organization => "organization",
            Self::Degree => "degree",
            Self::Year => "year",
            Self::Date => "date",
            Self::FieldOfStudy => "field_of_study",
            Self::Place => "place",
        }
    }
}

impl std::fmt::Display for SpanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed match over the section text. `start` and `end` are byte offsets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub kind: SpanType,
    pub text: String,
}

impl Span {
    #[must_use]
    pub fn new(start: usize, end: usize, kind: SpanType, text: String) -> Self {
        Self {
            start,
            end,
            kind,
            text,
        }
    }

    /// Span over `source[start..end]`.
    #[must_use]
    pub fn slice(source: &str, start: usize, end: usize, kind: SpanType) -> Self {
        Self::new(start, end, kind, source[start..end].to_string())
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    #[must_use]
    pub fn with_kind(mut self, kind: SpanType) -> Self {
        self.kind = kind;
        self
    }
}

/// Runs every detector over the section text and pools the results.
pub struct SpanCollector {
    recognizer: Box<dyn EntityRecognizer>,
}

impl SpanCollector {
    #[must_use]
    pub fn new(recognizer: Box<dyn EntityRecognizer>) -> Self {
        Self { recognizer }
    }

    pub fn recognizer(&self) -> &dyn EntityRecognizer {
        self.recognizer.as_ref()
    }

    #[must_use]
    pub fn collect(&self, text: &str) -> Vec<Span> {
        let degrees = degree_spans(text);
        let (years, dates) = date_spans(text, year_spans(text));

        let mut temporal: Vec<Span> = years.iter().chain(dates.iter()).cloned().collect();
        temporal.sort_by_key(|s| s.start);

        let mut spans = entity_spans(self.recognizer.as_ref(), text, &temporal);
        let institutions = institution_spans(text, &temporal);
        let fields = field_spans(text, &degrees, &institutions, &temporal);

        tracing::debug!(
            entities = spans.len(),
            degrees = degrees.len(),
            years = years.len(),
            dates = dates.len(),
            institutions = institutions.len(),
            fields = fields.len(),
            "spans collected"
        );

        spans.extend(degrees);
        spans.extend(years);
        spans.extend(dates);
        spans.extend(institutions);
        spans.extend(fields);
        spans.sort_by(|a, b| (a.start, a.end, a.kind).cmp(&(b.start, b.end, b.kind)));
        spans
    }
}

/// Recognizer output mapped onto span types. Person names become `Place`
/// spans so that a patron name next to a school is merged into it. Entities
/// are cut where a year or date starts inside them.
pub fn entity_spans(
    recognizer: &dyn EntityRecognizer,
    text: &str,
    temporal: &[Span],
) -> Vec<Span> {
    let entities = match recognizer.recognize(text) {
        Ok(entities) => entities,
        Err(e) => {
            tracing::warn!(
                "Entity recognizer '{}' failed, using patterns only: {}",
                recognizer.backend_id(),
                e
            );
            return Vec::new();
        }
    };

    entities
        .into_iter()
        .filter_map(|e| {
            let kind = match e.label {
                EntityLabel::Organization => SpanType::Organization,
                EntityLabel::Place | EntityLabel::Person => SpanType::Place,
                EntityLabel::Date => return None,
            };
            let in_bounds = e.end <= text.len() && text.is_char_boundary(e.start);
            let cut = cut_at_temporal(e.start, e.end, temporal);
            if !in_bounds || cut == e.end {
                return Some(Span::new(e.start, e.end, kind, e.text));
            }
            let (start, end) = trimmed_range(text, e.start, cut)?;
            Some(Span::slice(text, start, end, kind))
        })
        .collect()
}

/// Start of the first year or date beginning strictly inside
/// `start..end`, or `end`.
fn cut_at_temporal(start: usize, end: usize, temporal: &[Span]) -> usize {
    temporal
        .iter()
        .filter(|t| t.start > start && t.start < end)
        .map(|t| t.start)
        .min()
        .unwrap_or(end)
}

pub fn degree_spans(text: &str) -> Vec<Span> {
    DEGREE_RE
        .find_iter(text)
        .map(|m| Span::slice(text, m.start(), m.end(), SpanType::Degree))
        .collect()
}

/// Four-digit years in range plus "ongoing" markers, all typed `Year`.
pub fn year_spans(text: &str) -> Vec<Span> {
    let years = YEAR_RE.find_iter(text).filter(|m| {
        m.as_str()
            .parse::<i32>()
            .is_ok_and(is_valid_year)
    });

    years
        .chain(ONGOING_RE.find_iter(text))
        .map(|m| Span::slice(text, m.start(), m.end(), SpanType::Year))
        .collect()
}

/// Builds `Date` spans and returns the years that were not absorbed into
/// one, as `(years, dates)`.
pub fn date_spans(text: &str, years: Vec<Span>) -> (Vec<Span>, Vec<Span>) {
    let mut dates: Vec<Span> = Vec::new();
    let mut consumed = vec![false; years.len()];

    let absorb = |start: usize, end: usize, consumed: &mut Vec<bool>| {
        for (i, year) in years.iter().enumerate() {
            if start <= year.start && year.end <= end {
                consumed[i] = true;
            }
        }
    };

    for caps in NUMERIC_DATE_RE.captures_iter(text) {
        let (Some(whole), Some(year)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        if !year.as_str().parse::<i32>().is_ok_and(is_valid_year) {
            continue;
        }
        absorb(whole.start(), whole.end(), &mut consumed);
        dates.push(Span::slice(text, whole.start(), whole.end(), SpanType::Date));
    }

    for m in MONTH_ABBREV_YEAR_RE.find_iter(text) {
        if dates.iter().any(|d| d.start < m.end() && m.start() < d.end) {
            continue;
        }
        absorb(m.start(), m.end(), &mut consumed);
        dates.push(Span::slice(text, m.start(), m.end(), SpanType::Date));
    }

    for m in MONTH_NAME_RE.find_iter(text) {
        if dates.iter().any(|d| d.start < m.end() && m.start() < d.end) {
            continue;
        }

        let within_gap = |gap: &str| gap.chars().count() <= MONTH_YEAR_GAP && !gap.contains('\n');
        let following = years.iter().enumerate().find(|(i, year)| {
            !consumed[*i] && year.start >= m.end() && within_gap(&text[m.end()..year.start])
        });
        let adjacent = following.or_else(|| {
            years.iter().enumerate().find(|(i, year)| {
                !consumed[*i] && year.end <= m.start() && within_gap(&text[year.end..m.start()])
            })
        });

        match adjacent {
            Some((i, year)) => {
                consumed[i] = true;
                let start = m.start().min(year.start);
                let end = m.end().max(year.end);
                dates.push(Span::slice(text, start, end, SpanType::Date));
            }
            None => dates.push(Span::slice(text, m.start(), m.end(), SpanType::Date)),
        }
    }

    let remaining = years
        .into_iter()
        .zip(consumed)
        .filter_map(|(year, used)| (!used).then_some(year))
        .collect();

    dates.sort_by_key(|d| d.start);
    (remaining, dates)
}

/// Institution names, truncated where a year or date starts inside them.
pub fn institution_spans(text: &str, temporal: &[Span]) -> Vec<Span> {
    INSTITUTION_RE
        .find_iter(text)
        .filter_map(|m| {
            let cut = cut_at_temporal(m.start(), m.end(), temporal);
            let (start, end) = trimmed_range(text, m.start(), cut)?;
            has_institution_keyword(&text[start..end])
                .then(|| Span::slice(text, start, end, SpanType::Organization))
        })
        .collect()
}

/// All four field-of-study detectors. They may fire on overlapping text;
/// the resolver decides which survive.
pub fn field_spans(
    text: &str,
    degrees: &[Span],
    institutions: &[Span],
    temporal: &[Span],
) -> Vec<Span> {
    let mut fields = marker_fields(text);
    fields.extend(between_degree_and_institution(text, degrees, institutions));
    fields.extend(after_institution_colon(text, institutions));
    fields.extend(after_degree(text, degrees, institutions, temporal));
    fields
}

/// "kierunek Informatyka", "zawód: technik" and the like; the span keeps
/// the marker word.
fn marker_fields(text: &str) -> Vec<Span> {
    FIELD_MARKER_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let value = caps.get(1)?;
            let (_, end) = trimmed_range(text, value.start(), value.end())?;
            is_meaningful(&text[value.start()..end])
                .then(|| Span::slice(text, whole.start(), end, SpanType::FieldOfStudy))
        })
        .collect()
}

fn between_degree_and_institution(
    text: &str,
    degrees: &[Span],
    institutions: &[Span],
) -> Vec<Span> {
    degrees
        .iter()
        .filter_map(|degree| {
            let next = institutions
                .iter()
                .filter(|i| i.start >= degree.end)
                .min_by_key(|i| i.start)?;
            if text[degree.end..next.start].contains('\n') {
                return None;
            }
            free_text_span(text, degree.end, next.start)
        })
        .collect()
}

fn after_institution_colon(text: &str, institutions: &[Span]) -> Vec<Span> {
    institutions
        .iter()
        .filter_map(|institution| {
            let rest = &text[institution.end..];
            let after_colon = rest.trim_start_matches([' ', '\t']).strip_prefix(':')?;
            let start = text.len() - after_colon.len();
            let len = after_colon
                .find(|c: char| c == '\n' || c.is_ascii_digit() || matches!(c, ',' | ';' | '|'))
                .unwrap_or(after_colon.len());
            free_text_span(text, start, start + len)
        })
        .collect()
}

fn after_degree(
    text: &str,
    degrees: &[Span],
    institutions: &[Span],
    temporal: &[Span],
) -> Vec<Span> {
    degrees
        .iter()
        .filter_map(|degree| {
            let line_end = text[degree.end..]
                .find('\n')
                .map_or(text.len(), |i| degree.end + i);
            let end = temporal
                .iter()
                .chain(institutions)
                .filter(|s| s.start >= degree.end)
                .map(|s| s.start)
                .fold(line_end, usize::min);
            free_text_span(text, degree.end, end)
        })
        .collect()
}

fn free_text_span(text: &str, start: usize, end: usize) -> Option<Span> {
    let (start, end) = trimmed_range(text, start, end)?;
    is_meaningful(&text[start..end]).then(|| Span::slice(text, start, end, SpanType::FieldOfStudy))
}

/// `start..end` with whitespace and edge punctuation removed from both ends,
/// or `None` if nothing remains.
pub(crate) fn trimmed_range(text: &str, start: usize, end: usize) -> Option<(usize, usize)> {
    if start >= end {
        return None;
    }
    let slice = &text[start..end];
    let is_edge = |c: char| c.is_whitespace() || EDGE_PUNCTUATION.contains(&c);
    let leading = slice.len() - slice.trim_start_matches(is_edge).len();
    let trimmed = slice.trim_matches(is_edge);
    if trimmed.is_empty() {
        return None;
    }
    let new_start = start + leading;
    Some((new_start, new_start + trimmed.len()))
}

/// At least three letters and one word that is not a bare connector.
fn is_meaningful(text: &str) -> bool {
    text.chars().filter(|c| c.is_alphabetic()).count() >= 3
        && text.split_whitespace().any(|w| !is_connector(w))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::recognizer::{
        LexiconRecognizer, RecognitionError, RecognitionResult, RecognizedEntity,
    };

    struct NoEntities;

    impl EntityRecognizer for NoEntities {
        fn backend_id(&self) -> &str {
            "none"
        }

        fn recognize(&self, _text: &str) -> RecognitionResult<Vec<RecognizedEntity>> {
            Ok(Vec::new())
        }
    }

    struct Broken;

    impl EntityRecognizer for Broken {
        fn backend_id(&self) -> &str {
            "broken"
        }

        fn recognize(&self, text: &str) -> RecognitionResult<Vec<RecognizedEntity>> {
            Err(RecognitionError::OffsetOutOfBounds {
                start: 0,
                end: text.len() + 1,
            })
        }
    }

    fn texts(spans: &[Span], kind: SpanType) -> Vec<&str> {
        spans
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.text.as_str())
            .collect()
    }

    #[test]
    fn test_years_and_ongoing() {
        let spans = year_spans("2010 - obecnie, 1850, 2015");

        assert_eq!(texts(&spans, SpanType::Year), vec!["2010", "2015", "obecnie"]);
    }

    #[test]
    fn test_month_merges_with_adjacent_year() {
        let text = "październik 2010 - czerwiec 2015";
        let (years, dates) = date_spans(text, year_spans(text));

        assert!(years.is_empty());
        assert_eq!(texts(&dates, SpanType::Date), vec!["październik 2010", "czerwiec 2015"]);
    }

    #[test]
    fn test_lone_month_is_a_date() {
        let text = "od września do czerwca 2012";
        let (years, dates) = date_spans(text, year_spans(text));

        assert!(years.is_empty());
        assert_eq!(texts(&dates, SpanType::Date), vec!["września", "czerwca 2012"]);
    }

    #[test]
    fn test_month_prefers_following_year() {
        let text = "2010 - czerwiec 2015";
        let (years, dates) = date_spans(text, year_spans(text));

        assert_eq!(texts(&years, SpanType::Year), vec!["2010"]);
        assert_eq!(texts(&dates, SpanType::Date), vec!["czerwiec 2015"]);
    }

    #[test]
    fn test_numeric_and_abbreviated_dates() {
        let text = "10.2010 - wrz. 2014";
        let (years, dates) = date_spans(text, year_spans(text));

        assert!(years.is_empty());
        assert_eq!(texts(&dates, SpanType::Date), vec!["10.2010", "wrz. 2014"]);
    }

    #[test]
    fn test_institution_truncated_at_year() {
        let text = "Politechnika Warszawska w Warszawie 2010 - 2015";
        let (years, _) = date_spans(text, year_spans(text));

        let spans = institution_spans(text, &years);

        assert_eq!(texts(&spans, SpanType::Organization), vec!["Politechnika Warszawska w Warszawie"]);
    }

    #[test]
    fn test_entities_cut_at_dates() {
        let text = "Politechnika Gdańska 09.2015 - 06.2019\nUniwersytet Gdański Październik 2013";
        let (years, dates) = date_spans(text, year_spans(text));
        let temporal: Vec<Span> = years.into_iter().chain(dates).collect();

        let spans = entity_spans(&LexiconRecognizer::new(), text, &temporal);

        assert_eq!(
            texts(&spans, SpanType::Organization),
            vec!["Politechnika Gdańska", "Uniwersytet Gdański"]
        );
    }

    #[test]
    fn test_institution_with_prefix_words() {
        let text = "Wyższa Szkoła Bankowa, Poznań";
        let spans = institution_spans(text, &[]);

        assert_eq!(texts(&spans, SpanType::Organization), vec!["Wyższa Szkoła Bankowa"]);
    }

    #[test]
    fn test_marker_field_keeps_marker() {
        let spans = marker_fields("kierunek Informatyka 2010");

        assert_eq!(texts(&spans, SpanType::FieldOfStudy), vec!["kierunek Informatyka"]);
    }

    #[test]
    fn test_field_between_degree_and_institution() {
        let text = "Magister Zarządzania - Uniwersytet Ekonomiczny";
        let degrees = degree_spans(text);
        let institutions = institution_spans(text, &[]);

        let spans = between_degree_and_institution(text, &degrees, &institutions);

        assert_eq!(texts(&spans, SpanType::FieldOfStudy), vec!["Zarządzania"]);
    }

    #[test]
    fn test_field_after_institution_colon() {
        let text = "Uniwersytet Jagielloński: Filologia angielska, 2012";
        let institutions = institution_spans(text, &[]);

        let spans = after_institution_colon(text, &institutions);

        assert_eq!(texts(&spans, SpanType::FieldOfStudy), vec!["Filologia angielska"]);
    }

    #[test]
    fn test_field_after_degree_stops_at_date() {
        let text = "inżynier budownictwa czerwiec 2016\nmagister";
        let degrees = degree_spans(text);
        let (years, dates) = date_spans(text, year_spans(text));
        let temporal: Vec<Span> = years.into_iter().chain(dates).collect();

        let spans = after_degree(text, &degrees, &[], &temporal);

        assert_eq!(texts(&spans, SpanType::FieldOfStudy), vec!["budownictwa"]);
    }

    #[test]
    fn test_connector_only_gap_is_not_a_field() {
        let text = "Licencjat na Uniwersytecie Gdańskim";
        let degrees = degree_spans(text);
        let institutions = institution_spans(text, &[]);

        assert!(between_degree_and_institution(text, &degrees, &institutions).is_empty());
    }

    #[test]
    fn test_collect_pools_all_detectors() {
        let text = "Politechnika Warszawska w Warszawie kierunek Informatyka 2010 - 2015";
        let collector = SpanCollector::new(Box::new(LexiconRecognizer::new()));

        let spans = collector.collect(text);

        assert!(spans.iter().any(|s| s.kind == SpanType::Organization));
        assert!(spans.iter().any(|s| s.kind == SpanType::FieldOfStudy));
        assert_eq!(texts(&spans, SpanType::Year), vec!["2010", "2015"]);
        assert!(spans.windows(2).all(|w| w[0].start <= w[1].start));
    }

    #[test]
    fn test_recognizer_failure_falls_back_to_patterns() {
        let text = "Uniwersytet Warszawski 2010";
        let with_broken = SpanCollector::new(Box::new(Broken)).collect(text);
        let without = SpanCollector::new(Box::new(NoEntities)).collect(text);

        assert_eq!(with_broken, without);
    }

    #[test]
    fn test_trimmed_range() {
        let text = " , Informatyka - ";
        let (start, end) = trimmed_range(text, 0, text.len()).unwrap();

        assert_eq!(&text[start..end], "Informatyka");
        assert!(trimmed_range(text, 0, 3).is_none());
    }
}
