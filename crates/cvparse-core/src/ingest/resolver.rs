//! Turns the pooled span bag into one ordered, non-overlapping timeline.
//!
//! Every pass is a plain function from one span list to a new one, so each
//! can be exercised on its own. `SpanResolver::resolve` runs them in order.

use super::extractor::{trimmed_range, Span, SpanType};
use crate::lexicon::has_institution_keyword;

/// Largest gap, in characters, between two spans that are merged into one
/// organization.
const MERGE_GAP: usize = 5;

/// Language-specific split of "<institution> <preposition> <city> <rest>"
/// organization text.
pub trait LocationSplitter: Send + Sync {
    fn language(&self) -> &str;

    /// Byte offset into `text` where the institution part (city included)
    /// ends, or `None` when the text has no location.
    fn split(&self, text: &str) -> Option<usize>;
}

/// Splits on the first " w " and keeps one following word as the city.
pub struct PolishLocationSplitter;

impl LocationSplitter for PolishLocationSplitter {
    fn language(&self) -> &str {
        "pl"
    }

    fn split(&self, text: &str) -> Option<usize> {
        let city_start = text.find(" w ")? + 3;
        let rest = &text[city_start..];
        let word = rest.split_whitespace().next()?;
        let city = word.trim_end_matches([',', '.', ';', ':', ')', '-']);
        if city.is_empty() {
            return None;
        }
        let offset = rest.find(word)?;
        Some(city_start + offset + city.len())
    }
}

pub struct SpanResolver {
    splitter: Box<dyn LocationSplitter>,
}

impl SpanResolver {
    #[must_use]
    pub fn new(splitter: Box<dyn LocationSplitter>) -> Self {
        Self { splitter }
    }

    #[must_use]
    pub fn resolve(&self, spans: Vec<Span>, text: &str) -> Vec<Span> {
        let collected = spans.len();

        let spans = drop_malformed(spans, text);
        let spans = reclassify(spans);
        let spans = carve_out(spans, text);
        let spans = dedup_identical(spans);
        let spans = merge_adjacent(spans, text);
        let spans = arbitrate_overlaps(spans);
        let spans = split_locations(spans, text, self.splitter.as_ref());
        let mut spans = drop_malformed(spans, text);
        spans.sort_by_key(|s| (s.start, s.end));

        tracing::debug!(
            collected,
            resolved = spans.len(),
            splitter = self.splitter.language(),
            "spans resolved"
        );
        spans
    }
}

impl Default for SpanResolver {
    fn default() -> Self {
        Self::new(Box::new(PolishLocationSplitter))
    }
}

/// Drops zero-length, inverted and out-of-bounds spans, and spans whose
/// offsets do not fall on character boundaries.
pub fn drop_malformed(spans: Vec<Span>, text: &str) -> Vec<Span> {
    spans
        .into_iter()
        .filter(|s| {
            let valid = !s.is_empty()
                && s.end <= text.len()
                && text.is_char_boundary(s.start)
                && text.is_char_boundary(s.end);
            if !valid {
                tracing::debug!(start = s.start, end = s.end, kind = %s.kind, "dropping malformed span");
            }
            valid
        })
        .collect()
}

/// An organization without an institution keyword is most likely a faculty
/// or programme name.
pub fn reclassify(spans: Vec<Span>) -> Vec<Span> {
    spans
        .into_iter()
        .map(|s| {
            if s.kind == SpanType::Organization && !has_institution_keyword(&s.text) {
                s.with_kind(SpanType::FieldOfStudy)
            } else {
                s
            }
        })
        .collect()
}

const fn is_cutter(kind: SpanType) -> bool {
    matches!(
        kind,
        SpanType::Degree | SpanType::Year | SpanType::FieldOfStudy
    )
}

const fn is_name(kind: SpanType) -> bool {
    matches!(kind, SpanType::Organization | SpanType::Place)
}

/// Removes degree, year and field-of-study text from organization and place
/// spans. Remainders keep the original type.
pub fn carve_out(spans: Vec<Span>, text: &str) -> Vec<Span> {
    let mut cutters: Vec<(usize, usize)> = spans
        .iter()
        .filter(|s| is_cutter(s.kind))
        .map(|s| (s.start, s.end))
        .collect();
    cutters.sort_unstable();

    spans
        .into_iter()
        .flat_map(|span| {
            if !is_name(span.kind) {
                return vec![span];
            }

            let overlapping: Vec<(usize, usize)> = cutters
                .iter()
                .copied()
                .filter(|&(start, end)| {
                    start < span.end && span.start < end && (start, end) != (span.start, span.end)
                })
                .collect();
            if overlapping.is_empty() {
                return vec![span];
            }

            let mut pieces = Vec::new();
            let mut cursor = span.start;
            for (start, end) in overlapping {
                if start > cursor {
                    pieces.push((cursor, start));
                }
                cursor = cursor.max(end);
            }
            if cursor < span.end {
                pieces.push((cursor, span.end));
            }

            pieces
                .into_iter()
                .filter_map(|(start, end)| trimmed_range(text, start, end))
                .filter(|&(start, end)| text[start..end].chars().any(char::is_alphabetic))
                .map(|(start, end)| Span::slice(text, start, end, span.kind))
                .collect()
        })
        .collect()
}

/// Collapses spans identical in `(start, end, text)`.
pub fn dedup_identical(mut spans: Vec<Span>) -> Vec<Span> {
    spans.sort_by(|a, b| (a.start, a.end, a.kind).cmp(&(b.start, b.end, b.kind)));
    spans.dedup_by(|b, a| a.start == b.start && a.end == b.end && a.text == b.text);
    spans
}

/// Merges consecutive organization/organization and organization/place
/// spans separated by a short gap on the same line.
pub fn merge_adjacent(mut spans: Vec<Span>, text: &str) -> Vec<Span> {
    spans.sort_by_key(|s| (s.start, s.end));

    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        if let Some(last) = merged.last_mut() {
            if mergeable(last, &span, text) {
                let end = last.end.max(span.end);
                *last = Span::slice(text, last.start, end, SpanType::Organization);
                continue;
            }
        }
        merged.push(span);
    }
    merged
}

fn mergeable(left: &Span, right: &Span, text: &str) -> bool {
    let kinds = matches!(
        (left.kind, right.kind),
        (SpanType::Organization, SpanType::Organization | SpanType::Place)
            | (SpanType::Place, SpanType::Organization)
    );
    if !kinds {
        return false;
    }
    if right.start <= left.end {
        return true;
    }
    let gap = &text[left.end..right.start];
    !gap.contains('\n') && gap.chars().count() <= MERGE_GAP
}

/// Keeps the longer of two overlapping spans; on a tie the earlier one.
pub fn arbitrate_overlaps(mut spans: Vec<Span>) -> Vec<Span> {
    spans.sort_by_key(|s| (s.start, s.end));

    let mut kept: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        match kept.last_mut() {
            Some(last) if last.overlaps(&span) => {
                if span.len() > last.len() {
                    *last = span;
                }
            }
            _ => kept.push(span),
        }
    }
    kept
}

/// Splits organization spans at the city; text after the city becomes a
/// field-of-study span.
pub fn split_locations(spans: Vec<Span>, text: &str, splitter: &dyn LocationSplitter) -> Vec<Span> {
    spans
        .into_iter()
        .flat_map(|span| {
            if span.kind != SpanType::Organization {
                return vec![span];
            }
            let Some(offset) = splitter.split(&text[span.start..span.end]) else {
                return vec![span];
            };

            let cut = span.start + offset;
            if cut >= span.end || !text.is_char_boundary(cut) {
                return vec![span];
            }

            let mut parts = Vec::with_capacity(2);
            if let Some((start, end)) = trimmed_range(text, span.start, cut) {
                parts.push(Span::slice(text, start, end, SpanType::Organization));
            }
            if let Some((start, end)) = trimmed_range(text, cut, span.end) {
                if text[start..end].chars().any(char::is_alphabetic) {
                    parts.push(Span::slice(text, start, end, SpanType::FieldOfStudy));
                }
            }
            parts
        })
        .collect()
}
