//! Record deduplication.
//!
//! Records are merged on a canonical form of the institution name. One round
//! groups by `(institution, start)`, merges compatible records of the same
//! institution, absorbs records without an institution into a matching peer
//! and drops fragments. Rounds repeat until nothing changes, so the output
//! is a fixed point.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::lexicon::fold_ascii;
use crate::record::{epoch_placeholder, is_unknown, EducationRecord};

/// Minimum canonical length for a field of study to be matched as a
/// substring.
const MIN_MATCH_LEN: usize = 3;

/// ASCII-folded, lowercased, punctuation-free form of an institution name;
/// empty for unknown values.
#[must_use]
pub fn canonical_institution(name: &str) -> String {
    if is_unknown(name) {
        return String::new();
    }
    fold_ascii(name)
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[must_use]
pub fn deduplicate(records: Vec<EducationRecord>) -> Vec<EducationRecord> {
    let input = records.len();
    let mut current = records;
    loop {
        let next = dedup_round(current.clone());
        // Every merge or drop shortens the list, and a round that merges
        // nothing returns its input unchanged.
        if next.len() == current.len() {
            tracing::debug!(input, output = next.len(), "records deduplicated");
            return next;
        }
        current = next;
    }
}

fn dedup_round(records: Vec<EducationRecord>) -> Vec<EducationRecord> {
    let records = group_by_start(records);
    let records = merge_compatible(records);
    let records = absorb_orphans(records);
    drop_fragments(records)
}

/// Prefers known values from `primary`, then from `other`; earliest known
/// start, latest end.
fn merge_pair(primary: &EducationRecord, other: &EducationRecord) -> EducationRecord {
    let pick = |a: &String, b: &String| {
        if is_unknown(a) && !is_unknown(b) {
            b.clone()
        } else {
            a.clone()
        }
    };

    let start = match (primary.known_start(), other.known_start()) {
        (Some(a), Some(b)) => a.min(b),
        (Some(a), None) | (None, Some(a)) => a,
        (None, None) => epoch_placeholder(),
    };

    EducationRecord {
        degree: pick(&primary.degree, &other.degree),
        institution: pick(&primary.institution, &other.institution),
        field_of_study: pick(&primary.field_of_study, &other.field_of_study),
        start_date: start,
        end_date: primary.end_date.max(other.end_date),
    }
}

fn group_by_start(records: Vec<EducationRecord>) -> Vec<EducationRecord> {
    let mut merged: Vec<EducationRecord> = Vec::with_capacity(records.len());
    let mut slots: HashMap<(String, Option<NaiveDate>), usize> = HashMap::new();

    for record in records {
        let key = (canonical_institution(&record.institution), record.known_start());
        if let Some(&slot) = slots.get(&key) {
            merged[slot] = merge_pair(&merged[slot], &record);
        } else {
            slots.insert(key, merged.len());
            merged.push(record);
        }
    }
    merged
}

fn compatible(a: &str, b: &str) -> bool {
    is_unknown(a) || is_unknown(b) || canonical_institution(a) == canonical_institution(b)
}

/// Same institution with no conflicting degree or field: one enrolment
/// listed in several blocks.
fn merge_compatible(records: Vec<EducationRecord>) -> Vec<EducationRecord> {
    let mut merged: Vec<EducationRecord> = Vec::with_capacity(records.len());

    for record in records {
        let institution = canonical_institution(&record.institution);
        let target = if institution.is_empty() {
            None
        } else {
            merged.iter().position(|m| {
                canonical_institution(&m.institution) == institution
                    && compatible(&m.degree, &record.degree)
                    && compatible(&m.field_of_study, &record.field_of_study)
            })
        };

        match target {
            Some(slot) => merged[slot] = merge_pair(&merged[slot], &record),
            None => merged.push(record),
        }
    }
    merged
}

fn substring_match(a: &str, b: &str) -> bool {
    a.len() >= MIN_MATCH_LEN && b.len() >= MIN_MATCH_LEN && (a.contains(b) || b.contains(a))
}

/// Index of the record an orphan belongs to: the first record with an
/// institution whose name or field matches the orphan's field.
fn find_peer(orphan: &EducationRecord, records: &[EducationRecord]) -> Option<usize> {
    let field = canonical_institution(&orphan.field_of_study);
    if field.is_empty() {
        return None;
    }
    records.iter().position(|peer| {
        let institution = canonical_institution(&peer.institution);
        !institution.is_empty()
            && (substring_match(&institution, &field)
                || substring_match(&canonical_institution(&peer.field_of_study), &field))
    })
}

/// Records without an institution are folded into a matching peer; the
/// rest are merged by field of study, or kept on their own.
fn absorb_orphans(records: Vec<EducationRecord>) -> Vec<EducationRecord> {
    let targets: Vec<Option<usize>> = records
        .iter()
        .map(|r| {
            if r.has_institution() {
                None
            } else {
                find_peer(r, &records)
            }
        })
        .collect();

    let mut output: Vec<EducationRecord> = Vec::with_capacity(records.len());
    let mut positions: HashMap<usize, usize> = HashMap::new();
    let mut orphan_slots: HashMap<String, usize> = HashMap::new();
    let mut absorbed: Vec<(usize, EducationRecord)> = Vec::new();

    for (index, (record, target)) in records.into_iter().zip(targets).enumerate() {
        if let Some(peer) = target {
            absorbed.push((peer, record));
            continue;
        }
        if record.has_institution() {
            positions.insert(index, output.len());
            output.push(record);
            continue;
        }

        let field = canonical_institution(&record.field_of_study);
        let key = if field.is_empty() {
            format!("orphan:{index}")
        } else {
            format!("field:{field}")
        };
        if let Some(&slot) = orphan_slots.get(&key) {
            output[slot] = merge_pair(&output[slot], &record);
        } else {
            orphan_slots.insert(key, output.len());
            output.push(record);
        }
    }

    for (peer, orphan) in absorbed {
        if let Some(&slot) = positions.get(&peer) {
            output[slot] = merge_pair(&output[slot], &orphan);
        }
    }
    output
}

/// An unknown-institution record sharing its start with a known one is a
/// fragment of it.
fn drop_fragments(records: Vec<EducationRecord>) -> Vec<EducationRecord> {
    let known_starts: Vec<NaiveDate> = records
        .iter()
        .filter(|r| r.has_institution())
        .map(|r| r.start_date)
        .collect();

    records
        .into_iter()
        .filter(|r| r.has_institution() || !known_starts.contains(&r.start_date))
        .collect()
}
