//! Named entity recognition behind a pluggable trait.
//!
//! The extractor only depends on the `(start, end, label, text)` contract of
//! `EntityRecognizer`. Two backends ship with the crate: the built-in
//! `LexiconRecognizer`, and `CommandRecognizer`, which delegates to an
//! external program (for example a spaCy pipeline) over stdin/stdout.

use std::io::Write;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lexicon::{
    has_institution_keyword, is_connector, CAPITALIZED_RUN_RE, CITIES, DEGREE_RE, FACULTY_WORDS,
    MONTH_NAME_RE, NAME_STOPWORDS,
};

#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("Failed to run recognizer command: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("Recognizer exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("Invalid recognizer output: {0}")]
    InvalidOutput(#[from] serde_json::Error),
    #[error("Unknown entity label: {0}")]
    UnknownLabel(String),
    #[error("Entity offsets {start}..{end} out of bounds")]
    OffsetOutOfBounds { start: usize, end: usize },
}

pub type RecognitionResult<T> = Result<T, RecognitionError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityLabel {
    Organization,
    Person,
    Place,
    Date,
}

impl EntityLabel {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Organization => "organization",
            Self::Person => "person",
            Self::Place => "place",
            Self::Date => "date",
        }
    }
}

impl std::fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the generic vocabulary as well as the labels of the Polish spaCy
/// models (`orgName`, `persName`, `placeName`, `geogName`).
impl std::str::FromStr for EntityLabel {
    type Err = RecognitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "organization" | "org" | "orgname" => Ok(Self::Organization),
            "person" | "per" | "persname" => Ok(Self::Person),
            "place" | "placename" | "geogname" | "loc" | "gpe" | "location" => Ok(Self::Place),
            "date" | "time" => Ok(Self::Date),
            _ => Err(RecognitionError::UnknownLabel(s.to_string())),
        }
    }
}

/// An entity; `start` and `end` are byte offsets into the recognized text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedEntity {
    pub start: usize,
    pub end: usize,
    pub label: EntityLabel,
    pub text: String,
}

impl RecognizedEntity {
    #[must_use]
    pub fn new(start: usize, end: usize, label: EntityLabel, text: String) -> Self {
        Self {
            start,
            end,
            label,
            text,
        }
    }
}

pub trait EntityRecognizer: Send + Sync {
    /// Human-readable backend identifier.
    fn backend_id(&self) -> &str;

    fn recognize(&self, text: &str) -> RecognitionResult<Vec<RecognizedEntity>>;
}

/// Pattern-and-lexicon recognizer: capitalized word runs classified by
/// institution keywords, a city list and faculty words.
pub struct LexiconRecognizer;

impl LexiconRecognizer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn classify(run: &str) -> Option<EntityLabel> {
        let words: Vec<&str> = run.split_whitespace().collect();
        let first = words.first()?.to_lowercase();

        if has_institution_keyword(run) || FACULTY_WORDS.contains(&first.as_str()) {
            return Some(EntityLabel::Organization);
        }
        if CITIES.contains(&run) {
            return Some(EntityLabel::Place);
        }
        if NAME_STOPWORDS.contains(&first.as_str()) {
            return None;
        }

        let content: Vec<&str> = words.iter().copied().filter(|w| !is_connector(w)).collect();
        let looks_like_name = (2..=3).contains(&content.len())
            && content.iter().all(|w| {
                !w.chars().any(|c| c.is_ascii_digit())
                    && !DEGREE_RE.is_match(w)
                    && !MONTH_NAME_RE.is_match(w)
                    && !CITIES.contains(w)
            });

        looks_like_name.then_some(EntityLabel::Person)
    }
}

impl Default for LexiconRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityRecognizer for LexiconRecognizer {
    fn backend_id(&self) -> &str {
        "lexicon"
    }

    fn recognize(&self, text: &str) -> RecognitionResult<Vec<RecognizedEntity>> {
        let mut entities = Vec::new();

        for m in CAPITALIZED_RUN_RE.find_iter(text) {
            let run = m.as_str().trim_end_matches(['.', '-']);
            if run.is_empty() {
                continue;
            }
            if let Some(label) = Self::classify(run) {
                let start = m.start();
                entities.push(RecognizedEntity::new(
                    start,
                    start + run.len(),
                    label,
                    run.to_string(),
                ));
            }
        }

        Ok(entities)
    }
}

/// Entity as printed by an external recognizer. Offsets are character
/// offsets (spaCy's `start_char`/`end_char`).
#[derive(Debug, Deserialize)]
struct ExternalEntity {
    start: usize,
    end: usize,
    label: String,
}

/// Runs an external program that reads the text on stdin and prints a JSON
/// array of `{"start", "end", "label"}` objects on stdout.
pub struct CommandRecognizer {
    program: String,
    args: Vec<String>,
}

impl CommandRecognizer {
    #[must_use]
    pub const fn new(program: String, args: Vec<String>) -> Self {
        Self { program, args }
    }

    fn run(&self, text: &str) -> RecognitionResult<Vec<u8>> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            // A recognizer may exit without reading its input; its exit
            // status is what gets reported then.
            if let Err(e) = stdin.write_all(text.as_bytes()) {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(e.into());
                }
            }
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(RecognitionError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

impl EntityRecognizer for CommandRecognizer {
    fn backend_id(&self) -> &str {
        &self.program
    }

    fn recognize(&self, text: &str) -> RecognitionResult<Vec<RecognizedEntity>> {
        let stdout = self.run(text)?;
        let raw: Vec<ExternalEntity> = serde_json::from_slice(&stdout)?;
        parse_external_entities(text, raw)
    }
}

fn parse_external_entities(
    text: &str,
    raw: Vec<ExternalEntity>,
) -> RecognitionResult<Vec<RecognizedEntity>> {
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();

    let mut entities = Vec::with_capacity(raw.len());
    for entity in raw {
        let label = match entity.label.parse::<EntityLabel>() {
            Ok(label) => label,
            Err(e) => {
                tracing::debug!("Skipping entity: {}", e);
                continue;
            }
        };

        let (Some(&start), Some(&end)) =
            (boundaries.get(entity.start), boundaries.get(entity.end))
        else {
            return Err(RecognitionError::OffsetOutOfBounds {
                start: entity.start,
                end: entity.end,
            });
        };
        if start > end {
            return Err(RecognitionError::OffsetOutOfBounds {
                start: entity.start,
                end: entity.end,
            });
        }

        entities.push(RecognizedEntity::new(
            start,
            end,
            label,
            text[start..end].to_string(),
        ));
    }

    Ok(entities)
}
