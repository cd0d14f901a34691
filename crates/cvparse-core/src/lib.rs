#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::option_if_let_else)]

pub mod config;
pub mod cv;
pub mod error;
pub mod ingest;
pub mod lexicon;
pub mod record;

pub use config::{ConfigError, ParserConfig, RecognizerConfig};
pub use cv::{Contact, CvDocument, PersonalInfo};
pub use error::{Error, Result};
pub use ingest::{
    BatchParseResult, CvParser, EducationExtractor, EntityRecognizer, ParseOutput, ParseStats,
    Span, SpanType,
};
pub use record::{EducationDraft, EducationRecord, UNKNOWN};
