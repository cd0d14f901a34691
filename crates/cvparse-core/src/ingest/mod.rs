mod assembler;
mod extractor;
mod fields;
mod normalizer;
mod pipeline;
mod recognizer;
mod resolver;
mod section;
mod source;

pub use assembler::{
    end_of_month, parse_year_month, start_of_month, transition, Action, Assembler, DraftState,
};
pub use extractor::{
    date_spans, degree_spans, entity_spans, field_spans, institution_spans, year_spans, Span,
    SpanCollector, SpanType,
};
pub use fields::{
    apply_header_fields, extract_email, extract_name, extract_phone, ApplyFn, ExtractFn,
    FieldExtractor, HEADER_FIELDS,
};
pub use normalizer::{canonical_institution, deduplicate};
pub use pipeline::{BatchParseResult, CvParser, EducationExtractor, ParseOutput, ParseStats};
pub use recognizer::{
    CommandRecognizer, EntityLabel, EntityRecognizer, LexiconRecognizer, RecognitionError,
    RecognitionResult, RecognizedEntity,
};
pub use resolver::{
    arbitrate_overlaps, carve_out, dedup_identical, drop_malformed, merge_adjacent, reclassify,
    split_locations, LocationSplitter, PolishLocationSplitter, SpanResolver,
};
pub use section::{find_education_section, Section};
pub use source::{
    normalize_text, normalize_whitespace, remove_unwanted_unicode, CompositeSource,
    DocumentFormat, PlainTextSource, SourceDocument, SourceError, SourceResult, TextSource,
};
