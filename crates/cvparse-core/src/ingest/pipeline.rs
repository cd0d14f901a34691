use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::task::JoinSet;

use super::assembler::Assembler;
use super::extractor::{Span, SpanCollector};
use super::fields::{apply_header_fields, FieldExtractor, HEADER_FIELDS};
use super::normalizer::deduplicate;
use super::recognizer::{EntityRecognizer, LexiconRecognizer};
use super::resolver::SpanResolver;
use super::section::{find_education_section, Section};
use super::source::{CompositeSource, DocumentFormat, SourceDocument, TextSource};
use crate::config::ParserConfig;
use crate::cv::CvDocument;
use crate::error::{Error, Result};
use crate::record::EducationRecord;

/// Section isolation, span collection and resolution, assembly and
/// deduplication.
pub struct EducationExtractor {
    collector: SpanCollector,
    resolver: SpanResolver,
}

impl EducationExtractor {
    #[must_use]
    pub fn new(recognizer: Box<dyn EntityRecognizer>) -> Self {
        Self {
            collector: SpanCollector::new(recognizer),
            resolver: SpanResolver::default(),
        }
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: SpanResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn recognizer(&self) -> &dyn EntityRecognizer {
        self.collector.recognizer()
    }

    /// Resolved span timeline of an already isolated section.
    pub fn resolve_spans(&self, section_text: &str) -> Vec<Span> {
        let spans = self.collector.collect(section_text);
        self.resolver.resolve(spans, section_text)
    }

    /// The education section and its resolved spans.
    pub fn inspect(&self, text: &str) -> Option<(Section, Vec<Span>)> {
        let section = find_education_section(text)?;
        let spans = self.resolve_spans(&section.content);
        Some((section, spans))
    }

    /// `None` when the text has no education section.
    pub fn extract(&self, text: &str, reference_date: NaiveDate) -> Option<Vec<EducationRecord>> {
        let (_, spans) = self.inspect(text)?;
        let records = Assembler::assemble(reference_date, &spans);
        Some(deduplicate(records))
    }
}

impl Default for EducationExtractor {
    fn default() -> Self {
        Self::new(Box::new(LexiconRecognizer::new()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParseStats {
    pub documents: usize,
    pub sections_found: usize,
    pub records: usize,
    pub duration_ms: u64,
}

#[derive(Debug)]
pub struct ParseOutput {
    pub name: String,
    pub cv: CvDocument,
    pub raw_text_path: Option<PathBuf>,
    pub stats: ParseStats,
}

pub struct CvParser {
    source: Box<dyn TextSource>,
    education: EducationExtractor,
    fields: Vec<FieldExtractor>,
    reference_date: Option<NaiveDate>,
    raw_text_dir: Option<PathBuf>,
}

impl CvParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: Box::new(CompositeSource::default()),
            education: EducationExtractor::default(),
            fields: HEADER_FIELDS.to_vec(),
            reference_date: None,
            raw_text_dir: None,
        }
    }

    #[must_use]
    pub fn from_config(config: &ParserConfig) -> Self {
        Self {
            education: EducationExtractor::new(config.build_recognizer()),
            reference_date: config.reference_date,
            raw_text_dir: config.raw_text_dir.clone(),
            ..Self::new()
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: Box<dyn TextSource>) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub fn with_education(mut self, education: EducationExtractor) -> Self {
        self.education = education;
        self
    }

    #[must_use]
    pub fn with_fields(mut self, fields: Vec<FieldExtractor>) -> Self {
        self.fields = fields;
        self
    }

    #[must_use]
    pub const fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    #[must_use]
    pub fn with_raw_text_dir(mut self, dir: PathBuf) -> Self {
        self.raw_text_dir = Some(dir);
        self
    }

    pub const fn education(&self) -> &EducationExtractor {
        &self.education
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    pub fn parse_text(&self, text: &str) -> (CvDocument, ParseStats) {
        let start = std::time::Instant::now();
        let mut cv = CvDocument::placeholder();

        apply_header_fields(&mut cv, text, self.education.recognizer(), &self.fields);

        let education = self.education.extract(text, self.reference_date());
        let stats = ParseStats {
            documents: 1,
            sections_found: usize::from(education.is_some()),
            records: education.as_ref().map_or(0, Vec::len),
            duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        cv.education = education.unwrap_or_default();

        (cv, stats)
    }

    pub fn parse_document(&self, document: &SourceDocument) -> ParseOutput {
        let name = document.name.clone().unwrap_or_default();
        let (cv, stats) = self.parse_text(&document.text);

        tracing::info!(
            "Parsed {}: {} education records",
            if name.is_empty() { "<text>" } else { &name },
            stats.records
        );

        ParseOutput {
            name,
            cv,
            raw_text_path: None,
            stats,
        }
    }

    pub async fn parse_file(&self, path: &Path) -> Result<ParseOutput> {
        let (document, raw_text_path) = self.load(path).await?;
        let mut output = self.parse_document(&document);
        output.raw_text_path = raw_text_path;
        Ok(output)
    }

    async fn load(&self, path: &Path) -> Result<(SourceDocument, Option<PathBuf>)> {
        let document = self.source.load_file(path).await?;

        let raw_text_path = match &self.raw_text_dir {
            Some(dir) => Some(dump_raw_text(dir, &document).await?),
            None => None,
        };

        Ok((document, raw_text_path))
    }

    /// Loads on the async runtime, parses on the blocking pool.
    async fn parse_file_pooled(self: Arc<Self>, path: PathBuf) -> Result<ParseOutput> {
        let (document, raw_text_path) = self.load(&path).await?;
        let mut output =
            tokio::task::spawn_blocking(move || self.parse_document(&document)).await?;
        output.raw_text_path = raw_text_path;
        Ok(output)
    }

    /// Parses every file concurrently, one task per document.
    pub async fn parse_files(self: &Arc<Self>, paths: Vec<PathBuf>) -> BatchParseResult {
        let mut tasks = JoinSet::new();
        for path in paths {
            let parser = Arc::clone(self);
            tasks.spawn(async move {
                let name = path.to_string_lossy().to_string();
                (name, parser.parse_file_pooled(path).await)
            });
        }

        let mut result = BatchParseResult::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(output))) => result.add_success(output),
                Ok((name, Err(e))) => {
                    tracing::warn!("Failed to parse {}: {}", name, e);
                    result.add_failure(name, e);
                }
                Err(e) => tracing::error!("Parse task failed: {}", e),
            }
        }

        result.successful.sort_by(|a, b| a.name.cmp(&b.name));
        result.failed.sort_by(|a, b| a.0.cmp(&b.0));
        result
    }

    /// Parses every file in `dir` whose format the source can load.
    pub async fn parse_directory(self: &Arc<Self>, dir: &Path) -> Result<BatchParseResult> {
        let mut paths = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let supported = path
                .extension()
                .and_then(|e| e.to_str())
                .and_then(DocumentFormat::from_extension)
                .is_some_and(|format| self.source.can_load(format));

            if path.is_file() && supported {
                paths.push(path);
            } else {
                tracing::debug!("Skipping {}", path.display());
            }
        }
        paths.sort();

        Ok(self.parse_files(paths).await)
    }
}

impl Default for CvParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes the normalized text to `raw-<name>.txt` in `dir`.
async fn dump_raw_text(dir: &Path, document: &SourceDocument) -> Result<PathBuf> {
    let name = document.name.as_deref().unwrap_or("document");
    let path = dir.join(format!("raw-{name}.txt"));

    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(&path, &document.text).await?;
    tracing::debug!("Raw text written to {}", path.display());

    Ok(path)
}

pub struct BatchParseResult {
    pub successful: Vec<ParseOutput>,
    pub failed: Vec<(String, Error)>,
    pub total_stats: ParseStats,
}

impl BatchParseResult {
    #[must_use]
    pub fn new() -> Self {
        Self {
            successful: Vec::new(),
            failed: Vec::new(),
            total_stats: ParseStats::default(),
        }
    }

    fn add_success(&mut self, output: ParseOutput) {
        self.total_stats.documents += output.stats.documents;
        self.total_stats.sections_found += output.stats.sections_found;
        self.total_stats.records += output.stats.records;
        self.total_stats.duration_ms += output.stats.duration_ms;
        self.successful.push(output);
    }

    fn add_failure(&mut self, path: String, error: Error) {
        self.failed.push((path, error));
    }

    pub fn success_count(&self) -> usize {
        self.successful.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }
}

impl Default for BatchParseResult {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::UNKNOWN;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn extract(text: &str) -> Option<Vec<EducationRecord>> {
        EducationExtractor::default().extract(text, date(2024, 3, 15))
    }

    #[test]
    fn test_institution_with_city_and_field() {
        let text = "Jan Kowalski\nEdukacja\n\
                    Politechnika Warszawska w Warszawie kierunek Informatyka 2010 - 2015\n\
                    Umiejętności\nRust";

        let records = extract(text).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].institution, "Politechnika Warszawska w Warszawie");
        assert!(records[0].field_of_study.contains("Informatyka"));
        assert_eq!(records[0].degree, UNKNOWN);
        assert_eq!(records[0].start_date, date(2010, 1, 1));
        assert_eq!(records[0].end_date, Some(date(2015, 12, 31)));
    }

    #[test]
    fn test_section_without_institution_or_degree() {
        let text = "Edukacja\nKurs online z fotografii 2019\nHobby\nszachy";

        assert_eq!(extract(text), Some(Vec::new()));
    }

    #[test]
    fn test_no_education_section() {
        assert_eq!(extract("Doświadczenie\nFirma X 2010 - 2015"), None);
    }

    #[test]
    fn test_same_school_in_two_blocks_is_merged() {
        let text = "Wykształcenie\n\
                    Liceum Ogólnokształcące nr 1 w Krakowie\n2005 - 2007\n\
                    Liceum Ogólnokształcące nr 1 w Krakowie\n2007 - 2008";

        let records = extract(text).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].start_date, date(2005, 1, 1));
        assert_eq!(records[0].end_date, Some(date(2008, 12, 31)));
    }

    #[test]
    fn test_two_degrees_at_one_university() {
        let text = "Edukacja\nUniwersytet Warszawski\n\
                    Licencjat Ekonomia 2010 - 2013\n\
                    Magister Finanse 2013 - 2015";

        let records = extract(text).unwrap();

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.institution == "Uniwersytet Warszawski"));
        assert_eq!(records[0].degree, "Licencjat");
        assert_eq!(records[0].field_of_study, "Ekonomia");
        assert_eq!(records[0].start_date, date(2010, 1, 1));
        assert_eq!(records[0].end_date, Some(date(2013, 12, 31)));
        assert_eq!(records[1].degree, "Magister");
        assert_eq!(records[1].field_of_study, "Finanse");
        assert_eq!(records[1].start_date, date(2013, 1, 1));
        assert_eq!(records[1].end_date, Some(date(2015, 12, 31)));
    }

    #[test]
    fn test_numeric_dates_after_institution() {
        let records = extract("Edukacja\nPolitechnika Gdańska 09.2015 - 06.2019").unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].institution, "Politechnika Gdańska");
        assert_eq!(records[0].start_date, date(2015, 9, 1));
        assert_eq!(records[0].end_date, Some(date(2019, 6, 30)));
    }

    #[test]
    fn test_month_names_after_institution() {
        let text = "Edukacja\nUniwersytet Gdański Październik 2013 - Czerwiec 2015";

        let records = extract(text).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].institution, "Uniwersytet Gdański");
        assert_eq!(records[0].start_date, date(2013, 10, 1));
        assert_eq!(records[0].end_date, Some(date(2015, 6, 30)));
    }

    #[test]
    fn test_ongoing_study_ends_on_reference_date() {
        let text = "Education\nPolitechnika Gdańska\nmagister 2022 - obecnie";

        let records = extract(text).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].end_date, Some(date(2024, 3, 15)));
    }

    #[test]
    fn test_parse_text_fills_header_and_education() {
        let parser = CvParser::new().with_reference_date(date(2024, 3, 15));
        let text = "Anna Nowak\nanna.nowak@example.com\n+48 501 222 333\n\
                    Edukacja\nUniwersytet Jagielloński 2012 - 2017";

        let (cv, stats) = parser.parse_text(text);

        assert_eq!(cv.personal_info.full_name, "Anna Nowak");
        assert_eq!(cv.personal_info.contact.email, "anna.nowak@example.com");
        assert_eq!(cv.education.len(), 1);
        assert_eq!(stats.sections_found, 1);
        assert_eq!(stats.records, 1);
    }

    #[tokio::test]
    async fn test_parse_file_dumps_raw_text() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("cv.txt");
        let raw_dir = dir.path().join("raw");
        std::fs::write(&input, "Edukacja\n  Politechnika   Poznańska  2015 - 2019 \n").unwrap();

        let parser = CvParser::new()
            .with_reference_date(date(2024, 3, 15))
            .with_raw_text_dir(raw_dir.clone());
        let output = parser.parse_file(&input).await.unwrap();

        assert_eq!(output.name, "cv.txt");
        assert_eq!(output.raw_text_path, Some(raw_dir.join("raw-cv.txt.txt")));
        let raw = std::fs::read_to_string(raw_dir.join("raw-cv.txt.txt")).unwrap();
        assert_eq!(raw, "Edukacja\nPolitechnika Poznańska 2015 - 2019");
        assert_eq!(output.cv.education[0].institution, "Politechnika Poznańska");
    }

    #[tokio::test]
    async fn test_parse_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "Edukacja\nAkademia Morska 2001 - 2005").unwrap();
        std::fs::write(dir.path().join("b.md"), "# CV\nbrak sekcji").unwrap();
        std::fs::write(dir.path().join("c.txt"), [0xff, 0xfe, 0x00]).unwrap();
        std::fs::write(dir.path().join("d.pdf"), b"%PDF-1.7").unwrap();

        let parser = Arc::new(CvParser::new().with_reference_date(date(2024, 3, 15)));
        let result = parser.parse_directory(dir.path()).await.unwrap();

        assert_eq!(result.success_count(), 2);
        assert_eq!(result.failure_count(), 1);
        assert_eq!(result.successful[0].name, "a.txt");
        assert_eq!(result.total_stats.documents, 2);
        assert_eq!(result.total_stats.sections_found, 1);
        assert_eq!(result.total_stats.records, 1);
        assert!(matches!(result.failed[0].1, Error::Source(_)));
    }
}
