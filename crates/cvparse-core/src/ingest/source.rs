use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use unicode_normalization::char::decompose_compatible;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Encoding error: {0}")]
    Encoding(String),
}

pub type SourceResult<T> = Result<T, SourceError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    PlainText,
    Markdown,
    Pdf,
    Docx,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "txt" | "text" => Some(Self::PlainText),
            "md" | "markdown" => Some(Self::Markdown),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }
}

/// Normalized text of one document, joined across pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    pub name: Option<String>,
    pub format: DocumentFormat,
    pub text: String,
}

impl SourceDocument {
    #[must_use]
    pub fn new(format: DocumentFormat, text: String) -> Self {
        Self {
            name: None,
            format,
            text,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }
}

#[async_trait::async_trait]
pub trait TextSource: Send + Sync {
    fn supported_formats(&self) -> &[DocumentFormat];

    fn can_load(&self, format: DocumentFormat) -> bool {
        self.supported_formats().contains(&format)
    }

    async fn load_bytes(&self, data: &[u8], format: DocumentFormat)
        -> SourceResult<SourceDocument>;

    async fn load_file(&self, path: &Path) -> SourceResult<SourceDocument> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| SourceError::UnsupportedFormat("no extension".into()))?;

        let format = DocumentFormat::from_extension(ext)
            .ok_or_else(|| SourceError::UnsupportedFormat(ext.into()))?;

        if !self.can_load(format) {
            return Err(SourceError::UnsupportedFormat(format!("{format:?}")));
        }

        let data = tokio::fs::read(path).await?;
        let document = self.load_bytes(&data, format).await?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(String::from)
            .unwrap_or_default();

        Ok(document.with_name(name))
    }
}

pub struct PlainTextSource;

impl PlainTextSource {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for PlainTextSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TextSource for PlainTextSource {
    fn supported_formats(&self) -> &[DocumentFormat] {
        &[DocumentFormat::PlainText, DocumentFormat::Markdown]
    }

    async fn load_bytes(
        &self,
        data: &[u8],
        format: DocumentFormat,
    ) -> SourceResult<SourceDocument> {
        let text =
            String::from_utf8(data.to_vec()).map_err(|e| SourceError::Encoding(e.to_string()))?;

        Ok(SourceDocument::new(format, normalize_text(&text)))
    }
}

/// Whitespace normalization followed by removal of unwanted characters.
pub fn normalize_text(text: &str) -> String {
    remove_unwanted_unicode(&normalize_whitespace(text))
}

/// Collapses runs of spaces and tabs, strips every line and the whole text.
pub fn normalize_whitespace(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    text.lines()
        .map(|line| {
            line.split([' ', '\t'])
                .filter(|w| !w.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

const KEPT_SYMBOLS: &[char] = &['•', '–', '—', '…', '«', '»', '©', '®', '°'];

/// Keeps ASCII, Latin letters with diacritics and a few typographic symbols.
/// Latin ligatures and fullwidth forms are folded to their plain letters
/// first. Control characters (other than newline and tab), emoji and other
/// scripts are dropped.
pub fn remove_unwanted_unicode(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    for c in text.chars() {
        if is_compatibility_latin(c) {
            decompose_compatible(c, |d| folded.push(d));
        } else {
            folded.push(c);
        }
    }

    folded
        .chars()
        .filter(|&c| {
            if c.is_ascii() {
                return !c.is_ascii_control() || c == '\n' || c == '\t';
            }
            is_latin_letter(c) || KEPT_SYMBOLS.contains(&c)
        })
        .collect()
}

fn is_latin_letter(c: char) -> bool {
    matches!(
        u32::from(c),
        0x00C0..=0x00D6
            | 0x00D8..=0x00F6
            | 0x00F8..=0x024F
            | 0x0250..=0x02AF
            | 0x1E00..=0x1EFF
            | 0x2C60..=0x2C7F
            | 0xA720..=0xA7FF
            | 0xAB30..=0xAB6F
    )
}

/// Latin ligatures (`ﬁ`, `ﬂ`, ...) and fullwidth Latin letters and digits.
fn is_compatibility_latin(c: char) -> bool {
    matches!(
        u32::from(c),
        0xFB00..=0xFB06 | 0xFF10..=0xFF19 | 0xFF21..=0xFF3A | 0xFF41..=0xFF5A
    )
}

pub struct CompositeSource {
    sources: Vec<Box<dyn TextSource>>,
}

impl CompositeSource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: Box<dyn TextSource>) -> Self {
        self.sources.push(source);
        self
    }

    fn find_source(&self, format: DocumentFormat) -> Option<&dyn TextSource> {
        self.sources
            .iter()
            .find(|s| s.can_load(format))
            .map(AsRef::as_ref)
    }
}

impl Default for CompositeSource {
    fn default() -> Self {
        Self::new().with_source(Box::new(PlainTextSource::new()))
    }
}

#[async_trait::async_trait]
impl TextSource for CompositeSource {
    fn supported_formats(&self) -> &[DocumentFormat] {
        &[
            DocumentFormat::PlainText,
            DocumentFormat::Markdown,
            DocumentFormat::Pdf,
            DocumentFormat::Docx,
        ]
    }

    fn can_load(&self, format: DocumentFormat) -> bool {
        self.find_source(format).is_some()
    }

    async fn load_bytes(
        &self,
        data: &[u8],
        format: DocumentFormat,
    ) -> SourceResult<SourceDocument> {
        let source = self
            .find_source(format)
            .ok_or_else(|| SourceError::UnsupportedFormat(format!("{format:?}")))?;

        source.load_bytes(data, format).await
    }
}
