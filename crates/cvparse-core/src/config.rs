use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ingest::{CommandRecognizer, EntityRecognizer, LexiconRecognizer};

pub const REFERENCE_DATE_ENV: &str = "CVPARSE_REFERENCE_DATE";
pub const RAW_TEXT_DIR_ENV: &str = "CVPARSE_RAW_TEXT_DIR";
pub const RECOGNIZER_CMD_ENV: &str = "CVPARSE_RECOGNIZER_CMD";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

/// Which entity recognizer backend to use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecognizerConfig {
    #[default]
    Lexicon,
    /// External program reading text on stdin and printing JSON entities.
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Date that "ongoing" markers resolve to (today when unset)
    pub reference_date: Option<NaiveDate>,
    /// Directory for `raw-<name>.txt` dumps of the normalized text
    pub raw_text_dir: Option<PathBuf>,
    pub recognizer: RecognizerConfig,
}

impl ParserConfig {
    /// `<config dir>/cvparse/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cvparse").join("config.json"))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Reads `path`, or the default config file if one exists, then applies
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.is_file() => {
                    tracing::debug!("Loading config from {}", path.display());
                    Self::from_file(&path)?
                }
                _ => Self::default(),
            },
        };
        config.apply_env()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`, which maps a variable name to its
    /// value.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup(REFERENCE_DATE_ENV) {
            let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
                ConfigError::InvalidValue {
                    key: REFERENCE_DATE_ENV.into(),
                    value: value.clone(),
                }
            })?;
            self.reference_date = Some(date);
        }

        if let Some(value) = lookup(RAW_TEXT_DIR_ENV) {
            if !value.is_empty() {
                self.raw_text_dir = Some(PathBuf::from(value));
            }
        }

        if let Some(value) = lookup(RECOGNIZER_CMD_ENV) {
            let mut parts = value.split_whitespace().map(String::from);
            let program = parts.next().ok_or_else(|| ConfigError::InvalidValue {
                key: RECOGNIZER_CMD_ENV.into(),
                value: value.clone(),
            })?;
            self.recognizer = RecognizerConfig::Command {
                program,
                args: parts.collect(),
            };
        }

        Ok(())
    }

    #[must_use]
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    pub fn build_recognizer(&self) -> Box<dyn EntityRecognizer> {
        match &self.recognizer {
            RecognizerConfig::Lexicon => Box::new(LexiconRecognizer::new()),
            RecognizerConfig::Command { program, args } => {
                Box::new(CommandRecognizer::new(program.clone(), args.clone()))
            }
        }
    }
}
