//! Configuration for the parser, the result cache and the OCR front end.
//!
//! Every section is `#[serde(default)]`, so a config file only needs the keys
//! it overrides.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::rules::{self, HeaderKeyword, LineRule, SignRule};

/// Upper bound for `cache.ttl_days` (ten years).
pub const MAX_CACHE_TTL_DAYS: u64 = 3650;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub parser: ParserConfig,
    pub cache: CacheConfig,
    pub ocr: OcrConfig,
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.parser;
        if p.min_header_keywords < 2 {
            return Err(ConfigError::Invalid(
                "parser.min_header_keywords must be at least 2".to_string(),
            ));
        }
        if p.max_header_tokens < p.min_header_keywords {
            return Err(ConfigError::Invalid(
                "parser.max_header_tokens must not be below parser.min_header_keywords".to_string(),
            ));
        }
        if p.table_end_blank_run == 0 {
            return Err(ConfigError::Invalid("parser.table_end_blank_run must be positive".to_string()));
        }
        if p.header_keywords.iter().any(|k| k.keyword.trim().is_empty()) {
            return Err(ConfigError::Invalid("parser.header_keywords contains an empty keyword".to_string()));
        }
        if self.cache.ttl_days > MAX_CACHE_TTL_DAYS {
            return Err(ConfigError::Invalid(format!(
                "cache.ttl_days must not exceed {MAX_CACHE_TTL_DAYS}"
            )));
        }
        if !(0.0..=100.0).contains(&self.ocr.min_word_confidence) {
            return Err(ConfigError::Invalid("ocr.min_word_confidence must be within 0..=100".to_string()));
        }
        Ok(())
    }
}

/// Tuning knobs and rule tables for the text pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ParserConfig {
    /// Matched header cells needed before a line counts as a table header.
    pub min_header_keywords: usize,
    /// Upper bound on cells in a header line.
    pub max_header_tokens: usize,
    /// Consecutive blank lines that terminate the table body.
    pub table_end_blank_run: usize,
    /// How far (in layout columns) a date may sit outside the date column.
    pub date_column_tolerance: usize,
    /// Minimum length of an alphanumeric reference token.
    pub reference_min_len: usize,
    /// Lines scanned from the top for metadata when no table header bounds them.
    pub metadata_scan_lines: usize,
    /// Lines scanned from the bottom for page markers.
    pub footer_scan_lines: usize,
    /// Anchor for two-digit and missing years. Defaults to the statement
    /// period end, then today.
    pub reference_date: Option<NaiveDate>,
    pub header_keywords: Vec<HeaderKeyword>,
    pub footer_rules: Vec<LineRule>,
    pub noise_rules: Vec<LineRule>,
    pub sign_rules: Vec<SignRule>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            min_header_keywords: 2,
            max_header_tokens: 16,
            table_end_blank_run: 2,
            date_column_tolerance: 12,
            reference_min_len: 6,
            metadata_scan_lines: 10,
            footer_scan_lines: 5,
            reference_date: None,
            header_keywords: rules::default_header_keywords(),
            footer_rules: rules::default_footer_rules(),
            noise_rules: rules::default_noise_rules(),
            sign_rules: rules::default_sign_rules(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Defaults to the platform cache directory.
    pub dir: Option<PathBuf>,
    pub ttl_days: u64,
    pub max_bytes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
            ttl_days: 1,
            max_bytes: 200 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OcrConfig {
    /// Tesseract language code(s), e.g. `eng` or `eng+deu`.
    pub language: String,
    pub data_path: Option<String>,
    /// Longest image side after downscaling.
    pub max_dimension: u32,
    /// Fixed binarization threshold; `None` keeps the contrast-stretched grayscale.
    pub binarize_threshold: Option<u8>,
    /// Words at or below this confidence (0-100) are dropped during layout reconstruction.
    pub min_word_confidence: f32,
    /// Upload size limit in bytes.
    pub max_input_bytes: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            data_path: None,
            max_dimension: 2800,
            binarize_threshold: Some(128),
            min_word_confidence: 10.0,
            max_input_bytes: 5 * 1024 * 1024,
        }
    }
}
