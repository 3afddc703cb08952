use std::path::Path;
use tallyscan_core::{DocumentType, OcrConfig, RawDocumentText};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::ResultCache;
use crate::hash;
#[cfg(feature = "pdf")]
use crate::pdf;
use crate::parser::{ParseOutcome, StatementParser};
use crate::preprocess::{PreprocessError, Preprocessor};
use crate::recognizer::{OcrBackend, OcrError};
use crate::words::reconstruct_lines;

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("File is {size} bytes, above the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("Image preprocessing failed: {0}")]
    Preprocess(#[from] PreprocessError),
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
    #[error("PDF text extraction failed: {0}")]
    PdfText(String),
    #[error("PDF has no text layer and no page images OCR can read")]
    NoTextLayer,
}

/// How a file's bytes become text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Text,
    Image,
    Pdf,
}

impl SourceKind {
    /// Maps a file extension (any case, leading dot optional) to its source.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "txt" | "text" | "csv" => Some(SourceKind::Text),
            "png" | "jpg" | "jpeg" | "webp" | "tif" | "tiff" | "bmp" => Some(SourceKind::Image),
            "pdf" => Some(SourceKind::Pdf),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IntakeResult {
    /// Hex SHA-256 over the file bytes, document type and parser config.
    pub key: String,
    pub from_cache: bool,
    pub outcome: ParseOutcome,
}

/// Orchestrates: size check → cache lookup → text extraction → parse → cache store.
pub struct StatementIntake<R: OcrBackend> {
    recognizer: R,
    parser: StatementParser,
    ocr: OcrConfig,
    cache: Option<ResultCache>,
}

impl<R: OcrBackend> StatementIntake<R> {
    pub fn new(recognizer: R, parser: StatementParser, ocr: OcrConfig) -> Self {
        Self { recognizer, parser, ocr, cache: None }
    }

    pub fn with_cache(mut self, cache: ResultCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn parser(&self) -> &StatementParser {
        &self.parser
    }

    /// Parse a statement file on disk.
    pub async fn process_file(&self, path: &Path, document_type: DocumentType) -> Result<IntakeResult, IntakeError> {
        let (bytes, ext) = self.read_file(path).await?;
        self.process_bytes(&bytes, &ext, document_type).await
    }

    /// Parse uploaded bytes. `ext` selects the text source.
    pub async fn process_bytes(
        &self,
        data: &[u8],
        ext: &str,
        document_type: DocumentType,
    ) -> Result<IntakeResult, IntakeError> {
        self.check_size(data.len() as u64)?;
        let source = SourceKind::from_extension(ext).ok_or_else(|| IntakeError::UnsupportedFormat(ext.to_string()))?;

        let key = hash::cache_key(data, document_type, self.parser.config_digest());
        if let Some(outcome) = self.cache.as_ref().and_then(|c| c.get(&key)) {
            info!(%key, "served from cache");
            return Ok(IntakeResult { key, from_cache: true, outcome });
        }

        let text = self.extract(data, source)?;
        let outcome = self.parser.parse(&text, document_type);

        if let Some(cache) = &self.cache {
            if let Err(error) = cache.set(&key, &outcome) {
                warn!(%key, %error, "failed to store parse result in cache");
            }
        }

        Ok(IntakeResult { key, from_cache: false, outcome })
    }

    /// Text of a file without parsing it.
    pub async fn text_of_file(&self, path: &Path) -> Result<RawDocumentText, IntakeError> {
        let (bytes, ext) = self.read_file(path).await?;
        let source = SourceKind::from_extension(&ext).ok_or(IntakeError::UnsupportedFormat(ext))?;
        self.extract(&bytes, source)
    }

    async fn read_file(&self, path: &Path) -> Result<(Vec<u8>, String), IntakeError> {
        let size = tokio::fs::metadata(path).await?.len();
        self.check_size(size)?;
        let bytes = tokio::fs::read(path).await?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_lowercase();
        Ok((bytes, ext))
    }

    fn check_size(&self, size: u64) -> Result<(), IntakeError> {
        let limit = self.ocr.max_input_bytes;
        if size > limit {
            return Err(IntakeError::TooLarge { size, limit });
        }
        Ok(())
    }

    fn extract(&self, data: &[u8], source: SourceKind) -> Result<RawDocumentText, IntakeError> {
        debug!(?source, bytes = data.len(), "extracting text");
        match source {
            SourceKind::Text => Ok(RawDocumentText::from_bytes(data)),
            SourceKind::Image => self.recognize_image(data),
            SourceKind::Pdf => self.pdf_text(data),
        }
    }

    fn recognize_image(&self, data: &[u8]) -> Result<RawDocumentText, IntakeError> {
        let image = Preprocessor::from_config(&self.ocr).prepare(data)?;
        self.recognize_prepared(&image)
    }

    fn recognize_prepared(&self, image: &[u8]) -> Result<RawDocumentText, IntakeError> {
        if let Some(words) = self.recognizer.recognize_words(image)? {
            let text = reconstruct_lines(&words, self.ocr.min_word_confidence);
            if !text.is_blank() {
                debug!(words = words.len(), "rebuilt layout from word boxes");
                return Ok(text);
            }
        }
        Ok(RawDocumentText::new(self.recognizer.recognize(image)?))
    }

    /// The text layer when it has content, otherwise OCR over the page
    /// images. Pages are separated by form feeds.
    #[cfg(feature = "pdf")]
    fn pdf_text(&self, data: &[u8]) -> Result<RawDocumentText, IntakeError> {
        match pdf::text_layer(data) {
            Ok(text) if !text.is_blank() => return Ok(text),
            Ok(_) => debug!("PDF text layer is empty"),
            Err(error) => warn!(%error, "PDF text layer unreadable, trying page images"),
        }

        let pages = pdf::page_images(data)?;
        if pages.is_empty() {
            return Err(IntakeError::NoTextLayer);
        }
        info!(pages = pages.len(), "running OCR on scanned PDF pages");

        let preprocessor = Preprocessor::from_config(&self.ocr);
        let mut text = String::new();
        for (i, page) in pages.into_iter().enumerate() {
            if i > 0 {
                text.push('\u{000c}');
            }
            let image = preprocessor.prepare_image(page)?;
            text.push_str(self.recognize_prepared(&image)?.as_str());
        }
        Ok(RawDocumentText::new(text))
    }

    #[cfg(not(feature = "pdf"))]
    fn pdf_text(&self, _data: &[u8]) -> Result<RawDocumentText, IntakeError> {
        Err(IntakeError::UnsupportedFormat("pdf (built without the `pdf` feature)".to_string()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
