use thiserror::Error;

use crate::words::OcrWord;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("Tesseract not available, build with the `tesseract` feature")]
    NotAvailable,
}

/// Abstraction over an OCR engine.
///
/// Implementations receive preprocessed PNG bytes. Engines that can report
/// word boxes should override [`OcrBackend::recognize_words`] so the intake
/// can rebuild column spacing; the plain text path is the fallback.
pub trait OcrBackend: Send + Sync {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError>;

    fn recognize_words(&self, _image_bytes: &[u8]) -> Result<Option<Vec<OcrWord>>, OcrError> {
        Ok(None)
    }
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns preset output regardless of the image.
#[derive(Debug, Clone, Default)]
pub struct MockRecognizer {
    pub text: String,
    pub words: Option<Vec<OcrWord>>,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), words: None }
    }

    pub fn with_words(words: Vec<OcrWord>) -> Self {
        Self { text: String::new(), words: Some(words) }
    }
}

impl OcrBackend for MockRecognizer {
    fn recognize(&self, _image_bytes: &[u8]) -> Result<String, OcrError> {
        Ok(self.text.clone())
    }

    fn recognize_words(&self, _image_bytes: &[u8]) -> Result<Option<Vec<OcrWord>>, OcrError> {
        Ok(self.words.clone())
    }
}

/// Stand-in for builds without an engine: every image fails with
/// [`OcrError::NotAvailable`], text and PDF input still work.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableRecognizer;

impl OcrBackend for UnavailableRecognizer {
    fn recognize(&self, _image_bytes: &[u8]) -> Result<String, OcrError> {
        Err(OcrError::NotAvailable)
    }
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrBackend, OcrError};
    use crate::words::{parse_tsv, OcrWord};
    use leptess::LepTess;
    use tallyscan_core::OcrConfig;

    pub struct TesseractRecognizer {
        data_path: Option<String>,
        lang: String,
    }

    impl TesseractRecognizer {
        pub fn new(config: &OcrConfig) -> Self {
            Self { data_path: config.data_path.clone(), lang: config.language.clone() }
        }

        fn load(&self, image_bytes: &[u8]) -> Result<LepTess, OcrError> {
            let mut lt = LepTess::new(self.data_path.as_deref(), &self.lang)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_image_from_mem(image_bytes)
                .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
            Ok(lt)
        }
    }

    impl OcrBackend for TesseractRecognizer {
        fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
            self.load(image_bytes)?
                .get_utf8_text()
                .map_err(|e| OcrError::Engine(e.to_string()))
        }

        fn recognize_words(&self, image_bytes: &[u8]) -> Result<Option<Vec<OcrWord>>, OcrError> {
            let tsv = self
                .load(image_bytes)?
                .get_tsv_text(0)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            Ok(Some(parse_tsv(&tsv)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_returns_preset_text() {
        let r = MockRecognizer::new("Date  Description  Amount");
        assert_eq!(r.recognize(b"fake image data").unwrap(), "Date  Description  Amount");
        assert!(r.recognize_words(b"").unwrap().is_none());
    }

    #[test]
    fn mock_words_are_reported() {
        let word = OcrWord {
            text: "Date".to_string(),
            left: 0,
            top: 0,
            width: 40,
            height: 12,
            confidence: 90.0,
            block: 1,
            paragraph: 1,
            line: 1,
        };
        let r = MockRecognizer::with_words(vec![word.clone()]);
        assert_eq!(r.recognize_words(b"anything").unwrap(), Some(vec![word]));
        assert_eq!(r.recognize(b"anything").unwrap(), "");
    }

    #[test]
    fn unavailable_backend_reports_it() {
        assert!(matches!(UnavailableRecognizer.recognize(b"png"), Err(OcrError::NotAvailable)));
        assert!(UnavailableRecognizer.recognize_words(b"png").unwrap().is_none());
    }

    #[test]
    fn backend_is_object_safe() {
        let backend: Box<dyn OcrBackend> = Box::new(MockRecognizer::new("hello"));
        assert_eq!(backend.recognize(b"").unwrap(), "hello");
    }
}
