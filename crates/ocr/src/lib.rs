//! Statement parsing: OCR or text-layer output in, structured transactions out.
//!
//! [`StatementParser`] is the synchronous core. [`StatementIntake`] wraps it
//! with file reading, image preprocessing, OCR and the on-disk result cache.

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static ::regex::Regex {
            static R: ::std::sync::OnceLock<::regex::Regex> = ::std::sync::OnceLock::new();
            R.get_or_init(|| ::regex::Regex::new(&$pat).expect("invalid regex"))
        }
    };
}

pub mod amounts;
pub mod cache;
pub mod dates;
pub mod fields;
pub mod hash;
pub mod intake;
pub mod layout;
pub mod metadata;
pub mod normalize;
pub mod parser;
#[cfg(feature = "pdf")]
pub mod pdf;
pub mod preprocess;
pub mod recognizer;
pub mod rules;
pub mod template;
pub mod validate;
pub mod words;

pub use cache::{CacheError, ResultCache};
pub use hash::{cache_key, sha256_bytes, to_hex};
pub use intake::{IntakeError, IntakeResult, SourceKind, StatementIntake};
pub use normalize::{normalize, NormalizedLine};
pub use parser::{Detection, ParseMode, ParseNotice, ParseOutcome, StatementParser};
pub use preprocess::{PreprocessError, Preprocessor};
pub use recognizer::{MockRecognizer, OcrBackend, OcrError, UnavailableRecognizer};
pub use rules::RuleError;
pub use template::{TableEnd, TableRegion};
pub use words::{parse_tsv, reconstruct_lines, OcrWord};

#[cfg(feature = "tesseract")]
pub use recognizer::tesseract_backend::TesseractRecognizer;
