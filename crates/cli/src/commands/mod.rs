pub mod config;
pub mod detect;
pub mod parse;

use tallyscan_core::OcrConfig;

#[cfg(feature = "tesseract")]
fn engine(config: &OcrConfig) -> tallyscan_ocr::TesseractRecognizer {
    tallyscan_ocr::TesseractRecognizer::new(config)
}

#[cfg(not(feature = "tesseract"))]
fn engine(_config: &OcrConfig) -> tallyscan_ocr::UnavailableRecognizer {
    tallyscan_ocr::UnavailableRecognizer
}
