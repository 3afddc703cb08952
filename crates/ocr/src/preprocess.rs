use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use std::io::Cursor;
use tallyscan_core::OcrConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to load image: {0}")]
    Load(#[from] image::ImageError),
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
}

/// Image cleanup ahead of OCR: downscale, grayscale, contrast stretch and an
/// optional fixed-threshold binarization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preprocessor {
    pub max_dimension: u32,
    pub binarize_threshold: Option<u8>,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::from_config(&OcrConfig::default())
    }
}

impl Preprocessor {
    pub fn from_config(config: &OcrConfig) -> Self {
        Self { max_dimension: config.max_dimension, binarize_threshold: config.binarize_threshold }
    }

    /// Decodes image bytes (PNG / JPEG / WEBP / TIFF / BMP) and returns PNG
    /// bytes ready for the recognizer.
    pub fn prepare(&self, data: &[u8]) -> Result<Vec<u8>, PreprocessError> {
        self.prepare_image(image::load_from_memory(data)?)
    }

    /// Same as [`prepare`](Self::prepare) for an already decoded image.
    pub fn prepare_image(&self, img: DynamicImage) -> Result<Vec<u8>, PreprocessError> {
        encode_as_png(self.apply(img))
    }

    fn apply(&self, img: DynamicImage) -> GrayImage {
        let img = downscale(img, self.max_dimension);
        let stretched = contrast_stretch(img.to_luma8());
        match self.binarize_threshold {
            Some(threshold) => binarize(stretched, threshold),
            None => stretched,
        }
    }
}

fn downscale(img: DynamicImage, max_dimension: u32) -> DynamicImage {
    if max_dimension > 0 && (img.width() > max_dimension || img.height() > max_dimension) {
        img.resize(max_dimension, max_dimension, image::imageops::FilterType::Lanczos3)
    } else {
        img
    }
}

/// Maps the darkest pixel to 0 and the brightest to 255. Uniform images are
/// returned unchanged.
fn contrast_stretch(gray: GrayImage) -> GrayImage {
    let (min_px, max_px) = gray
        .pixels()
        .fold((255u8, 0u8), |(mn, mx), p| (mn.min(p[0]), mx.max(p[0])));
    if max_px <= min_px {
        return gray;
    }

    let range = (max_px - min_px) as u32;
    ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        let p = gray.get_pixel(x, y)[0];
        Luma([((p - min_px) as u32 * 255 / range) as u8])
    })
}

/// Pixels below `threshold` become black, everything else white.
fn binarize(mut gray: GrayImage, threshold: u8) -> GrayImage {
    for p in gray.pixels_mut() {
        p[0] = if p[0] < threshold { 0 } else { 255 };
    }
    gray
}

fn encode_as_png(img: GrayImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    DynamicImage::ImageLuma8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}
