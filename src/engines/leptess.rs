//! Leptess/Tesseract engine implementation
//!
//! Tesseract-based OCR engine. Uses the tesseract-static crate for static
//! linking. Training data comes from `--tessdata-path` when given, otherwise
//! it is downloaded on first use.

use super::download;
use crate::config::Config;
use crate::engine::OcrEngine;
use crate::error::DigitizeError;
use image::RgbImage;
use tesseract_static::tesseract::Tesseract;

/// Tesseract OCR Engine
pub struct LeptessEngine {
    /// Path to tessdata directory
    tessdata_path: String,
    /// Language for recognition
    language: String,
}

impl LeptessEngine {
    /// Create a new Tesseract-based engine
    pub fn new(config: &Config) -> Result<Self, DigitizeError> {
        let language = config.default_language.clone();

        let tessdata_path = match &config.tessdata_path {
            Some(path) => path.clone(),
            None => ensure_tessdata_available(&language)?,
        };

        // Fail at startup rather than on the first request if tessdata is unusable
        Tesseract::new(Some(&tessdata_path), Some(&language)).map_err(|e| {
            DigitizeError::InitializationError(format!("Failed to initialize Tesseract: {}", e))
        })?;

        tracing::info!(
            "Leptess engine initialized (tessdata: {}, language: {})",
            tessdata_path,
            language
        );

        Ok(Self {
            tessdata_path,
            language,
        })
    }
}

impl OcrEngine for LeptessEngine {
    fn name(&self) -> &'static str {
        "leptess"
    }

    fn description(&self) -> &'static str {
        "Tesseract OCR engine - better for noisy/messy images like phone photos"
    }

    fn recognize(&self, image: &RgbImage) -> Result<String, DigitizeError> {
        let (width, height) = image.dimensions();

        // BMP is always supported by leptonica
        let mut bmp_data = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut bmp_data), image::ImageFormat::Bmp)
            .map_err(|e| {
                DigitizeError::RecognitionFailed(format!("Failed to convert to BMP: {}", e))
            })?;

        tracing::debug!(
            "Processing image: {}x{}, BMP size: {} bytes",
            width,
            height,
            bmp_data.len()
        );

        let tess = Tesseract::new(Some(&self.tessdata_path), Some(&self.language)).map_err(|e| {
            DigitizeError::RecognitionFailed(format!("Failed to create Tesseract: {}", e))
        })?;

        let mut tess = tess
            .set_image_from_mem(&bmp_data)
            .map_err(|e| {
                DigitizeError::RecognitionFailed(format!(
                    "Failed to set image ({}x{}, {} bytes): {}",
                    width,
                    height,
                    bmp_data.len(),
                    e
                ))
            })?
            .recognize()
            .map_err(|e| {
                DigitizeError::RecognitionFailed(format!("Failed to recognize text: {}", e))
            })?;

        let text = tess
            .get_text()
            .map_err(|e| DigitizeError::RecognitionFailed(format!("Failed to get text: {}", e)))?;

        Ok(text.trim().to_string())
    }

    fn supported_languages(&self) -> Vec<String> {
        vec![self.language.clone()]
    }
}

/// Ensure tessdata is available, downloading if needed
fn ensure_tessdata_available(language: &str) -> Result<String, DigitizeError> {
    let dir = download::cache_dir(Some("tessdata"))?;
    download::ensure_cached(
        &tessdata_url(language),
        &dir,
        &format!("{}.traineddata", language),
    )?;

    // Tesseract expects the directory, not the file
    dir.to_str()
        .map(|s| s.to_string())
        .ok_or_else(|| DigitizeError::InitializationError("Invalid tessdata path".to_string()))
}

/// Get tessdata download URL for a language
fn tessdata_url(language: &str) -> String {
    format!(
        "https://github.com/tesseract-ocr/tessdata_fast/raw/main/{}.traineddata",
        language
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tessdata_url_uses_fast_models() {
        assert_eq!(
            tessdata_url("deu"),
            "https://github.com/tesseract-ocr/tessdata_fast/raw/main/deu.traineddata"
        );
    }
}
