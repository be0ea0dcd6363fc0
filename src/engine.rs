use crate::error::DigitizeError;
use image::RgbImage;

/// Trait that all recognition engines must implement
///
/// Engines own whatever model state they need. They are built once at
/// startup and shared immutably between requests.
pub trait OcrEngine: Send + Sync {
    /// Returns the engine identifier (e.g., "ocrs", "leptess")
    fn name(&self) -> &'static str;

    /// Returns a human-readable description of the engine
    fn description(&self) -> &'static str;

    /// Recognize the text in an RGB image
    fn recognize(&self, image: &RgbImage) -> Result<String, DigitizeError>;

    /// Get supported languages
    fn supported_languages(&self) -> Vec<String>;
}
