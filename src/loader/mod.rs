//! Decode uploaded files into RGB images
//!
//! Channel order is RGB everywhere in this crate, including the images
//! handed to recognition engines.

mod pdf;

use crate::error::DigitizeError;
use image::{DynamicImage, GenericImageView, ImageReader};
use std::io::Cursor;
use std::path::Path;

/// Where an encoded image comes from
#[derive(Debug, Clone, Copy)]
pub enum ImageSource<'a> {
    Path(&'a Path),
    Bytes(&'a [u8]),
}

/// Decode an image container (PNG, JPEG, and the other formats the `image`
/// crate reads) or the first page of a PDF.
///
/// Images with zero width or height are returned as-is; use
/// [`ensure_not_empty`] at the boundary to reject them.
pub fn load(source: ImageSource<'_>) -> Result<DynamicImage, DigitizeError> {
    match source {
        ImageSource::Path(path) => {
            let bytes = std::fs::read(path).map_err(|e| {
                DigitizeError::Decode(format!("failed to read {}: {}", path.display(), e))
            })?;
            decode(&bytes)
        }
        ImageSource::Bytes(bytes) => decode(bytes),
    }
}

/// Reject zero-sized images
pub fn ensure_not_empty(image: DynamicImage) -> Result<DynamicImage, DigitizeError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(DigitizeError::EmptyImage);
    }
    Ok(image)
}

fn decode(bytes: &[u8]) -> Result<DynamicImage, DigitizeError> {
    if bytes.is_empty() {
        return Err(DigitizeError::Decode("empty upload".to_string()));
    }

    let image = if pdf::is_pdf(bytes) {
        pdf::first_page_image(bytes)?
    } else {
        ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| DigitizeError::Decode(format!("failed to sniff format: {}", e)))?
            .decode()
            .map_err(|e| DigitizeError::Decode(e.to_string()))?
    };

    tracing::debug!(
        width = image.width(),
        height = image.height(),
        color = ?image.color(),
        "Decoded image"
    );

    Ok(DynamicImage::ImageRgb8(image.into_rgb8()))
}
