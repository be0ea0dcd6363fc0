//! Materialize the pipeline output for recognition backends
//!
//! Backends take three-channel RGB images, so grayscale and binary results
//! are expanded before leaving the pipeline. Transported images are JPEG,
//! base64 encoded.

use crate::error::DigitizeError;
use base64::Engine as _;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use std::io::Cursor;

/// Expand a single-channel image to RGB with equal channels
pub fn to_rgb(image: &GrayImage) -> RgbImage {
    DynamicImage::ImageLuma8(image.clone()).into_rgb8()
}

/// Encode as baseline JPEG
pub fn encode_jpeg(image: &RgbImage) -> Result<Vec<u8>, DigitizeError> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)
        .map_err(|e| DigitizeError::Encode(format!("JPEG encoding failed: {}", e)))?;
    Ok(buffer)
}

/// JPEG bytes, base64 encoded
pub fn encode_jpeg_base64(image: &RgbImage) -> Result<String, DigitizeError> {
    let jpeg = encode_jpeg(image)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(jpeg))
}

/// `data:image/jpeg;base64,...` URL for previews
pub fn jpeg_data_url(image: &RgbImage) -> Result<String, DigitizeError> {
    Ok(format!("data:image/jpeg;base64,{}", encode_jpeg_base64(image)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    #[test]
    fn test_to_rgb_replicates_intensity() {
        let mut gray = GrayImage::from_pixel(4, 3, Luma([255]));
        gray.put_pixel(1, 2, Luma([0]));

        let rgb = to_rgb(&gray);

        assert_eq!(rgb.dimensions(), (4, 3));
        assert_eq!(rgb.get_pixel(1, 2), &Rgb([0, 0, 0]));
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_jpeg_payload_decodes_back() {
        let rgb = to_rgb(&GrayImage::from_pixel(16, 8, Luma([200])));

        let encoded = encode_jpeg_base64(&rgb).unwrap();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();

        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 8));
    }

    #[test]
    fn test_data_url_prefix() {
        let rgb = to_rgb(&GrayImage::from_pixel(2, 2, Luma([10])));
        assert!(jpeg_data_url(&rgb)
            .unwrap()
            .starts_with("data:image/jpeg;base64,/9j/"));
    }
}
