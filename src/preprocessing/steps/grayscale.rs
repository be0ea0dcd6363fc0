use image::{DynamicImage, GrayImage};

/// Convert image to grayscale (Rec. 709 luma weights)
///
/// Already single-channel 8-bit input passes through unchanged.
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    image.to_luma8()
}

pub fn apply(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(_) => image,
        other => DynamicImage::ImageLuma8(to_grayscale(&other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};

    #[test]
    fn test_grayscale_weights_green_heaviest() {
        let mut img = RgbImage::new(3, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 255, 0]));
        img.put_pixel(2, 0, Rgb([0, 0, 255]));

        let gray = to_grayscale(&DynamicImage::ImageRgb8(img));

        let (r, g, b) = (
            gray.get_pixel(0, 0).0[0],
            gray.get_pixel(1, 0).0[0],
            gray.get_pixel(2, 0).0[0],
        );
        assert!(g > r && r > b, "unexpected luma order: r={} g={} b={}", r, g, b);
    }

    #[test]
    fn test_grayscale_is_idempotent() {
        let img = GrayImage::from_fn(16, 9, |x, y| Luma([(x * 13 + y * 7) as u8]));

        let once = apply(DynamicImage::ImageLuma8(img.clone()));
        let twice = apply(once.clone());

        assert_eq!(once.to_luma8(), img);
        assert_eq!(twice.to_luma8(), img);
    }

    #[test]
    fn test_grayscale_preserves_dimensions() {
        let img = RgbImage::new(100, 50);
        let result = apply(DynamicImage::ImageRgb8(img));
        assert_eq!(result.width(), 100);
        assert_eq!(result.height(), 50);
    }
}
