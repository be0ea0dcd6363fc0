use crate::preprocessing::config::Rotation;
use image::DynamicImage;

/// Apply the user's quarter-turn orientation choice
pub fn apply(image: DynamicImage, rotation: Rotation) -> DynamicImage {
    match rotation {
        Rotation::None => image,
        Rotation::Clockwise90 => image.rotate90(),
        Rotation::Half => image.rotate180(),
        Rotation::Clockwise270 => image.rotate270(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};

    fn marked_image() -> DynamicImage {
        // 4x2, top-left pixel red
        let mut img = RgbImage::from_pixel(4, 2, Rgb([255, 255, 255]));
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_quarter_turn_clockwise_moves_top_left_to_top_right() {
        let rotated = apply(marked_image(), Rotation::Clockwise90);
        assert_eq!(rotated.dimensions(), (2, 4));
        assert_eq!(rotated.to_rgb8().get_pixel(1, 0), &Rgb([255, 0, 0]));
    }

    #[test]
    fn test_three_quarter_turn_moves_top_left_to_bottom_left() {
        let rotated = apply(marked_image(), Rotation::Clockwise270);
        assert_eq!(rotated.dimensions(), (2, 4));
        assert_eq!(rotated.to_rgb8().get_pixel(0, 3), &Rgb([255, 0, 0]));
    }

    #[test]
    fn test_no_rotation_is_identity() {
        let original = marked_image();
        let result = apply(original.clone(), Rotation::None);
        assert_eq!(result, original);
    }
}
