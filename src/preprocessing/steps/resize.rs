use image::{imageops::FilterType, DynamicImage, GenericImageView};

/// Resize to `target_height`, keeping the aspect ratio.
///
/// The new width is `round(width * target_height / height)`. A zero-height
/// input is returned unchanged. Triangle filtering averages over the source
/// footprint, which is what downscaled photos need.
pub fn apply(image: DynamicImage, target_height: u32) -> DynamicImage {
    let (width, height) = image.dimensions();

    if height == 0 {
        return image;
    }

    let new_width = scaled_width(width, height, target_height);
    if (new_width, target_height) == (width, height) {
        return image;
    }

    if new_width == 0 {
        return DynamicImage::new(0, target_height, image.color());
    }

    image.resize_exact(new_width, target_height, FilterType::Triangle)
}

/// Width that keeps the aspect ratio at `target_height`
///
/// Non-empty inputs never collapse to zero width.
pub fn scaled_width(width: u32, height: u32, target_height: u32) -> u32 {
    if height == 0 || width == 0 {
        return width;
    }

    let scale = target_height as f64 / height as f64;
    ((width as f64 * scale).round() as u32).max(1)
}
