use crate::preprocessing::geometry::min_area_rect;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::point::Point;

/// Estimates larger than this are treated as unreliable and ignored.
///
/// Camera tilt on a photographed page is small; near-square ink masses make
/// the rectangle orientation unstable, so large readings are not trusted.
pub const MAX_SKEW_DEGREES: f32 = 25.0;

/// Corrections smaller than this are not worth a resampling pass
const MIN_SKEW_DEGREES: f32 = 0.1;

/// Deskew a grayscale image by rotating out the estimated page tilt
///
/// Blank pages, negligible angles and unreliable estimates are returned
/// unchanged. The canvas size never changes.
pub fn deskew(img: &GrayImage) -> GrayImage {
    let Some(angle) = estimate_skew(img) else {
        tracing::debug!("No ink pixels, skipping deskew");
        return img.clone();
    };

    if angle.abs() > MAX_SKEW_DEGREES {
        tracing::debug!(angle, "Skew estimate out of range, leaving image unrotated");
        return img.clone();
    }

    if angle.abs() < MIN_SKEW_DEGREES {
        return img.clone();
    }

    tracing::debug!(angle, "Correcting skew");
    rotate_about_center(img, angle)
}

pub fn apply(image: DynamicImage) -> DynamicImage {
    DynamicImage::ImageLuma8(deskew(&image.to_luma8()))
}

/// Estimate the rotation (degrees, counter-clockwise positive) that levels
/// the ink in `img`.
///
/// Ink is every pixel darker than pure white. Returns `None` when there is
/// none.
pub fn estimate_skew(img: &GrayImage) -> Option<f32> {
    let ink = ink_outline(img);
    let rect = min_area_rect(&ink)?;

    let corrected = if rect.angle < -45.0 {
        -(90.0 + rect.angle)
    } else {
        -rect.angle
    };

    Some(corrected as f32)
}

/// Leftmost and rightmost ink pixel of each row.
///
/// The convex hull of these equals the hull of all ink pixels.
fn ink_outline(img: &GrayImage) -> Vec<Point<i32>> {
    let width = img.width() as usize;
    let mut points = Vec::new();
    if width == 0 {
        return points;
    }

    for (y, row) in img.as_raw().chunks_exact(width).enumerate() {
        let Some(first) = row.iter().position(|&v| v < u8::MAX) else {
            continue;
        };
        let last = row.iter().rposition(|&v| v < u8::MAX).unwrap_or(first);

        points.push(Point::new(first as i32, y as i32));
        if last != first {
            points.push(Point::new(last as i32, y as i32));
        }
    }

    points
}

/// Rotate counter-clockwise (as displayed) by `degrees` about the image
/// center, keeping the canvas size.
///
/// Bicubic sampling; samples that fall outside the source take the nearest
/// edge pixel so no dark border is introduced. imageproc's rotation fills
/// those samples with a single constant pixel instead.
pub fn rotate_about_center(img: &GrayImage, degrees: f32) -> GrayImage {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return img.clone();
    }

    let theta = (degrees as f64).to_radians();
    let (sin, cos) = theta.sin_cos();
    let cx = (width as f64 - 1.0) / 2.0;
    let cy = (height as f64 - 1.0) / 2.0;

    GrayImage::from_fn(width, height, |x, y| {
        let dx = x as f64 - cx;
        let dy = y as f64 - cy;
        // Inverse mapping: output pixel back into the source
        let sx = cx + cos * dx - sin * dy;
        let sy = cy + sin * dx + cos * dy;
        Luma([sample_bicubic(img, sx, sy)])
    })
}

fn sample_bicubic(img: &GrayImage, x: f64, y: f64) -> u8 {
    let max_x = img.width() as i64 - 1;
    let max_y = img.height() as i64 - 1;

    let x0 = x.floor();
    let y0 = y.floor();
    let wx = cubic_weights(x - x0);
    let wy = cubic_weights(y - y0);

    let mut acc = 0.0;
    for (j, wy) in wy.iter().enumerate() {
        let sy = (y0 as i64 + j as i64 - 1).clamp(0, max_y) as u32;
        let mut row = 0.0;
        for (i, wx) in wx.iter().enumerate() {
            let sx = (x0 as i64 + i as i64 - 1).clamp(0, max_x) as u32;
            row += wx * img.get_pixel(sx, sy).0[0] as f64;
        }
        acc += wy * row;
    }

    acc.round().clamp(0.0, 255.0) as u8
}

/// Keys cubic convolution weights (a = -0.75) for taps at -1, 0, 1, 2
fn cubic_weights(t: f64) -> [f64; 4] {
    const A: f64 = -0.75;
    let w0 = ((A * (t + 1.0) - 5.0 * A) * (t + 1.0) + 8.0 * A) * (t + 1.0) - 4.0 * A;
    let w1 = ((A + 2.0) * t - (A + 3.0)) * t * t + 1.0;
    let w2 = ((A + 2.0) * (1.0 - t) - (A + 3.0)) * (1.0 - t) * (1.0 - t) + 1.0;
    let w3 = 1.0 - w0 - w1 - w2;
    [w0, w1, w2, w3]
}
