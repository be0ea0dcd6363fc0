use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use imageproc::filter::separable_filter_equal;

/// Side of the neighborhood the local mean is taken over
const BLOCK_SIZE: usize = 21;
/// How far below the local mean a pixel must be to count as ink
const OFFSET: f32 = 10.0;

/// Ink value in the binarized output
pub const INK: u8 = 0;
/// Background value in the binarized output
pub const BACKGROUND: u8 = 255;

/// Gaussian adaptive thresholding
///
/// Output polarity is dark ink on a light page: a pixel more than `OFFSET`
/// below its Gaussian-weighted 21x21 local mean becomes `INK`, everything
/// else `BACKGROUND`. Local means follow uneven lighting across a photographed
/// page where a single global cutoff would not.
///
/// The comparison is strict and against the unrounded f32 mean, so a pixel
/// exactly `OFFSET` below its mean stays background. OpenCV's
/// `ADAPTIVE_THRESH_GAUSSIAN_C` rounds the mean to u8 and uses `<=`, which
/// can flip pixels sitting on that boundary.
pub fn binarize(img: &GrayImage) -> GrayImage {
    adaptive_threshold(img, BLOCK_SIZE, OFFSET)
}

pub fn apply(image: DynamicImage) -> DynamicImage {
    DynamicImage::ImageLuma8(binarize(&image.to_luma8()))
}

fn adaptive_threshold(img: &GrayImage, block_size: usize, offset: f32) -> GrayImage {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return img.clone();
    }
    let local_mean = gaussian_mean(img, &gaussian_kernel(block_size));

    GrayImage::from_fn(width, height, |x, y| {
        let pixel = img.get_pixel(x, y).0[0] as f32;
        let mean = local_mean.get_pixel(x, y).0[0];
        if pixel < mean - offset {
            Luma([INK])
        } else {
            Luma([BACKGROUND])
        }
    })
}

/// Normalized 1-D Gaussian of `size` taps, sigma derived from the size the
/// same way OpenCV does when none is given
fn gaussian_kernel(size: usize) -> Vec<f32> {
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let center = (size / 2) as f32;
    let raw: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = raw.iter().sum();
    raw.into_iter().map(|w| w / sum).collect()
}

/// Gaussian-weighted local mean of every pixel, kept in f32
///
/// imageproc's separable filter replicates edge pixels past the border.
fn gaussian_mean(img: &GrayImage, kernel: &[f32]) -> ImageBuffer<Luma<f32>, Vec<f32>> {
    let intensities: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_fn(img.width(), img.height(), |x, y| {
            Luma([img.get_pixel(x, y).0[0] as f32])
        });
    separable_filter_equal(&intensities, kernel)
}
