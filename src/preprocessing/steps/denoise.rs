use image::{DynamicImage, GrayImage};

/// Filter strength: larger values smooth more, and erase more detail
const FILTER_STRENGTH: f32 = 10.0;
/// Side of the patch compared between pixels (7x7)
const TEMPLATE_WINDOW: usize = 7;
/// Side of the area searched for similar patches (21x21)
const SEARCH_WINDOW: usize = 21;
/// Patch weights below this are dropped
const WEIGHT_THRESHOLD: f32 = 0.001;

/// Non-local means denoising
///
/// Every pixel becomes a weighted average of the pixels in its search window,
/// weighted by how closely the 7x7 patch around each candidate matches the
/// patch around the pixel itself. Sensor grain averages out while pen strokes,
/// which have few look-alikes on a blank page, survive.
pub fn denoise(img: &GrayImage) -> GrayImage {
    NonLocalMeans::new(FILTER_STRENGTH, TEMPLATE_WINDOW, SEARCH_WINDOW).apply(img)
}

pub fn apply(image: DynamicImage) -> DynamicImage {
    DynamicImage::ImageLuma8(denoise(&image.to_luma8()))
}

struct NonLocalMeans {
    template_radius: usize,
    search_radius: usize,
    /// Weight indexed by mean squared patch distance, zero past the end
    weights: Vec<f32>,
}

impl NonLocalMeans {
    fn new(strength: f32, template_window: usize, search_window: usize) -> Self {
        let h2 = strength * strength;
        let weights = (0..)
            .map(|d| (-(d as f32) / h2).exp())
            .take_while(|&w| w >= WEIGHT_THRESHOLD)
            .collect();

        Self {
            template_radius: template_window / 2,
            search_radius: search_window / 2,
            weights,
        }
    }

    fn weight(&self, distance: usize) -> f32 {
        self.weights.get(distance).copied().unwrap_or(0.0)
    }

    /// For each search offset, the patch distance of every pixel is a box sum
    /// over the squared difference image, so one integral image per offset
    /// replaces the per-pixel template loop.
    fn apply(&self, img: &GrayImage) -> GrayImage {
        let (width, height) = (img.width() as usize, img.height() as usize);
        if width == 0 || height == 0 {
            return img.clone();
        }

        let src = img.as_raw();
        let tr = self.template_radius as isize;
        let sr = self.search_radius as isize;
        let template_area = ((2 * tr + 1) * (2 * tr + 1)) as u64;

        // Padded by the template radius on every side; clamped reads replicate edges
        let pw = width + 2 * self.template_radius;
        let ph = height + 2 * self.template_radius;
        let at = |x: isize, y: isize| -> i32 {
            let x = x.clamp(0, width as isize - 1) as usize;
            let y = y.clamp(0, height as isize - 1) as usize;
            src[y * width + x] as i32
        };

        let mut numerator = vec![0f32; width * height];
        let mut denominator = vec![0f32; width * height];
        let mut integral = vec![0u64; (pw + 1) * (ph + 1)];

        for oy in -sr..=sr {
            for ox in -sr..=sr {
                // Integral image of squared differences between the image and
                // its copy shifted by (ox, oy)
                for py in 0..ph {
                    let y = py as isize - tr;
                    let mut row_sum = 0u64;
                    for px in 0..pw {
                        let x = px as isize - tr;
                        let diff = at(x, y) - at(x + ox, y + oy);
                        row_sum += (diff * diff) as u64;
                        integral[(py + 1) * (pw + 1) + px + 1] =
                            integral[py * (pw + 1) + px + 1] + row_sum;
                    }
                }

                let side = 2 * self.template_radius + 1;
                for y in 0..height {
                    for x in 0..width {
                        // Template centered on (x, y) covers padded [x, x + side)
                        let (x0, y0, x1, y1) = (x, y, x + side, y + side);
                        let ssd = integral[y1 * (pw + 1) + x1] + integral[y0 * (pw + 1) + x0]
                            - integral[y0 * (pw + 1) + x1]
                            - integral[y1 * (pw + 1) + x0];
                        let distance = ((ssd + template_area / 2) / template_area) as usize;

                        let weight = self.weight(distance);
                        if weight > 0.0 {
                            let idx = y * width + x;
                            numerator[idx] += weight * at(x as isize + ox, y as isize + oy) as f32;
                            denominator[idx] += weight;
                        }
                    }
                }
            }
        }

        let out = numerator
            .iter()
            .zip(&denominator)
            .zip(src)
            .map(|((&num, &den), &original)| {
                // The zero offset always contributes weight 1, so den > 0
                if den > 0.0 {
                    (num / den).round().clamp(0.0, 255.0) as u8
                } else {
                    original
                }
            })
            .collect();

        GrayImage::from_raw(width as u32, height as u32, out).unwrap_or_else(|| img.clone())
    }
}
