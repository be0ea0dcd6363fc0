use image::{DynamicImage, GrayImage};
use serde::Serialize;
use std::time::Instant;

use super::config::{PipelineConfig, MAX_OUTPUT_PIXELS};
use super::steps;
use crate::error::DigitizeError;

/// Timing information for a single preprocessing step
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Result of preprocessing including timing stats
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessingResult {
    /// Preprocessed image (not serialized)
    #[serde(skip)]
    pub image: GrayImage,
    /// Whether the image was reduced to pure ink/background
    pub binarized: bool,
    /// Total preprocessing time in milliseconds
    pub total_time_ms: u64,
    /// Individual step timings
    pub steps: Vec<StepTiming>,
}

/// Preprocessing pipeline driven by one request's configuration
///
/// Order: resize, grayscale, then deskew, denoise and binarize as enabled.
/// Output is grayscale, or two-valued when binarization is on.
pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Process an image according to the configuration
    ///
    /// Fails only when the resized image would exceed `MAX_OUTPUT_PIXELS`,
    /// checked before the resize runs.
    pub fn process(&self, image: DynamicImage) -> Result<PreprocessingResult, DigitizeError> {
        let target_height = self.config.target_height();
        check_output_size(image.width(), image.height(), target_height)?;

        let start = Instant::now();
        let mut steps_timing = Vec::new();

        let mut img = self.run_step("resize", image, &mut steps_timing, |img| {
            steps::resize::apply(img, target_height)
        });
        img = self.run_step("grayscale", img, &mut steps_timing, steps::grayscale::apply);

        if self.config.deskew() {
            img = self.run_step("deskew", img, &mut steps_timing, steps::deskew::apply);
        }

        if self.config.denoise() {
            img = self.run_step("denoise", img, &mut steps_timing, steps::denoise::apply);
        }

        if self.config.binarize() {
            img = self.run_step("binarize", img, &mut steps_timing, steps::threshold::apply);
        }

        let total_time_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(
            total_time_ms,
            width = img.width(),
            height = img.height(),
            "Preprocessing finished"
        );

        Ok(PreprocessingResult {
            image: img.into_luma8(),
            binarized: self.config.binarize(),
            total_time_ms,
            steps: steps_timing,
        })
    }

    fn run_step<F>(
        &self,
        name: &str,
        img: DynamicImage,
        timings: &mut Vec<StepTiming>,
        step_fn: F,
    ) -> DynamicImage
    where
        F: FnOnce(DynamicImage) -> DynamicImage,
    {
        let step_start = Instant::now();
        let result = step_fn(img);
        let time_ms = step_start.elapsed().as_millis() as u64;
        tracing::trace!(step = name, time_ms, "Preprocessing step done");
        timings.push(StepTiming {
            name: name.to_string(),
            time_ms,
        });
        result
    }
}

/// Run the full pipeline on a decoded image and return only the output image
pub fn process(image: DynamicImage, config: &PipelineConfig) -> Result<GrayImage, DigitizeError> {
    Ok(Pipeline::new(config).process(image)?.image)
}

/// Reject inputs whose resized size is over the pixel budget
pub fn check_output_size(width: u32, height: u32, target_height: u32) -> Result<(), DigitizeError> {
    if height == 0 {
        return Ok(());
    }

    let out_width = steps::resize::scaled_width(width, height, target_height);
    if out_width as u64 * target_height as u64 > MAX_OUTPUT_PIXELS {
        return Err(DigitizeError::OutputTooLarge {
            width: out_width,
            height: target_height,
            max_pixels: MAX_OUTPUT_PIXELS,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn page() -> DynamicImage {
        let img = RgbImage::from_fn(120, 80, |x, y| {
            if (30..90).contains(&x) && (35..45).contains(&y) {
                Rgb([30, 30, 40])
            } else {
                Rgb([235, 230, 220])
            }
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_runs_enabled_steps_in_order() {
        let config = PipelineConfig::new(40, true, true, true).unwrap();
        let result = Pipeline::new(&config).process(page()).unwrap();

        let names: Vec<&str> = result.steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["resize", "grayscale", "deskew", "denoise", "binarize"]);
        assert!(result.binarized);
        assert_eq!(result.image.dimensions(), (60, 40));
    }

    #[test]
    fn test_disabled_steps_are_skipped() {
        let config = PipelineConfig::new(40, false, false, false).unwrap();
        let result = Pipeline::new(&config).process(page()).unwrap();

        let names: Vec<&str> = result.steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["resize", "grayscale"]);
        assert!(!result.binarized);
    }

    #[test]
    fn test_is_deterministic() {
        let config = PipelineConfig::new(60, true, true, true).unwrap();
        assert_eq!(
            process(page(), &config).unwrap(),
            process(page(), &config).unwrap()
        );
    }

    #[test]
    fn test_empty_image_passes_through() {
        let config = PipelineConfig::default();
        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        let out = process(empty, &config).unwrap();
        assert_eq!(out.dimensions(), (0, 0));
    }

    #[test]
    fn test_extreme_aspect_ratio_rejected_before_resizing() {
        let strip = DynamicImage::ImageRgb8(RgbImage::from_pixel(20000, 1, Rgb([255, 255, 255])));
        let config = PipelineConfig::new(400, false, false, false).unwrap();

        let result = process(strip, &config);

        assert!(matches!(
            result,
            Err(DigitizeError::OutputTooLarge {
                width: 8_000_000,
                height: 400,
                ..
            })
        ));
    }

    #[test]
    fn test_output_budget_boundary() {
        // 62500 * 400 = 25_000_000 exactly
        assert!(check_output_size(62500, 400, 400).is_ok());
        assert!(check_output_size(62501, 400, 400).is_err());
        assert!(check_output_size(0, 0, 400).is_ok());
    }
}
