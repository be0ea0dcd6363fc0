//! Image preprocessing for handwriting recognition
//!
//! Geometric normalization (resize, deskew) followed by photometric
//! normalization (grayscale, denoise, binarize), sequenced by [`Pipeline`].

pub mod config;
pub mod geometry;
pub mod output;
pub mod pipeline;
pub mod steps;

pub use config::{PipelineConfig, Rotation};
pub use pipeline::{process, Pipeline, PreprocessingResult, StepTiming};
