//! Individual preprocessing steps

pub mod denoise;
pub mod deskew;
pub mod grayscale;
pub mod orientation;
pub mod resize;
pub mod threshold;
