//! Handwritten notes digitizer
//!
//! Turns phone photos of handwritten pages into editable text: decode the
//! upload, normalize it for recognition, run it through an ordered chain of
//! recognition engines and clean up the result.

pub mod cleanup;
pub mod config;
pub mod engine;
pub mod engines;
pub mod error;
pub mod loader;
pub mod preprocessing;
pub mod server;

pub use error::DigitizeError;
