//! Recognition engine implementations
//!
//! This module contains implementations of the OcrEngine trait for different
//! OCR backends. Engines are conditionally compiled based on feature flags.

#[cfg(feature = "engine-ocrs")]
pub mod ocrs;

#[cfg(feature = "engine-leptess")]
pub mod leptess;

#[cfg(any(feature = "engine-ocrs", feature = "engine-leptess"))]
mod download;

use crate::config::Config;
use crate::engine::OcrEngine;
use crate::error::DigitizeError;
use image::RgbImage;
use serde::Serialize;
use std::sync::Arc;

/// Engines in the order they are tried when none is configured
pub const DEFAULT_ENGINE_ORDER: &[&str] = &["ocrs", "leptess"];

/// Information about an available engine
#[derive(Debug, Clone, Serialize)]
pub struct EngineInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub supported_languages: Vec<String>,
}

/// Text produced by the first engine that succeeded
#[derive(Debug, Clone)]
pub struct Recognition {
    pub text: String,
    pub engine: &'static str,
    /// Failures of engines tried before the successful one
    pub warnings: Vec<String>,
}

/// Ordered fallback list of recognition engines
///
/// Engines are tried front to back; the first success wins and every
/// failure before it is logged with its cause.
pub struct EngineChain {
    engines: Vec<Arc<dyn OcrEngine>>,
}

impl EngineChain {
    /// Initialize the engines named in the config, in that order
    pub fn new(config: &Config) -> Result<Self, DigitizeError> {
        let names: Vec<&str> = if config.engines.is_empty() {
            DEFAULT_ENGINE_ORDER
                .iter()
                .copied()
                .filter(|name| is_compiled(name))
                .collect()
        } else {
            config.engines.iter().map(String::as_str).collect()
        };

        let mut engines = Vec::with_capacity(names.len());
        for name in names {
            tracing::info!("Initializing {} engine...", name);
            engines.push(build_engine(name, config)?);
        }

        Self::from_engines(engines)
    }

    /// Build a chain from already constructed engines
    pub fn from_engines(engines: Vec<Arc<dyn OcrEngine>>) -> Result<Self, DigitizeError> {
        if engines.is_empty() {
            return Err(DigitizeError::InitializationError(
                "No OCR engines available. Build with --features engine-ocrs or --features engine-leptess".to_string()
            ));
        }

        Ok(Self { engines })
    }

    /// Get an engine by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn OcrEngine>> {
        self.engines.iter().find(|e| e.name() == name).cloned()
    }

    /// List engine names in fallback order
    pub fn names(&self) -> Vec<&'static str> {
        self.engines.iter().map(|e| e.name()).collect()
    }

    /// Get info about all engines in fallback order
    pub fn info(&self) -> Vec<EngineInfo> {
        self.engines
            .iter()
            .map(|e| EngineInfo {
                name: e.name(),
                description: e.description(),
                supported_languages: e.supported_languages(),
            })
            .collect()
    }

    /// Recognize with the first engine that succeeds
    pub fn recognize(&self, image: &RgbImage) -> Result<Recognition, DigitizeError> {
        let mut warnings = Vec::new();

        for engine in &self.engines {
            match engine.recognize(image) {
                Ok(text) => {
                    return Ok(Recognition {
                        text,
                        engine: engine.name(),
                        warnings,
                    })
                }
                Err(e) => {
                    tracing::warn!(
                        engine = engine.name(),
                        error = %e,
                        "Recognition failed, falling back to next engine"
                    );
                    warnings.push(format!("{} failed: {}", engine.name(), e));
                }
            }
        }

        Err(DigitizeError::RecognitionFailed(warnings.join("; ")))
    }

    /// Recognize with one named engine, no fallback
    pub fn recognize_with(&self, name: &str, image: &RgbImage) -> Result<Recognition, DigitizeError> {
        let engine = self
            .get(name)
            .ok_or_else(|| DigitizeError::UnknownEngine(name.to_string()))?;

        let text = engine.recognize(image).map_err(|e| match e {
            DigitizeError::RecognitionFailed(msg) => DigitizeError::RecognitionFailed(msg),
            other => DigitizeError::RecognitionFailed(format!("{} failed: {}", name, other)),
        })?;

        Ok(Recognition {
            text,
            engine: engine.name(),
            warnings: Vec::new(),
        })
    }
}

fn is_compiled(name: &str) -> bool {
    match name {
        "ocrs" => cfg!(feature = "engine-ocrs"),
        "leptess" => cfg!(feature = "engine-leptess"),
        _ => false,
    }
}

#[allow(unused_variables)]
fn build_engine(name: &str, config: &Config) -> Result<Arc<dyn OcrEngine>, DigitizeError> {
    match name {
        #[cfg(feature = "engine-ocrs")]
        "ocrs" => Ok(Arc::new(ocrs::OcrsEngine::new(config)?)),
        #[cfg(feature = "engine-leptess")]
        "leptess" => Ok(Arc::new(leptess::LeptessEngine::new(config)?)),
        known if DEFAULT_ENGINE_ORDER.contains(&known) => {
            Err(DigitizeError::InitializationError(format!(
                "Engine '{}' is not compiled in. Rebuild with --features engine-{}",
                known, known
            )))
        }
        unknown => Err(DigitizeError::UnknownEngine(unknown.to_string())),
    }
}
