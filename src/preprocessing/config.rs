use crate::error::DigitizeError;
use serde::Serialize;

/// Smallest target height offered to users
pub const MIN_TARGET_HEIGHT: u32 = 400;
/// Largest target height offered to users
pub const MAX_TARGET_HEIGHT: u32 = 1600;
/// Target height used when the request does not specify one
pub const DEFAULT_TARGET_HEIGHT: u32 = 900;
/// Largest image the pipeline will produce after resizing.
///
/// Extreme aspect ratios (a 20000x1 strip scaled to 400 high) would
/// otherwise allocate gigabytes in the resize step.
pub const MAX_OUTPUT_PIXELS: u64 = 25_000_000;

/// Stage toggles and parameters for one pipeline invocation.
///
/// Built once per request and passed by reference into the orchestrator;
/// the fields are private so a value cannot change after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PipelineConfig {
    target_height: u32,
    enable_deskew: bool,
    enable_denoise: bool,
    enable_binarize: bool,
}

impl PipelineConfig {
    /// Create a config. `target_height` must be positive.
    pub fn new(
        target_height: u32,
        enable_deskew: bool,
        enable_denoise: bool,
        enable_binarize: bool,
    ) -> Result<Self, DigitizeError> {
        if target_height == 0 {
            return Err(DigitizeError::InvalidRequest(
                "target_height must be positive".to_string(),
            ));
        }

        Ok(Self {
            target_height,
            enable_deskew,
            enable_denoise,
            enable_binarize,
        })
    }

    pub fn target_height(&self) -> u32 {
        self.target_height
    }

    pub fn deskew(&self) -> bool {
        self.enable_deskew
    }

    pub fn denoise(&self) -> bool {
        self.enable_denoise
    }

    pub fn binarize(&self) -> bool {
        self.enable_binarize
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_height: DEFAULT_TARGET_HEIGHT,
            enable_deskew: true,
            enable_denoise: true,
            enable_binarize: true,
        }
    }
}

/// Manual page orientation, applied before the pipeline.
///
/// Skew estimation only handles small tilts; quarter turns are always an
/// explicit user choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    /// 90 degrees clockwise
    Clockwise90,
    Half,
    /// 270 degrees clockwise, i.e. 90 counter-clockwise
    Clockwise270,
}

impl Rotation {
    pub fn degrees(&self) -> u16 {
        match self {
            Self::None => 0,
            Self::Clockwise90 => 90,
            Self::Half => 180,
            Self::Clockwise270 => 270,
        }
    }
}

impl TryFrom<u16> for Rotation {
    type Error = DigitizeError;

    fn try_from(degrees: u16) -> Result<Self, Self::Error> {
        match degrees {
            0 => Ok(Self::None),
            90 => Ok(Self::Clockwise90),
            180 => Ok(Self::Half),
            270 => Ok(Self::Clockwise270),
            other => Err(DigitizeError::InvalidRequest(format!(
                "rotation must be one of 0, 90, 180, 270 (got {})",
                other
            ))),
        }
    }
}
