use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DigitizeError {
    #[error("Could not read image: {0}")]
    Decode(String),

    #[error("Could not read image: decoded image is empty")]
    EmptyImage,

    #[error("Image too large (max: {max} bytes)")]
    ImageTooLarge { max: usize },

    #[error("Image would be {width}x{height} after resizing (max: {max_pixels} pixels)")]
    OutputTooLarge {
        width: u32,
        height: u32,
        max_pixels: u64,
    },

    #[error("Missing file in request")]
    MissingFile,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unknown recognition engine: {0}")]
    UnknownEngine(String),

    #[error("Failed to initialize recognition engine: {0}")]
    InitializationError(String),

    #[error("Recognition failed: {0}")]
    RecognitionFailed(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl DigitizeError {
    /// Stable machine-readable code reported alongside the message
    pub fn code(&self) -> &'static str {
        match self {
            DigitizeError::Decode(_) => "DECODE_ERROR",
            DigitizeError::EmptyImage => "EMPTY_IMAGE",
            DigitizeError::ImageTooLarge { .. } => "IMAGE_TOO_LARGE",
            DigitizeError::OutputTooLarge { .. } => "OUTPUT_TOO_LARGE",
            DigitizeError::MissingFile => "MISSING_FILE",
            DigitizeError::InvalidRequest(_) => "INVALID_REQUEST",
            DigitizeError::UnknownEngine(_) => "UNKNOWN_ENGINE",
            DigitizeError::InitializationError(_) => "INIT_ERROR",
            DigitizeError::RecognitionFailed(_) => "RECOGNITION_FAILED",
            DigitizeError::Encode(_) => "ENCODE_ERROR",
            DigitizeError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            DigitizeError::Decode(_)
            | DigitizeError::EmptyImage
            | DigitizeError::OutputTooLarge { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            DigitizeError::ImageTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            DigitizeError::MissingFile | DigitizeError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            DigitizeError::UnknownEngine(_) => StatusCode::NOT_FOUND,
            DigitizeError::RecognitionFailed(_) => StatusCode::BAD_GATEWAY,
            DigitizeError::InitializationError(_)
            | DigitizeError::Encode(_)
            | DigitizeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DigitizeError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: self.code().to_string(),
        });

        (status, body).into_response()
    }
}
