use crate::cleanup::fix_ocr_errors;
use crate::config::Config;
use crate::engines::{EngineChain, EngineInfo};
use crate::error::DigitizeError;
use crate::loader::{self, ImageSource};
use crate::preprocessing::config::{DEFAULT_TARGET_HEIGHT, MAX_TARGET_HEIGHT, MIN_TARGET_HEIGHT};
use crate::preprocessing::steps::orientation;
use crate::preprocessing::{output, Pipeline, PipelineConfig, PreprocessingResult, Rotation};
use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

/// Room for the option fields and multipart framing on top of the file itself
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engines: Arc<EngineChain>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(engines: EngineChain, config: Config) -> Self {
        Self {
            engines: Arc::new(engines),
            config: Arc::new(config),
        }
    }
}

/// Digitize response
#[derive(Serialize)]
pub struct DigitizeResponse {
    /// Cleaned text, ready for editing
    pub text: String,
    /// Recognizer output before cleanup
    pub raw_text: String,
    pub engine: String,
    pub processing_time_ms: u64,
    pub preprocessing: PreprocessingResult,
    pub warnings: Vec<String>,
}

/// Preprocessing preview response
#[derive(Serialize)]
pub struct PreviewResponse {
    pub width: u32,
    pub height: u32,
    /// JPEG data URL of the preprocessed page
    pub image: String,
    pub preprocessing: PreprocessingResult,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Accepted range for `target_height`
#[derive(Serialize)]
pub struct TargetHeightRange {
    pub min: u32,
    pub max: u32,
    pub default: u32,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    /// Engines in fallback order
    pub engines: Vec<EngineInfo>,
    pub max_file_size_bytes: usize,
    pub default_language: String,
    pub target_height: TargetHeightRange,
    pub rotations: Vec<u16>,
}

/// Build the HTTP router
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_file_size.saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route("/digitize", post(handle_digitize))
        .route("/digitize/:engine", post(handle_digitize_with_engine))
        .route("/preprocess", post(handle_preprocess))
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let engines = EngineChain::new(&config)?;
    tracing::info!("Engine fallback order: {}", engines.names().join(" -> "));

    let addr = format!("{}:{}", config.host, config.port);
    let app = router(AppState::new(engines, config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// One parsed upload with its pipeline options
struct DigitizeRequest {
    data: Bytes,
    rotation: Rotation,
    pipeline: PipelineConfig,
}

/// Parse the multipart form into an upload and its options
async fn read_request(
    multipart: &mut Multipart,
    max_file_size: usize,
) -> Result<DigitizeRequest, DigitizeError> {
    let mut file_data: Option<Bytes> = None;
    let mut rotation = Rotation::None;
    let mut target_height = DEFAULT_TARGET_HEIGHT;
    let defaults = PipelineConfig::default();
    let (mut deskew, mut denoise, mut binarize) =
        (defaults.deskew(), defaults.denoise(), defaults.binarize());

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_file_size))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "file" {
            file_data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, max_file_size))?,
            );
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| multipart_error(e, max_file_size))?;
        let value = value.trim();

        match name.as_str() {
            "rotate" => {
                let degrees = value.parse::<u16>().map_err(|_| {
                    DigitizeError::InvalidRequest(format!("rotate must be a number, got '{}'", value))
                })?;
                rotation = Rotation::try_from(degrees)?;
            }
            "target_height" => {
                target_height = value
                    .parse::<u32>()
                    .ok()
                    .filter(|h| (MIN_TARGET_HEIGHT..=MAX_TARGET_HEIGHT).contains(h))
                    .ok_or_else(|| {
                        DigitizeError::InvalidRequest(format!(
                            "target_height must be between {} and {}, got '{}'",
                            MIN_TARGET_HEIGHT, MAX_TARGET_HEIGHT, value
                        ))
                    })?;
            }
            "deskew" => deskew = parse_flag(&name, value)?,
            "denoise" => denoise = parse_flag(&name, value)?,
            "binarize" => binarize = parse_flag(&name, value)?,
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let data = file_data.ok_or(DigitizeError::MissingFile)?;
    if data.len() > max_file_size {
        return Err(DigitizeError::ImageTooLarge { max: max_file_size });
    }

    Ok(DigitizeRequest {
        data,
        rotation,
        pipeline: PipelineConfig::new(target_height, deskew, denoise, binarize)?,
    })
}

fn parse_flag(name: &str, value: &str) -> Result<bool, DigitizeError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" => Ok(false),
        _ => Err(DigitizeError::InvalidRequest(format!(
            "{} must be true or false, got '{}'",
            name, value
        ))),
    }
}

fn multipart_error(e: MultipartError, max_file_size: usize) -> DigitizeError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        DigitizeError::ImageTooLarge { max: max_file_size }
    } else {
        DigitizeError::InvalidRequest(format!("Failed to parse multipart: {}", e))
    }
}

/// Decode, orient and preprocess one upload
fn prepare(request: &DigitizeRequest) -> Result<PreprocessingResult, DigitizeError> {
    let image = loader::load(ImageSource::Bytes(&request.data))?;
    let image = loader::ensure_not_empty(image)?;
    let image = orientation::apply(image, request.rotation);
    Pipeline::new(&request.pipeline).process(image)
}

/// Run CPU-bound work off the async executor
async fn run_blocking<T, F>(work: F) -> Result<T, DigitizeError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, DigitizeError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| DigitizeError::Internal(format!("Worker task failed: {}", e)))?
}

/// Handle digitize requests using the engine fallback chain
async fn handle_digitize(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<DigitizeResponse>, DigitizeError> {
    digitize(state, None, multipart).await
}

/// Handle digitize requests forced onto one engine
async fn handle_digitize_with_engine(
    State(state): State<AppState>,
    Path(engine): Path<String>,
    multipart: Multipart,
) -> Result<Json<DigitizeResponse>, DigitizeError> {
    if state.engines.get(&engine).is_none() {
        return Err(DigitizeError::UnknownEngine(engine));
    }
    digitize(state, Some(engine), multipart).await
}

async fn digitize(
    state: AppState,
    engine: Option<String>,
    mut multipart: Multipart,
) -> Result<Json<DigitizeResponse>, DigitizeError> {
    let start = Instant::now();
    let request = read_request(&mut multipart, state.config.max_file_size).await?;
    let engines = Arc::clone(&state.engines);

    let (preprocessing, recognition) = run_blocking(move || {
        let preprocessing = prepare(&request)?;
        let rgb = output::to_rgb(&preprocessing.image);
        let recognition = match engine {
            Some(name) => engines.recognize_with(&name, &rgb)?,
            None => engines.recognize(&rgb)?,
        };
        Ok((preprocessing, recognition))
    })
    .await?;

    let text = fix_ocr_errors(&recognition.text);
    let processing_time_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        "Digitized in {}ms with {} (preprocessing {}ms), text length: {}",
        processing_time_ms,
        recognition.engine,
        preprocessing.total_time_ms,
        text.len()
    );

    Ok(Json(DigitizeResponse {
        text,
        raw_text: recognition.text,
        engine: recognition.engine.to_string(),
        processing_time_ms,
        preprocessing,
        warnings: recognition.warnings,
    }))
}

/// Handle preprocessing preview requests
async fn handle_preprocess(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<PreviewResponse>, DigitizeError> {
    let request = read_request(&mut multipart, state.config.max_file_size).await?;

    let (preprocessing, image) = run_blocking(move || {
        let preprocessing = prepare(&request)?;
        let image = output::jpeg_data_url(&output::to_rgb(&preprocessing.image))?;
        Ok((preprocessing, image))
    })
    .await?;

    tracing::info!(
        "Preprocessed to {}x{} in {}ms",
        preprocessing.image.width(),
        preprocessing.image.height(),
        preprocessing.total_time_ms
    );

    Ok(Json(PreviewResponse {
        width: preprocessing.image.width(),
        height: preprocessing.image.height(),
        image,
        preprocessing,
    }))
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        engines: state.engines.info(),
        max_file_size_bytes: state.config.max_file_size,
        default_language: state.config.default_language.clone(),
        target_height: TargetHeightRange {
            min: MIN_TARGET_HEIGHT,
            max: MAX_TARGET_HEIGHT,
            default: DEFAULT_TARGET_HEIGHT,
        },
        rotations: vec![0, 90, 180, 270],
    })
}
