use crate::aggregator::{BatchOutcome, DocumentRecord, ImageFailure};
use crate::config::Config;
use crate::engines::{EngineInfo, EngineRegistry};
use crate::error::PipelineError;
use crate::pii::PiiEntity;
use crate::pipeline::Pipeline;
use crate::report::{PdfReportGenerator, ReportError, LOCAL_REPORT_NAME, REMOTE_REPORT_NAME};
use crate::source::{ImageSource, MemoryImage, RemoteImage};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::header,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Upload requests may carry this many maximum-size files
const MAX_FILES_PER_REQUEST: usize = 16;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub reports: PdfReportGenerator,
    pub config: Arc<Config>,
    pub engines: Arc<Vec<EngineInfo>>,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>, config: Config) -> Self {
        let engine = pipeline.engine();
        let engines = vec![EngineInfo {
            name: engine.name(),
            description: engine.description(),
            supported_languages: engine.supported_languages(),
        }];

        Self {
            pipeline,
            reports: PdfReportGenerator::new(&config.report_dir),
            config: Arc::new(config),
            engines: Arc::new(engines),
        }
    }

    pub fn with_engines(mut self, engines: Vec<EngineInfo>) -> Self {
        self.engines = Arc::new(engines);
        self
    }
}

/// Response for both batch endpoints
#[derive(Serialize)]
pub struct BatchResponse {
    pub message: String,
    /// Download path of the generated report
    pub report: String,
    pub records: Vec<DocumentRecord>,
    pub errors: Vec<ImageFailure>,
    pub processing_time_ms: u64,
}

#[derive(Deserialize)]
pub struct RemoteFilesRequest {
    pub urls: Vec<String>,
}

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
    pub language: Option<String>,
    pub entities: Option<Vec<String>>,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub entities: Vec<PiiEntity>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub engine: String,
    pub engines: Vec<EngineInfo>,
    pub languages: Vec<String>,
    pub analysis_language: String,
    pub supported_entities: Vec<String>,
    pub region_order: String,
    pub max_file_size_bytes: usize,
    pub score_threshold: f32,
    pub min_fragment_confidence: f32,
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let body_limit = state
        .config
        .max_file_size
        .saturating_mul(MAX_FILES_PER_REQUEST);

    Router::new()
        .route("/api/process-local-files", post(handle_local_files))
        .route("/api/process-remote-files", post(handle_remote_files))
        .route("/api/analyze", post(handle_analyze))
        .route("/download-report/:filename", get(handle_download))
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let engines = EngineRegistry::new(&config)?;
    let pipeline = Pipeline::from_config(&config, &engines)?;
    let addr = format!("{}:{}", config.host, config.port);

    tracing::info!(
        "Using {} engine, {} PII entity types",
        engines.default_name(),
        pipeline
            .analyzer()
            .registry()
            .supported_entities(&config.analysis_language)
            .len()
    );

    let state = AppState::new(Arc::new(pipeline), config).with_engines(engines.info());
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Handle uploaded image batches
async fn handle_local_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<BatchResponse>, PipelineError> {
    let start = Instant::now();
    let mut sources: Vec<Box<dyn ImageSource>> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PipelineError::InvalidRequest(format!("Failed to parse multipart: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name != "files" && name != "file" {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("upload_{}", sources.len() + 1));
        let data = field.bytes().await.map_err(|e| {
            PipelineError::InvalidRequest(format!("Failed to read file data: {}", e))
        })?;

        if data.len() > state.config.max_file_size {
            return Err(PipelineError::ImageTooLarge {
                size: data.len(),
                max: state.config.max_file_size,
            });
        }

        sources.push(Box::new(MemoryImage::new(file_name, data.to_vec())));
    }

    if sources.is_empty() {
        return Err(PipelineError::MissingFile);
    }

    let outcome = state.pipeline.process_batch(sources).await;
    respond(&state, LOCAL_REPORT_NAME, outcome, start).await
}

/// Handle batches of image URLs
async fn handle_remote_files(
    State(state): State<AppState>,
    Json(request): Json<RemoteFilesRequest>,
) -> Result<Json<BatchResponse>, PipelineError> {
    let start = Instant::now();

    if request.urls.is_empty() {
        return Err(PipelineError::InvalidRequest("No URLs provided".to_string()));
    }

    let max_bytes = state.config.max_file_size as u64;
    let sources: Vec<Box<dyn ImageSource>> = request
        .urls
        .into_iter()
        .map(|url| {
            Box::new(RemoteImage::new(url).with_max_bytes(max_bytes)) as Box<dyn ImageSource>
        })
        .collect();

    let outcome = state.pipeline.process_batch(sources).await;
    respond(&state, REMOTE_REPORT_NAME, outcome, start).await
}

async fn respond(
    state: &AppState,
    base_name: &str,
    outcome: BatchOutcome,
    start: Instant,
) -> Result<Json<BatchResponse>, PipelineError> {
    let reports = state.reports.clone();
    let report_name = reports.unique_name(base_name);

    let (outcome, report_name) = tokio::task::spawn_blocking(move || {
        reports
            .generate(&report_name, &outcome.records, &outcome.errors)
            .map(|_| (outcome, report_name))
    })
    .await
    .map_err(|e| PipelineError::Internal(format!("Report task failed: {}", e)))??;

    let processing_time_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        "Batch completed in {}ms: {} records, {} errors",
        processing_time_ms,
        outcome.records.len(),
        outcome.errors.len()
    );

    Ok(Json(BatchResponse {
        message: format!(
            "Processed {} of {} images",
            outcome.records.len(),
            outcome.total()
        ),
        report: format!("/download-report/{}", report_name),
        records: outcome.records,
        errors: outcome.errors,
        processing_time_ms,
    }))
}

/// Run the PII engine over plain text
async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, PipelineError> {
    let language = request
        .language
        .unwrap_or_else(|| state.config.analysis_language.clone());

    let entities = state.pipeline.analyzer().analyze(
        &request.text,
        &language,
        request.entities.as_deref(),
    )?;
    let entities = entities
        .into_iter()
        .filter(|e| e.score >= state.pipeline.settings().policy.min_score)
        .collect();

    Ok(Json(AnalyzeResponse { entities }))
}

/// Serve a generated report as an attachment
async fn handle_download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, PipelineError> {
    let path = state.reports.path_for(&filename).map_err(|e| match e {
        ReportError::InvalidFilename(name) => {
            PipelineError::InvalidRequest(format!("Invalid report name: {}", name))
        }
        other => PipelineError::ReportGeneration(other),
    })?;

    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PipelineError::ReportNotFound(filename.clone()),
        _ => PipelineError::Internal(format!("Failed to read report: {}", e)),
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    ))
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
    let settings = state.pipeline.settings();
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        engine: state.pipeline.engine().name().to_string(),
        engines: state.engines.as_ref().clone(),
        languages: settings.languages.clone(),
        analysis_language: settings.analysis_language.clone(),
        supported_entities: state
            .pipeline
            .analyzer()
            .registry()
            .supported_entities(&settings.analysis_language),
        region_order: settings.segmenter.order.as_str().to_string(),
        max_file_size_bytes: state.config.max_file_size,
        score_threshold: settings.policy.min_score,
        min_fragment_confidence: settings.min_fragment_confidence,
    })
}
