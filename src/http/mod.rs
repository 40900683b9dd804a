use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::analyze::{render_text_report, Analyzer, Source};
use crate::error::RestError;
use crate::text::MAX_RENDERED_TERMS;

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeParams {
    pub category: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub force_refresh: bool,
    pub limit: Option<usize>,
}

impl AnalyzeParams {
    /// A category takes precedence when both parameters are present.
    fn source(&self) -> Result<Source, RestError> {
        match (&self.category, &self.url) {
            (Some(category), _) => Ok(Source::Category(category.clone())),
            (None, Some(url)) => Ok(Source::Url(url.clone())),
            (None, None) => Err(RestError::MissingSource),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FileParams {
    pub name: Option<String>,
    #[serde(default)]
    pub force_refresh: bool,
    pub limit: Option<usize>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/analyze", get(analyze))
        .route("/report", get(report))
        .route("/analyze_file", post(analyze_file))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn analyze(
    State(state): State<AppState>,
    Query(params): Query<AnalyzeParams>,
) -> Result<impl IntoResponse, RestError> {
    let source = params.source()?;
    info!(
        "analysis requested for {} '{}' (force_refresh: {})",
        source.kind(),
        source.name(),
        params.force_refresh
    );

    let analysis = state
        .analyzer
        .analyze_source(source, params.force_refresh)
        .await?;
    let limit = params.limit.unwrap_or(MAX_RENDERED_TERMS);

    Ok(Json(analysis.to_response(limit)))
}

/// Analyzes a plain-text body, such as an uploaded `.txt` file.
async fn analyze_file(
    State(state): State<AppState>,
    Query(params): Query<FileParams>,
    body: String,
) -> Result<impl IntoResponse, RestError> {
    let name = params.name.ok_or(RestError::MissingFileName)?;
    info!("analysis requested for file '{name}' ({} bytes)", body.len());

    let analysis = state
        .analyzer
        .analyze_source(Source::text(name, body), params.force_refresh)
        .await?;
    let limit = params.limit.unwrap_or(MAX_RENDERED_TERMS);

    Ok(Json(analysis.to_response(limit)))
}

async fn report(
    State(state): State<AppState>,
    Query(params): Query<AnalyzeParams>,
) -> Result<impl IntoResponse, RestError> {
    let analysis = state
        .analyzer
        .analyze_source(params.source()?, params.force_refresh)
        .await?;

    let filename = format!("{}_word_frequency.txt", analysis.key);
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        render_text_report(&analysis),
    ))
}
