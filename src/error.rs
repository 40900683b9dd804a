use std::error::Error;

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::analyze::error::AnalyzeError;

#[derive(Debug, Error)]
pub enum RestError {
    #[error("Please provide a category using the 'category' query parameter, or a 'url'")]
    MissingSource,

    #[error("Please provide a file name using the 'name' query parameter")]
    MissingFileName,

    #[error("{0}")]
    Analyze(#[from] AnalyzeError),
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        error!("{}: {:?}", self, self.source());

        let status = match &self {
            RestError::MissingSource | RestError::MissingFileName => StatusCode::BAD_REQUEST,
            RestError::Analyze(AnalyzeError::InvalidIdentifier { .. }) => StatusCode::BAD_REQUEST,
            RestError::Analyze(AnalyzeError::Fetch(_)) => StatusCode::BAD_GATEWAY,
        };

        let message = match &self {
            RestError::Analyze(AnalyzeError::Fetch(e)) => format!("{self}: {e}"),
            _ => self.to_string(),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
