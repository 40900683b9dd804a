use thiserror::Error;

use crate::wiki::error::FetchError;

#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("Invalid source '{identifier}': {reason}")]
    InvalidIdentifier {
        identifier: String,
        reason: &'static str,
    },

    #[error("Could not retrieve the source")]
    Fetch(#[from] FetchError),
}

/// A page whose content could not be fetched; logged and left out of the analysis.
#[derive(Error, Debug)]
#[error("Skipping page '{title}'")]
pub struct PartialContent {
    pub title: String,
    #[source]
    pub source: FetchError,
}
