use thiserror::Error;
use uuid::Uuid;

use crate::entities::ContentStatus;
use crate::extractor::EmptyContentError;
use crate::fetcher::FetchError;
use crate::insights::GenerationError;

/// Why a pipeline run ended in `failed`. The message names the stage and is
/// what gets stored on the item.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("extraction failed: {0}")]
    EmptyContent(#[from] EmptyContentError),

    #[error("extraction failed: {0}")]
    ExtractionAborted(String),

    #[error("summarization failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("store failed: {0}")]
    Store(#[from] anyhow::Error),
}

impl PipelineError {
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "fetch",
            Self::EmptyContent(_) | Self::ExtractionAborted(_) => "extraction",
            Self::Generation(_) => "summarization",
            Self::Store(_) => "store",
        }
    }
}

/// Errors returned synchronously to orchestrator callers.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("content item {0} not found")]
    NotFound(Uuid),

    #[error("content item {0} is already being processed")]
    AlreadyProcessing(Uuid),

    #[error("content item {id} already reached terminal status {status}")]
    AlreadyTerminal { id: Uuid, status: ContentStatus },

    #[error("orchestrator is shutting down")]
    ShuttingDown,

    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}
