// src/drivers/error.rs
use thiserror::Error;

use crate::types::Stage;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("queue {queue} has no consumer left")]
    Disconnected { queue: &'static str },
    #[error("{stage} stopped unexpectedly: {reason}")]
    WorkerFailed { stage: Stage, reason: String },
    #[error("failed to spawn worker thread: {0}")]
    Spawn(std::io::Error),
    #[error("failed to write snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to render plot: {0}")]
    Plot(String),
    #[error("live view is no longer available")]
    ViewUnavailable,
}

impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for PipelineError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        PipelineError::Plot(format!("{value:?}"))
    }
}

impl From<image::ImageError> for PipelineError {
    fn from(value: image::ImageError) -> Self {
        PipelineError::Plot(value.to_string())
    }
}
