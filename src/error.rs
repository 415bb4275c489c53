use thiserror::Error;

use crate::stage::StageKind;

/// Errors returned by pipeline operations.
///
/// The first four variants are the run-terminating outcomes of a stage.
/// The rest describe transport and configuration problems.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The server refused to accept a job (`success=false` on submit).
    #[error("{stage} submission rejected: {message}")]
    Submission { stage: String, message: String },

    /// The server rejected a status query (`success=false` while polling).
    #[error("{stage} status query rejected: {message}")]
    Protocol { stage: StageKind, message: String },

    /// The job itself reported `status=error`.
    #[error("{stage} failed: {message}")]
    Task { stage: StageKind, message: String },

    /// The attempt budget ran out while the job was still pending.
    #[error("{stage} process timed out after {attempts} status checks")]
    Timeout { stage: StageKind, attempts: u32 },

    /// The server returned a non-success HTTP status.
    #[error("Server returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Network-level request failure with context.
    #[error("{context}: {source}")]
    Network {
        context: String,
        source: reqwest::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A response was missing a field the stage needs.
    #[error("{0}")]
    InvalidResponse(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Other(String),
}

impl PipelineError {
    /// The stage this error belongs to, when it came from one.
    pub fn stage(&self) -> Option<StageKind> {
        match self {
            PipelineError::Protocol { stage, .. }
            | PipelineError::Task { stage, .. }
            | PipelineError::Timeout { stage, .. } => Some(*stage),
            PipelineError::Submission { stage, .. } => stage.parse().ok(),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for PipelineError {
    fn from(err: anyhow::Error) -> Self {
        PipelineError::Other(err.to_string())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, PipelineError>;
