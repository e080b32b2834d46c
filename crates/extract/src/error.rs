use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::llm::UpstreamError;
use crate::schema::RequestedLocale;

/// Longest piece of model output carried inside an error.
pub const SNIPPET_CHARS: usize = 240;

/// Where the pipeline was when it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Extracted,
    Repaired,
    Parsed,
    ReconstructAttempt,
    Validated,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::Extracted => "extracted",
            Stage::Repaired => "repaired",
            Stage::Parsed => "parsed",
            Stage::ReconstructAttempt => "reconstruct_attempt",
            Stage::Validated => "validated",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    EmptyInput,
    UpstreamUnavailable,
    UpstreamRateLimited,
    ParseFailed,
    SchemaInvalid,
    LocaleMismatch,
}

impl ErrorKind {
    /// Upstream conditions worth retrying; everything else is final for the given text.
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorKind::UpstreamUnavailable | ErrorKind::UpstreamRateLimited)
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PipelineError {
    #[error("no text supplied")]
    EmptyInput,

    #[error("model service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("model service rate limited the request")]
    UpstreamRateLimited { retry_after: Option<Duration> },

    #[error("could not parse model output at stage {stage}: {reason}")]
    ParseFailed {
        stage: Stage,
        reason: String,
        candidate: String,
    },

    #[error("model output failed schema validation at {path}: {reason}")]
    SchemaInvalid { path: String, reason: String },

    #[error("requested {requested} content but model answered in another language")]
    LocaleMismatch {
        requested: RequestedLocale,
        sample: String,
    },
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::EmptyInput => ErrorKind::EmptyInput,
            PipelineError::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
            PipelineError::UpstreamRateLimited { .. } => ErrorKind::UpstreamRateLimited,
            PipelineError::ParseFailed { .. } => ErrorKind::ParseFailed,
            PipelineError::SchemaInvalid { .. } => ErrorKind::SchemaInvalid,
            PipelineError::LocaleMismatch { .. } => ErrorKind::LocaleMismatch,
        }
    }

    pub fn schema(path: impl Into<String>, reason: impl Into<String>) -> Self {
        PipelineError::SchemaInvalid {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<UpstreamError> for PipelineError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::RateLimited { retry_after } => {
                PipelineError::UpstreamRateLimited { retry_after }
            }
            UpstreamError::Unavailable(reason) => PipelineError::UpstreamUnavailable(reason),
        }
    }
}

/// First `SNIPPET_CHARS` characters of `text`, marked when cut.
pub fn snippet(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(SNIPPET_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}
