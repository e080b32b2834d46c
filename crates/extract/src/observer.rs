use tracing::{debug, warn};

use crate::candidate::StrategyKind;
use crate::error::{ErrorKind, Stage};

/// Stage transitions reported by [`crate::Pipeline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageEvent<'a> {
    Extracted {
        strategy: StrategyKind,
        candidate_len: usize,
    },
    Repaired {
        changed: bool,
    },
    Parsed {
        reconstructed: bool,
    },
    ReconstructAttempt {
        reason: &'a str,
    },
    Validated {
        characters: usize,
        interactions: usize,
    },
    Failed {
        stage: Stage,
        kind: ErrorKind,
    },
}

pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: &StageEvent<'_>);
}

/// Logs transitions with `tracing`: progress at debug, failures at warn.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_event(&self, event: &StageEvent<'_>) {
        match event {
            StageEvent::Extracted {
                strategy,
                candidate_len,
            } => debug!(%strategy, candidate_len, "Candidate extracted"),
            StageEvent::Repaired { changed } => debug!(changed, "Candidate repaired"),
            StageEvent::Parsed { reconstructed } => debug!(reconstructed, "Document parsed"),
            StageEvent::ReconstructAttempt { reason } => {
                warn!(reason, "Strict parse failed, reconstructing from fragments")
            }
            StageEvent::Validated {
                characters,
                interactions,
            } => debug!(characters, interactions, "Analysis validated"),
            StageEvent::Failed { stage, kind } => {
                warn!(%stage, kind = ?kind, "Analysis pipeline failed")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {
    fn on_event(&self, _event: &StageEvent<'_>) {}
}
