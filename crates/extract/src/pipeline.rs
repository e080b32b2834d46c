//! The extraction → repair → parse → reconstruct → validate chain.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::candidate::{CandidateStrategy, default_strategies, extract_candidate};
use crate::error::{PipelineError, Stage, snippet};
use crate::observer::{PipelineObserver, StageEvent, TracingObserver};
use crate::parser::parse_candidate;
use crate::reconstruct::reconstruct;
use crate::repair::repair;
use crate::schema::{AnalysisResult, RequestedLocale};
use crate::validate::{FunctionWordHeuristic, LanguageCheck, ValidationPolicy, check_locale, validate_schema};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Carry `genre` / `writingStyle` through the reconstruction fallback when they are intact.
    #[serde(default)]
    pub salvage_metadata: bool,
    #[serde(default)]
    pub validation: ValidationPolicy,
}

/// Turns raw model output into a validated [`AnalysisResult`].
///
/// Holds no per-call state; one instance can serve concurrent requests.
pub struct Pipeline {
    strategies: Vec<Box<dyn CandidateStrategy>>,
    language: Box<dyn LanguageCheck>,
    observer: Arc<dyn PipelineObserver>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self {
            strategies: default_strategies(),
            language: Box::new(FunctionWordHeuristic),
            observer: Arc::new(TracingObserver),
            options,
        }
    }

    pub fn with_strategies(mut self, strategies: Vec<Box<dyn CandidateStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn with_language_check(mut self, language: impl LanguageCheck + 'static) -> Self {
        self.language = Box::new(language);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn run(&self, raw: &str, locale: RequestedLocale) -> Result<AnalysisResult, PipelineError> {
        if raw.trim().is_empty() {
            return Err(self.fail(Stage::Start, PipelineError::EmptyInput));
        }

        let candidate = extract_candidate(&self.strategies, raw);
        self.observer.on_event(&StageEvent::Extracted {
            strategy: candidate.strategy,
            candidate_len: candidate.text.len(),
        });

        let repaired = repair(&candidate.text);
        self.observer.on_event(&StageEvent::Repaired {
            changed: repaired != candidate.text,
        });

        let draft = match parse_candidate(&repaired) {
            Ok(draft) => {
                self.observer.on_event(&StageEvent::Parsed { reconstructed: false });
                draft
            }
            Err(primary) => {
                self.observer.on_event(&StageEvent::ReconstructAttempt {
                    reason: &primary.message,
                });
                match reconstruct(raw, self.options.salvage_metadata) {
                    Ok(draft) => {
                        self.observer.on_event(&StageEvent::Parsed { reconstructed: true });
                        draft
                    }
                    Err(fallback) => {
                        let err = PipelineError::ParseFailed {
                            stage: Stage::ReconstructAttempt,
                            reason: format!("{}; {}", primary.message, fallback),
                            candidate: snippet(&repaired),
                        };
                        return Err(self.fail(Stage::ReconstructAttempt, err));
                    }
                }
            }
        };

        let result = validate_schema(&draft, &self.options.validation)
            .and_then(|result| {
                check_locale(&result, locale, self.language.as_ref())?;
                Ok(result)
            })
            .map_err(|err| self.fail(Stage::Parsed, err))?;

        self.observer.on_event(&StageEvent::Validated {
            characters: result.characters.len(),
            interactions: result.interactions.len(),
        });
        Ok(result)
    }

    fn fail(&self, stage: Stage, err: PipelineError) -> PipelineError {
        self.observer.on_event(&StageEvent::Failed {
            stage,
            kind: err.kind(),
        });
        err
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineOptions::default())
    }
}
