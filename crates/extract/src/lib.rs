pub mod candidate;
pub mod error;
pub mod llm;
pub mod observer;
pub mod parser;
pub mod pipeline;
pub mod prompt;
pub mod reconstruct;
pub mod repair;
pub mod schema;
pub mod validate;

pub use candidate::{CandidateStrategy, ExtractionCandidate, StrategyKind};
pub use error::{ErrorKind, PipelineError, Stage};
pub use llm::{ChatClient, CompletionSource, UpstreamError};
pub use observer::{NoopObserver, PipelineObserver, StageEvent, TracingObserver};
pub use pipeline::{Pipeline, PipelineOptions};
pub use schema::{AnalysisResult, CharacterRecord, InteractionRecord, RequestedLocale, WritingStyle};
pub use validate::{FunctionWordHeuristic, LanguageCheck, ValidationPolicy};

use tracing::info;

/// Run `raw` model output through the default pipeline.
pub fn analyze(raw: &str, locale: RequestedLocale) -> Result<AnalysisResult, PipelineError> {
    Pipeline::default().run(raw, locale)
}

/// Asks the model about a text and turns its answer into an [`AnalysisResult`].
pub struct CharacterAnalyzer<C> {
    source: C,
    pipeline: Pipeline,
}

impl<C: CompletionSource> CharacterAnalyzer<C> {
    pub fn new(source: C, pipeline: Pipeline) -> Self {
        Self { source, pipeline }
    }

    pub fn source(&self) -> &C {
        &self.source
    }

    /// Fetch raw output for `text` once. Upstream failures keep their kind.
    pub async fn request_raw(&self, text: &str, locale: RequestedLocale) -> Result<String, PipelineError> {
        if text.trim().is_empty() {
            return Err(PipelineError::EmptyInput);
        }

        let system_prompt = prompt::build_system_prompt(locale);
        let raw = self.source.complete(&system_prompt, text).await?;
        info!(locale = %locale, raw_len = raw.len(), "Model output received");
        Ok(raw)
    }

    pub fn interpret(&self, raw: &str, locale: RequestedLocale) -> Result<AnalysisResult, PipelineError> {
        self.pipeline.run(raw, locale)
    }

    /// One upstream call followed by the pipeline; no retries here.
    pub async fn analyze_text(&self, text: &str, locale: RequestedLocale) -> Result<AnalysisResult, PipelineError> {
        let raw = self.request_raw(text, locale).await?;
        self.interpret(&raw, locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CannedSource {
        reply: Result<String, UpstreamError>,
        calls: AtomicUsize,
    }

    impl CannedSource {
        fn new(reply: Result<&str, UpstreamError>) -> Self {
            Self {
                reply: reply.map(str::to_string),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl CompletionSource for CannedSource {
        fn complete(
            &self,
            system_prompt: &str,
            _user_text: &str,
        ) -> impl Future<Output = Result<String, UpstreamError>> + Send {
            assert!(system_prompt.contains("JSON format"));
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = self.reply.clone();
            async move { reply }
        }
    }

    #[tokio::test]
    async fn test_analyze_text_runs_pipeline() {
        let source = CannedSource::new(Ok(
            "```json\n{\"characters\": [{\"name\": \"Jo\", \"description\": \"writer\"}], \"interactions\": []}\n```",
        ));
        let analyzer = CharacterAnalyzer::new(source, Pipeline::default());

        let result = analyzer
            .analyze_text("Jo wrote all night.", RequestedLocale::Default)
            .await
            .unwrap();
        assert_eq!(result.characters[0].name, "Jo");
    }

    #[tokio::test]
    async fn test_empty_text_never_reaches_upstream() {
        let analyzer = CharacterAnalyzer::new(CannedSource::new(Ok("{}")), Pipeline::default());

        let err = analyzer.analyze_text("   ", RequestedLocale::Default).await.unwrap_err();
        assert_eq!(err, PipelineError::EmptyInput);
        assert_eq!(analyzer.source().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rate_limit_passes_through() {
        let analyzer = CharacterAnalyzer::new(
            CannedSource::new(Err(UpstreamError::RateLimited { retry_after: None })),
            Pipeline::default(),
        );

        let err = analyzer.analyze_text("text", RequestedLocale::Alternate).await.unwrap_err();
        assert_eq!(err, PipelineError::UpstreamRateLimited { retry_after: None });
    }

    #[test]
    fn test_analyze_shortcut() {
        let result = analyze("{characters: [], interactions: [],}", RequestedLocale::Default).unwrap();
        assert!(result.interactions.is_empty());
    }
}
