//! Ordered fallback across generation backends

use std::sync::Arc;
use std::time::Duration;

use crate::providers::{GenerationRequest, LlmProvider};

/// Text returned when every backend failed
pub const ALL_FAILED: &str = "Error: All model fallbacks failed.";

/// Output of one composition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    /// Generated text, or [`ALL_FAILED`]
    pub text: String,
    /// Name of the backend that answered; `None` when the chain was exhausted
    pub backend: Option<String>,
}

impl Generation {
    fn exhausted() -> Self {
        Self {
            text: ALL_FAILED.to_string(),
            backend: None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.backend.is_none()
    }
}

/// Tries each backend in order, each under its own timeout
pub struct AnswerComposer {
    backends: Vec<Arc<dyn LlmProvider>>,
    timeout: Duration,
}

impl AnswerComposer {
    pub fn new(backends: Vec<Arc<dyn LlmProvider>>, timeout: Duration) -> Self {
        Self { backends, timeout }
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// First successful completion. Never errors: exhaustion yields [`ALL_FAILED`].
    pub async fn compose(&self, request: &GenerationRequest) -> Generation {
        for backend in &self.backends {
            let started = std::time::Instant::now();
            match tokio::time::timeout(self.timeout, backend.generate(request)).await {
                Ok(Ok(text)) => {
                    tracing::info!(
                        "{} ({}) answered in {:.1}s",
                        backend.name(),
                        backend.model(),
                        started.elapsed().as_secs_f32()
                    );
                    return Generation {
                        text,
                        backend: Some(backend.name().to_string()),
                    };
                }
                Ok(Err(e)) => {
                    tracing::warn!("{} failed: {}", backend.name(), e);
                }
                Err(_) => {
                    tracing::warn!("{} timed out after {:?}", backend.name(), self.timeout);
                }
            }
        }

        tracing::error!("All {} generation backends failed", self.backends.len());
        Generation::exhausted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StubBehavior, StubLlm};

    fn composer(backends: Vec<Arc<StubLlm>>, timeout: Duration) -> AnswerComposer {
        AnswerComposer::new(
            backends.into_iter().map(|b| b as Arc<dyn LlmProvider>).collect(),
            timeout,
        )
    }

    #[tokio::test]
    async fn test_falls_through_to_secondary() {
        let primary = Arc::new(StubLlm::new("gemini", StubBehavior::Fail));
        let secondary = Arc::new(StubLlm::reply("openrouter", "Thirty days."));
        let composer = composer(vec![primary.clone(), secondary.clone()], Duration::from_secs(5));

        let generation = composer.compose(&GenerationRequest::text("q")).await;
        assert_eq!(generation.text, "Thirty days.");
        assert_eq!(generation.backend.as_deref(), Some("openrouter"));
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);
    }

    #[tokio::test]
    async fn test_primary_success_skips_rest() {
        let primary = Arc::new(StubLlm::reply("gemini", "ok"));
        let secondary = Arc::new(StubLlm::reply("openrouter", "unused"));
        let composer = composer(vec![primary, secondary.clone()], Duration::from_secs(5));

        assert_eq!(composer.compose(&GenerationRequest::text("q")).await.text, "ok");
        assert_eq!(secondary.calls(), 0);
    }

    #[tokio::test]
    async fn test_timeout_falls_through() {
        let primary = Arc::new(StubLlm::new("gemini", StubBehavior::Hang));
        let secondary = Arc::new(StubLlm::reply("openrouter", "late but fine"));
        let composer = composer(vec![primary, secondary], Duration::from_millis(50));

        let generation = composer.compose(&GenerationRequest::text("q")).await;
        assert_eq!(generation.text, "late but fine");
    }

    #[tokio::test]
    async fn test_exhaustion_returns_sentinel() {
        let composer = composer(
            vec![
                Arc::new(StubLlm::new("gemini", StubBehavior::Fail)),
                Arc::new(StubLlm::new("openrouter", StubBehavior::Fail)),
            ],
            Duration::from_secs(5),
        );

        let generation = composer.compose(&GenerationRequest::text("q")).await;
        assert_eq!(generation.text, ALL_FAILED);
        assert!(generation.is_exhausted());
    }

    #[tokio::test]
    async fn test_no_backends_is_exhausted() {
        let composer = AnswerComposer::new(Vec::new(), Duration::from_secs(1));
        assert!(composer.compose(&GenerationRequest::text("q")).await.is_exhausted());
    }
}
