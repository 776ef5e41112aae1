//! LLM provider trait for generating answers

use async_trait::async_trait;

use crate::error::Result;

/// A single generation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Complete prompt text
    pub prompt: String,
    /// Ask the backend for a JSON response when it supports it
    pub json_output: bool,
}

impl GenerationRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            json_output: false,
        }
    }

    pub fn json(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            json_output: true,
        }
    }
}

/// Trait for LLM-based answer generation
///
/// Implementations:
/// - `GeminiClient`: Google Generative Language API (gemini-1.5-flash)
/// - `OpenAiCompatibleClient`: chat-completions endpoints such as OpenRouter
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for the prompt
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
