//! Text generation for matchup recaps.
//!
//! Defines the `TextGenerator` trait and the OpenAI implementation.

pub mod openai;

use anyhow::Result;
use async_trait::async_trait;

/// Default output bound per matchup recap, in tokens.
pub const DEFAULT_MAX_TOKENS: u32 = 280;
/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.85;

/// One generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Abstraction over text-generation providers.
///
/// Implementors return the generated prose, or an error for any failure
/// including empty output. Timeouts are enforced by the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Model identifier string.
    fn model_name(&self) -> String;
}
