//! GenerationBackend trait — the abstraction over the text generation model.
//!
//! A backend accepts a bounded prompt and returns raw generated text. It is
//! a heavyweight, stateful resource loaded once at process start; callers
//! must serialize access through the admission gate in the chat crate — the
//! trait itself makes no concurrency promises beyond `Send + Sync`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// Fixed sampling configuration for generation calls.
///
/// These are policy constants, not user-controlled knobs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SamplingPolicy {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: usize,
    /// Budget of new tokens per call; adapters additionally clamp so that
    /// prompt + new tokens never exceed the context window.
    pub max_new_tokens: usize,
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self {
            temperature: 0.8,
            top_p: 0.95,
            top_k: 50,
            max_new_tokens: 300,
        }
    }
}

/// The generation backend trait.
///
/// Implementations: the Candle GGUF local backend, scripted stubs in tests.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// A human-readable name for this backend (e.g., "local").
    fn name(&self) -> &str;

    /// The model's context window in tokens. Prompts are rejected before
    /// invocation when they exceed this ceiling.
    fn context_window(&self) -> usize;

    /// Count tokens in `text` using the model's own vocabulary.
    async fn count_tokens(&self, text: &str) -> std::result::Result<usize, BackendError>;

    /// Run generation on a prompt already known to fit the context window.
    /// Returns the raw model output, turn markers and all.
    async fn generate(
        &self,
        prompt: &str,
        policy: &SamplingPolicy,
    ) -> std::result::Result<String, BackendError>;
}
