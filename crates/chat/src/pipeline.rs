//! The chat pipeline: retrieval → assembly → ceiling check → gated
//! generation → extraction → formatting.

use std::sync::Arc;
use std::time::Duration;

use supportdesk_core::backend::{GenerationBackend, SamplingPolicy};
use supportdesk_core::error::{Error, PromptError};
use supportdesk_core::faq::FaqEntry;
use supportdesk_kb::{DEFAULT_TOP_N, FaqStore};
use tracing::{debug, info};

use crate::extract::{extract_reply, wrap_code_fence};
use crate::gate::AdmissionGate;
use crate::prompt::assemble_prompt;

/// The assistant's answer to one chat request.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ChatReply {
    pub response: String,
    /// Format hint for downstream rendering.
    pub response_type: String,
    /// Knowledge entries that informed the answer, for transparency.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<FaqEntry>,
}

/// Ties the knowledge store, prompt assembly, and the generation backend
/// together. One pipeline per backend instance; shared via `Arc`.
pub struct ChatPipeline {
    store: Arc<FaqStore>,
    backend: Arc<dyn GenerationBackend>,
    gate: AdmissionGate,
    persona: String,
    policy: SamplingPolicy,
}

impl ChatPipeline {
    pub fn new(
        store: Arc<FaqStore>,
        backend: Arc<dyn GenerationBackend>,
        persona: impl Into<String>,
        queue_timeout: Duration,
    ) -> Self {
        Self {
            store,
            backend,
            gate: AdmissionGate::new(queue_timeout),
            persona: persona.into(),
            policy: SamplingPolicy::default(),
        }
    }

    /// Answer one user message.
    ///
    /// The token ceiling is enforced before the gate is even queued on, so
    /// a doomed prompt never costs backend resources.
    pub async fn respond(&self, message: &str) -> Result<ChatReply, Error> {
        let retrieved = self.store.retrieve(message, DEFAULT_TOP_N);
        let prompt = assemble_prompt(&self.persona, &retrieved, message);

        let tokens = self.backend.count_tokens(&prompt).await?;
        let limit = self.backend.context_window();
        if tokens > limit {
            debug!(tokens, limit, "Prompt rejected before generation");
            return Err(PromptError::TooLong { tokens, limit }.into());
        }

        let permit = self.gate.admit().await?;
        let raw = self.backend.generate(&prompt, &self.policy).await?;
        drop(permit);

        let mut response = wrap_code_fence(extract_reply(&raw));

        let sources: Vec<FaqEntry> = retrieved.into_iter().map(|s| s.entry).collect();
        if !sources.is_empty() {
            response.push_str("\n\n---\nRelated FAQ:");
            for entry in &sources {
                response.push_str(&format!("\nQ: {}\nA: {}", entry.question, entry.answer));
            }
        }

        info!(
            backend = self.backend.name(),
            prompt_tokens = tokens,
            sources = sources.len(),
            "Chat reply produced"
        );

        Ok(ChatReply {
            response,
            response_type: "markdown".into(),
            sources,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use supportdesk_core::error::BackendError;

    /// Scripted backend: returns a fixed raw output and counts calls.
    struct ScriptedBackend {
        output: String,
        window: usize,
        generate_calls: AtomicUsize,
        hold: Option<Duration>,
    }

    impl ScriptedBackend {
        fn new(output: &str) -> Self {
            Self {
                output: output.into(),
                window: 2048,
                generate_calls: AtomicUsize::new(0),
                hold: None,
            }
        }

        fn with_window(mut self, window: usize) -> Self {
            self.window = window;
            self
        }

        fn with_hold(mut self, hold: Duration) -> Self {
            self.hold = Some(hold);
            self
        }

        fn calls(&self) -> usize {
            self.generate_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl GenerationBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        fn context_window(&self) -> usize {
            self.window
        }

        async fn count_tokens(&self, text: &str) -> Result<usize, BackendError> {
            // 4-chars-per-token heuristic keeps test inputs predictable.
            Ok(text.len().div_ceil(4))
        }

        async fn generate(
            &self,
            _prompt: &str,
            _policy: &SamplingPolicy,
        ) -> Result<String, BackendError> {
            self.generate_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(hold) = self.hold {
                tokio::time::sleep(hold).await;
            }
            Ok(self.output.clone())
        }
    }

    fn empty_store() -> Arc<FaqStore> {
        Arc::new(FaqStore::from_entries(vec![]))
    }

    #[tokio::test]
    async fn happy_path_extracts_the_reply() {
        let backend = Arc::new(ScriptedBackend::new("persona stuff Assistant: Hello!"));
        let pipeline = ChatPipeline::new(
            empty_store(),
            backend.clone(),
            "P.",
            Duration::from_secs(1),
        );
        let reply = pipeline.respond("Hi").await.unwrap();
        assert_eq!(reply.response, "Hello!");
        assert_eq!(reply.response_type, "markdown");
        assert!(reply.sources.is_empty());
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn overlong_prompt_never_reaches_the_backend() {
        let backend = Arc::new(ScriptedBackend::new("Assistant: unused").with_window(8));
        let pipeline = ChatPipeline::new(
            empty_store(),
            backend.clone(),
            "P.",
            Duration::from_secs(1),
        );
        let err = pipeline.respond("a long enough message").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Prompt(PromptError::TooLong { limit: 8, .. })
        ));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn sources_are_cited_when_knowledge_was_used() {
        let store = Arc::new(FaqStore::from_entries(vec![FaqEntry::new(
            "How do I use secrets in a workflow?",
            "Store them in repo settings.",
        )]));
        let backend = Arc::new(ScriptedBackend::new("Assistant: Like this."));
        let pipeline = ChatPipeline::new(store, backend, "P.", Duration::from_secs(1));
        let reply = pipeline.respond("How do I use secrets?").await.unwrap();
        assert_eq!(reply.sources.len(), 1);
        assert!(reply.response.contains("Related FAQ:"));
        assert!(reply.response.contains("Store them in repo settings."));
    }

    #[tokio::test]
    async fn concurrent_requests_serialize_on_the_gate() {
        let backend = Arc::new(
            ScriptedBackend::new("Assistant: slow").with_hold(Duration::from_millis(200)),
        );
        let pipeline = Arc::new(ChatPipeline::new(
            empty_store(),
            backend.clone(),
            "P.",
            Duration::from_millis(20),
        ));

        let first = {
            let pipeline = pipeline.clone();
            tokio::spawn(async move { pipeline.respond("one").await })
        };
        // Let the first request take the gate.
        tokio::time::sleep(Duration::from_millis(50)).await;

        let second = pipeline.respond("two").await;
        assert!(matches!(
            second,
            Err(Error::Backend(BackendError::ResourceExhausted))
        ));
        // The queued-then-rejected call never invoked the backend.
        assert_eq!(backend.calls(), 1);

        assert!(first.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn code_fence_is_applied_to_extracted_reply() {
        let backend = Arc::new(ScriptedBackend::new(
            "Assistant: try:\n```yaml\non: push\n```",
        ));
        let pipeline = ChatPipeline::new(empty_store(), backend, "P.", Duration::from_secs(1));
        let reply = pipeline.respond("Hi").await.unwrap();
        assert!(reply.response.starts_with("```\n"));
    }
}
