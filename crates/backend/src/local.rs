//! Local inference backend — runs a GGUF-quantized model on the host CPU.
//!
//! The model is a heavyweight singleton: downloaded (or read from disk)
//! once, loaded into memory once, and never reinitialized per request.
//! Candle inference is single-threaded CPU work, so the loaded state sits
//! behind a `tokio::sync::Mutex` and each call runs on a blocking thread.
//! Callers are expected to serialize through the chat crate's admission
//! gate; the mutex is the last line of defense, not the queueing policy.

use async_trait::async_trait;
use candle_core::quantized::gguf_file;
use candle_core::{Device, Tensor};
use candle_transformers::generation::{LogitsProcessor, Sampling};
use candle_transformers::models::quantized_llama as qlm;
use hf_hub::api::sync::Api;
use std::path::Path;
use std::sync::Arc;
use supportdesk_core::backend::{GenerationBackend, SamplingPolicy};
use supportdesk_core::error::BackendError;
use tokenizers::Tokenizer;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Friendly aliases resolving to HuggingFace repos + filenames.
struct ModelPreset {
    repo: &'static str,
    gguf_file: &'static str,
    tokenizer_repo: &'static str,
}

fn resolve_preset(alias: &str) -> Option<ModelPreset> {
    match alias.to_lowercase().as_str() {
        "tinyllama" | "tinyllama-1.1b" => Some(ModelPreset {
            repo: "TheBloke/TinyLlama-1.1B-Chat-v1.0-GGUF",
            gguf_file: "tinyllama-1.1b-chat-v1.0.Q4_K_M.gguf",
            tokenizer_repo: "TinyLlama/TinyLlama-1.1B-Chat-v1.0",
        }),
        "qwen:0.5b" | "qwen-0.5b" => Some(ModelPreset {
            repo: "Qwen/Qwen2-0.5B-Instruct-GGUF",
            gguf_file: "qwen2-0_5b-instruct-q4_k_m.gguf",
            tokenizer_repo: "Qwen/Qwen2-0.5B-Instruct",
        }),
        _ => None,
    }
}

/// A backend that runs a GGUF model locally via Candle.
pub struct LocalBackend {
    inner: Arc<Mutex<Option<LocalModelState>>>,
    model_name: String,
    context_window: usize,
}

#[derive(Debug)]
struct LocalModelState {
    model: qlm::ModelWeights,
    tokenizer: Tokenizer,
    device: Device,
    eos_token_id: u32,
}

impl LocalBackend {
    /// Create a backend for a preset alias or a path to a `.gguf` file.
    /// The model is loaded lazily on first use.
    pub fn new(model_name: &str, context_window: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(None)),
            model_name: model_name.to_string(),
            context_window,
        }
    }

    /// Eagerly load the model (downloads if needed).
    pub fn load(model_name: &str, context_window: usize) -> Result<Self, BackendError> {
        let state = LocalModelState::load(model_name)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(Some(state))),
            model_name: model_name.to_string(),
            context_window,
        })
    }

    /// Load the model if this is the first call.
    async fn ensure_loaded(&self) -> Result<(), BackendError> {
        let state = self.inner.lock().await;
        if state.is_some() {
            return Ok(());
        }
        drop(state);

        info!(model = %self.model_name, "Loading local model on first use");
        let name = self.model_name.clone();
        let loaded = tokio::task::spawn_blocking(move || LocalModelState::load(&name))
            .await
            .map_err(|e| BackendError::Fault(format!("Model loading task failed: {e}")))??;

        let mut state = self.inner.lock().await;
        *state = Some(loaded);
        Ok(())
    }
}

impl LocalModelState {
    fn load(model_name: &str) -> Result<Self, BackendError> {
        let device = Device::Cpu;

        let (model_path, tokenizer_path) =
            if Path::new(model_name).exists() && model_name.ends_with(".gguf") {
                let path = Path::new(model_name).to_path_buf();
                let tokenizer = path.with_file_name("tokenizer.json");
                if !tokenizer.exists() {
                    return Err(BackendError::Fault(format!(
                        "No tokenizer.json next to {model_name}"
                    )));
                }
                (path, tokenizer)
            } else {
                let preset = resolve_preset(model_name).ok_or_else(|| {
                    BackendError::Fault(format!(
                        "Unknown model '{model_name}'. Presets: tinyllama, qwen:0.5b; \
                         or provide a path to a .gguf file."
                    ))
                })?;
                let api = Api::new()
                    .map_err(|e| BackendError::Fault(format!("HuggingFace Hub error: {e}")))?;
                let model_path = api
                    .model(preset.repo.to_string())
                    .get(preset.gguf_file)
                    .map_err(|e| {
                        BackendError::Fault(format!("Failed to download {}: {e}", preset.gguf_file))
                    })?;
                let tokenizer_path = api
                    .model(preset.tokenizer_repo.to_string())
                    .get("tokenizer.json")
                    .map_err(|e| BackendError::Fault(format!("Failed to download tokenizer: {e}")))?;
                (model_path, tokenizer_path)
            };

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| BackendError::Fault(format!("Failed to load tokenizer: {e}")))?;

        let mut file = std::fs::File::open(&model_path)
            .map_err(|e| BackendError::Fault(format!("Failed to open model file: {e}")))?;
        let gguf = gguf_file::Content::read(&mut file)
            .map_err(|e| BackendError::Fault(format!("Failed to parse GGUF file: {e}")))?;
        let model = qlm::ModelWeights::from_gguf(gguf, &mut file, &device)
            .map_err(classify_candle)?;

        let eos_token_id = tokenizer
            .token_to_id("</s>")
            .or_else(|| tokenizer.token_to_id("<|endoftext|>"))
            .or_else(|| tokenizer.token_to_id("<|im_end|>"))
            .unwrap_or(2);

        info!(path = %model_path.display(), eos_token_id, "Local model loaded");

        Ok(Self {
            model,
            tokenizer,
            device,
            eos_token_id,
        })
    }

    fn count_tokens(&self, text: &str) -> Result<usize, BackendError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| BackendError::Fault(format!("Tokenization failed: {e}")))?;
        Ok(encoding.get_ids().len())
    }

    /// Tokenize, sample up to `max_new_tokens`, decode.
    fn generate(
        &mut self,
        prompt: &str,
        policy: &SamplingPolicy,
        context_window: usize,
    ) -> Result<String, BackendError> {
        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| BackendError::Fault(format!("Tokenization failed: {e}")))?;
        let prompt_tokens = encoding.get_ids();

        // Prompt plus new tokens must stay inside the window.
        let budget = policy
            .max_new_tokens
            .min(context_window.saturating_sub(prompt_tokens.len()));

        debug!(
            prompt_tokens = prompt_tokens.len(),
            budget, "Starting local generation"
        );

        let mut logits_processor = LogitsProcessor::from_sampling(
            42,
            Sampling::TopKThenTopP {
                k: policy.top_k,
                p: policy.top_p as f64,
                temperature: policy.temperature as f64,
            },
        );

        let mut input = Tensor::new(prompt_tokens, &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(classify_candle)?;
        let mut generated: Vec<u32> = Vec::new();

        for _ in 0..budget {
            let logits = self
                .model
                .forward(&input, generated.len())
                .map_err(classify_candle)?;
            let logits = logits.squeeze(0).map_err(classify_candle)?;
            let last = logits.dim(0).map_err(classify_candle)? - 1;
            let logits = logits.get(last).map_err(classify_candle)?;

            let next = logits_processor.sample(&logits).map_err(classify_candle)?;
            if next == self.eos_token_id {
                break;
            }
            generated.push(next);

            input = Tensor::new(&[next][..], &self.device)
                .and_then(|t| t.unsqueeze(0))
                .map_err(classify_candle)?;
        }

        let output = self
            .tokenizer
            .decode(&generated, true)
            .map_err(|e| BackendError::Fault(format!("Detokenization failed: {e}")))?;

        debug!(
            completion_tokens = generated.len(),
            output_len = output.len(),
            "Generation complete"
        );

        // The prompt is not echoed by quantized_llama, but the reply may
        // still carry trailing special tokens.
        Ok(output
            .trim_end_matches("</s>")
            .trim_end_matches("<|im_end|>")
            .to_string())
    }
}

/// Classify Candle failures into the stable taxonomy. Device/allocation
/// failures are retryable resource exhaustion; everything else is a fault.
fn classify_candle(e: candle_core::Error) -> BackendError {
    match e {
        candle_core::Error::Cuda(_) => BackendError::ResourceExhausted,
        other => BackendError::Fault(other.to_string()),
    }
}

#[async_trait]
impl GenerationBackend for LocalBackend {
    fn name(&self) -> &str {
        "local"
    }

    fn context_window(&self) -> usize {
        self.context_window
    }

    async fn count_tokens(&self, text: &str) -> Result<usize, BackendError> {
        self.ensure_loaded().await?;
        let guard = self.inner.lock().await;
        match guard.as_ref() {
            Some(state) => state.count_tokens(text),
            None => Err(BackendError::Fault("model not loaded".into())),
        }
    }

    async fn generate(
        &self,
        prompt: &str,
        policy: &SamplingPolicy,
    ) -> Result<String, BackendError> {
        self.ensure_loaded().await?;

        let inner = self.inner.clone();
        let prompt = prompt.to_string();
        let policy = *policy;
        let window = self.context_window;

        // Candle is CPU-bound; keep it off the async workers.
        tokio::task::spawn_blocking(move || {
            let mut guard = inner.blocking_lock();
            match guard.as_mut() {
                Some(state) => state.generate(&prompt, &policy, window),
                None => Err(BackendError::Fault("model not loaded".into())),
            }
        })
        .await
        .map_err(|e| BackendError::Fault(format!("Inference task panicked: {e}")))?
    }
}
