//! Generation backend adapters.
//!
//! The only production adapter runs GGUF-quantized models locally via
//! [Candle](https://github.com/huggingface/candle): no network, no API
//! keys. The adapter owns failure classification — Candle errors are mapped
//! into the structured `BackendError` taxonomy here, so nothing upstream
//! ever inspects error message text.

pub mod local;

pub use local::LocalBackend;
