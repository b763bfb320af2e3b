//! # supportdesk Core
//!
//! Domain types, traits, and error definitions for the supportdesk FAQ
//! assistant. This crate has **zero framework dependencies** — it defines
//! the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The generation backend is a trait here; implementations live in the
//! backend crate. This enables:
//! - Swapping the real model for a scripted stub in tests
//! - Clean dependency graph (all crates depend inward on core)

pub mod backend;
pub mod error;
pub mod faq;
pub mod user;

// Re-export key types at crate root for ergonomics
pub use backend::{GenerationBackend, SamplingPolicy};
pub use error::{AuthError, BackendError, Error, KbError, PromptError, Result};
pub use faq::{FaqEntry, ScoredEntry};
pub use user::{SessionClaims, User, UserSummary};
