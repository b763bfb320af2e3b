//! Knowledge base store and similarity retriever.
//!
//! The store loads a fixed set of question/answer pairs once at startup and
//! is shared read-only by every request (wrap it in an `Arc`; no locking
//! needed). Retrieval ranks entries with a cheap, explainable string
//! similarity — no embeddings, no network.

pub mod retrieve;
pub mod store;

pub use retrieve::{DEFAULT_TOP_N, SCORE_THRESHOLD, similarity_ratio};
pub use store::FaqStore;
