//! The request-handling pipeline between an authenticated caller and the
//! generation backend: knowledge retrieval, bounded prompt assembly,
//! serialized backend invocation, and reply extraction.

pub mod extract;
pub mod gate;
pub mod pipeline;
pub mod prompt;

pub use extract::{extract_reply, wrap_code_fence};
pub use gate::AdmissionGate;
pub use pipeline::{ChatPipeline, ChatReply};
pub use prompt::assemble_prompt;
