//! Credential and session management.
//!
//! The user directory is ephemeral: an in-memory map behind a lock,
//! injected explicitly wherever it is needed — no process-wide
//! singleton. Session tokens are HMAC-SHA256 signed, carry
//! `{email, sub, exp}`, and expire after a fixed lifetime.

pub mod directory;
pub mod token;

pub use directory::UserDirectory;
pub use token::{SessionSigner, TOKEN_TTL_SECS};
