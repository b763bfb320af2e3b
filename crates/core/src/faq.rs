//! Knowledge base entry types.
//!
//! The knowledge base is a fixed set of curated question/answer pairs,
//! loaded once at startup and shared read-only by all requests.

use serde::{Deserialize, Serialize};

/// A single curated question/answer pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

impl FaqEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// A knowledge entry paired with its similarity score against a query.
///
/// Ephemeral: computed per request, never retained.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredEntry {
    /// Normalized similarity in `[0, 1]`.
    pub score: f32,
    pub entry: FaqEntry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_serializes_to_plain_fields() {
        let entry = FaqEntry::new("How do I use secrets?", "Store them in repo settings.");
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"question\""));
        assert!(json.contains("\"answer\""));
    }
}
