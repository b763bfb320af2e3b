//! FAQ store — loads the knowledge base from a TOML file.
//!
//! The default GitHub Actions FAQ ships embedded in the binary; deployments
//! can point `kb.path` at their own file instead.

use serde::Deserialize;
use std::path::Path;
use supportdesk_core::error::KbError;
use supportdesk_core::faq::FaqEntry;
use tracing::info;

/// The built-in knowledge base, compiled into the binary.
const BUILTIN_FAQ: &str = include_str!("../data/github_actions_faq.toml");

/// On-disk shape of a knowledge base file.
#[derive(Deserialize)]
struct FaqFile {
    faqs: Vec<FaqEntry>,
}

/// An immutable, fully loaded knowledge base.
#[derive(Debug, Clone)]
pub struct FaqStore {
    entries: Vec<FaqEntry>,
}

impl FaqStore {
    /// Build a store from entries already in memory (used by tests).
    pub fn from_entries(entries: Vec<FaqEntry>) -> Self {
        Self { entries }
    }

    /// Load the built-in GitHub Actions FAQ.
    pub fn builtin() -> Self {
        // The embedded file is validated by the `builtin_parses` test.
        let file: FaqFile = toml::from_str(BUILTIN_FAQ)
            .unwrap_or_else(|_| FaqFile { faqs: Vec::new() });
        Self { entries: file.faqs }
    }

    /// Load a knowledge base from a TOML file at `path`.
    pub fn load_from(path: &Path) -> Result<Self, KbError> {
        let content = std::fs::read_to_string(path).map_err(|e| KbError::ReadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let file: FaqFile =
            toml::from_str(&content).map_err(|e| KbError::ParseError(e.to_string()))?;
        info!(path = %path.display(), entries = file.faqs.len(), "Knowledge base loaded");
        Ok(Self { entries: file.faqs })
    }

    /// All entries, in knowledge-base order.
    pub fn all_entries(&self) -> &[FaqEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_parses() {
        let file: FaqFile = toml::from_str(BUILTIN_FAQ).unwrap();
        assert_eq!(file.faqs.len(), 5);
        assert!(file.faqs[0].question.contains("secrets"));
    }

    #[test]
    fn builtin_store_is_nonempty() {
        let store = FaqStore::builtin();
        assert_eq!(store.len(), 5);
        assert!(!store.is_empty());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = FaqStore::load_from(Path::new("/nonexistent/faq.toml")).unwrap_err();
        assert!(matches!(err, KbError::ReadError { .. }));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let dir = std::env::temp_dir().join("supportdesk-kb-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.toml");
        std::fs::write(&path, "faqs = \"not a list\"").unwrap();
        let err = FaqStore::load_from(&path).unwrap_err();
        assert!(matches!(err, KbError::ParseError(_)));
    }
}
