//! `supportdesk kb` — show what a query retrieves and at what score.

use anyhow::Context;
use supportdesk_config::AppConfig;
use supportdesk_kb::{DEFAULT_TOP_N, FaqStore};

pub fn run(query: &str) -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;

    let store = match &config.kb.path {
        Some(path) => FaqStore::load_from(path)?,
        None => FaqStore::builtin(),
    };

    let results = store.retrieve(query, DEFAULT_TOP_N);
    if results.is_empty() {
        println!("No entries above threshold for: {query}");
        return Ok(());
    }

    for result in results {
        println!("[{:.3}] Q: {}", result.score, result.entry.question);
        println!("        A: {}", result.entry.answer);
    }

    Ok(())
}
