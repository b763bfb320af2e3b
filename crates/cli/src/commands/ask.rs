//! `supportdesk ask` — answer one message through the full pipeline,
//! skipping the HTTP surface entirely. Useful for smoke-testing a model.

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use supportdesk_backend::LocalBackend;
use supportdesk_chat::ChatPipeline;
use supportdesk_config::AppConfig;
use supportdesk_kb::FaqStore;

pub async fn run(message: &str) -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;

    let store = Arc::new(match &config.kb.path {
        Some(path) => FaqStore::load_from(path)?,
        None => FaqStore::builtin(),
    });

    let backend = Arc::new(LocalBackend::new(
        &config.backend.model,
        config.backend.context_window,
    ));

    let pipeline = ChatPipeline::new(
        store,
        backend,
        &config.persona,
        Duration::from_secs(config.backend.queue_timeout_secs),
    );

    let reply = pipeline.respond(message).await?;
    println!("{}", reply.response);

    Ok(())
}
