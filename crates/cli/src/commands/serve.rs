//! `supportdesk serve` — Start the HTTP gateway.

use anyhow::Context;
use supportdesk_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> anyhow::Result<()> {
    let mut config = AppConfig::load().context("Failed to load config")?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("supportdesk gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Model:     {}", config.backend.model);

    supportdesk_gateway::start(config)
        .await
        .map_err(|e| anyhow::anyhow!("Gateway failed: {e}"))?;

    Ok(())
}
