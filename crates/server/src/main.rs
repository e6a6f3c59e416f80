mod bootstrap;
mod health;

use anyhow::Result;
use chowbot_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use chowbot_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Logging needs the config, so load it first and reuse it for bootstrap.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    health::spawn(
        &app.config.server.bind_address,
        app.config.server.health_check_port,
        health::HealthState::new(
            app.readiness.clone(),
            vec![app.config.storage.wishlist_path.clone(), app.config.storage.style_path.clone()],
        ),
    )
    .await?;

    tracing::info!(
        event_name = "system.server.chat_transport_mode",
        transport_mode = "noop",
        generator_configured = app.agent_runtime.generator_configured(),
        correlation_id = "bootstrap",
        "chat runner transport mode initialized"
    );

    app.chat_runner.start().await?;

    tracing::info!(event_name = "system.server.started", correlation_id = "bootstrap", "chowbot-server started");
    wait_for_shutdown().await?;
    tracing::info!(event_name = "system.server.stopping", correlation_id = "shutdown", "chowbot-server stopping");

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
