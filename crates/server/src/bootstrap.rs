use std::sync::Arc;

use chowbot_agent::runtime::ServicesError;
use chowbot_agent::{AgentRuntime, AgentServices};
use chowbot_chat::{
    default_dispatcher, ChatRunner, GuildRuntimeState, NoopChatSender, NoopChatTransport,
    ReconnectPolicy,
};
use chowbot_core::config::{AppConfig, ConfigError, LoadOptions};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub agent_runtime: Arc<AgentRuntime>,
    pub chat_runner: ChatRunner,
    pub readiness: Readiness,
}

/// Startup facts the health endpoint reports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Readiness {
    pub generator_configured: bool,
    pub places_configured: bool,
    pub nutrition_configured: bool,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("service wiring failed: {0}")]
    Services(#[from] ServicesError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", correlation_id = "bootstrap", "starting application bootstrap");
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    config.discord.require_token()?;

    let services = AgentServices::from_config(&config)?;
    let readiness = Readiness {
        generator_configured: services.llm.is_configured(),
        places_configured: true,
        nutrition_configured: services.nutrition.is_some(),
    };
    info!(
        event_name = "system.bootstrap.services_ready",
        correlation_id = "bootstrap",
        generator_configured = readiness.generator_configured,
        nutrition_configured = readiness.nutrition_configured,
        wishlist_path = %config.storage.wishlist_path.display(),
        style_path = %config.storage.style_path.display(),
        "agent services wired"
    );

    let agent_runtime = Arc::new(AgentRuntime::new(services));
    let guild_state = Arc::new(GuildRuntimeState::new());
    let sender = Arc::new(NoopChatSender);
    let dispatcher = default_dispatcher(agent_runtime.clone(), guild_state, sender.clone());
    let chat_runner = ChatRunner::new(
        Arc::new(NoopChatTransport),
        sender,
        dispatcher,
        ReconnectPolicy::default(),
    );

    Ok(Application { config, agent_runtime, chat_runner, readiness })
}
