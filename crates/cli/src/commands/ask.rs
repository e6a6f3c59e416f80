use chowbot_agent::{AgentReply, AgentRuntime, AgentServices};
use chowbot_core::config::{AppConfig, LoadOptions};
use chowbot_core::spin::EMPTY_POOL_MESSAGE;

use crate::commands::CommandResult;

const COMMAND: &str = "ask";

/// Runs one message through the agent outside any guild, so the default style applies.
pub fn run(text: &str) -> CommandResult {
    let text = text.trim();
    if text.is_empty() {
        return CommandResult::failure(COMMAND, "invalid_input", "message text must not be empty", 2);
    }

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::failure(COMMAND, "config_validation", error.to_string(), 2),
    };

    let services = match AgentServices::from_config(&config) {
        Ok(services) => services,
        Err(error) => return CommandResult::failure(COMMAND, "service_wiring", error.to_string(), 3),
    };
    let agent = AgentRuntime::new(services);

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                1,
            )
        }
    };

    let reply = runtime.block_on(agent.handle_message(text, None));
    CommandResult::success(COMMAND, render_reply(reply))
}

fn render_reply(reply: AgentReply) -> String {
    match reply {
        AgentReply::Text(text) => text,
        AgentReply::Food(answer) => answer.display,
        AgentReply::Spin { candidates, .. } if candidates.is_empty() => EMPTY_POOL_MESSAGE.to_string(),
        AgentReply::Spin { candidates, source } => {
            format!("spin candidates ({}): {}", source.as_str(), candidates.join("、"))
        }
    }
}

#[cfg(test)]
mod tests {
    use chowbot_agent::AgentReply;
    use chowbot_core::spin::EMPTY_POOL_MESSAGE;
    use chowbot_core::SpinSource;

    use super::render_reply;

    #[test]
    fn spin_replies_list_the_pool_instead_of_animating() {
        let reply = AgentReply::Spin {
            candidates: vec!["拉麵".to_string(), "火鍋".to_string()],
            source: SpinSource::Wishlist,
        };
        assert_eq!(render_reply(reply), "spin candidates (wishlist): 拉麵、火鍋");

        let empty = AgentReply::Spin { candidates: Vec::new(), source: SpinSource::Auto };
        assert_eq!(render_reply(empty), EMPTY_POOL_MESSAGE);
    }
}
