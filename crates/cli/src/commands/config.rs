use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chowbot_core::config::{AppConfig, LoadOptions};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

struct ConfigField {
    key_path: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in effective_fields(&config) {
        let source = field_source(
            field.key_path,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key_path, &field.value, source));
    }

    lines.join("\n")
}

fn effective_fields(config: &AppConfig) -> Vec<ConfigField> {
    vec![
        ConfigField {
            key_path: "discord.bot_token",
            env_keys: &["CHOWBOT_DISCORD_BOT_TOKEN", "DISCORD_BOT_TOKEN"],
            value: redact_token(config.discord.bot_token.expose_secret()),
        },
        ConfigField {
            key_path: "llm.base_url",
            env_keys: &["CHOWBOT_LLM_BASE_URL", "LLM_BASE_URL"],
            value: config.llm.base_url.clone(),
        },
        ConfigField {
            key_path: "llm.model",
            env_keys: &["CHOWBOT_LLM_MODEL"],
            value: config.llm.model.clone(),
        },
        ConfigField {
            key_path: "llm.api_key",
            env_keys: &["CHOWBOT_LLM_API_KEY", "LLM_API_KEY", "OPENAI_API_KEY"],
            value: redact_optional(config.llm.api_key.as_ref()),
        },
        ConfigField {
            key_path: "llm.timeout_secs",
            env_keys: &["CHOWBOT_LLM_TIMEOUT_SECS"],
            value: config.llm.timeout_secs.to_string(),
        },
        ConfigField {
            key_path: "gateway.google_api_key",
            env_keys: &["CHOWBOT_GOOGLE_API_KEY", "GOOGLE_API_KEY"],
            value: redact_optional(config.gateway.google_api_key.as_ref()),
        },
        ConfigField {
            key_path: "gateway.usda_api_key",
            env_keys: &["CHOWBOT_USDA_API_KEY", "USDA_API_KEY"],
            value: redact_optional(config.gateway.usda_api_key.as_ref()),
        },
        ConfigField {
            key_path: "gateway.timeout_secs",
            env_keys: &["CHOWBOT_GATEWAY_TIMEOUT_SECS"],
            value: config.gateway.timeout_secs.to_string(),
        },
        ConfigField {
            key_path: "gateway.nutrition_timeout_secs",
            env_keys: &["CHOWBOT_GATEWAY_NUTRITION_TIMEOUT_SECS"],
            value: config.gateway.nutrition_timeout_secs.to_string(),
        },
        ConfigField {
            key_path: "gateway.search_radius_m",
            env_keys: &["CHOWBOT_GATEWAY_SEARCH_RADIUS_M"],
            value: config.gateway.search_radius_m.to_string(),
        },
        ConfigField {
            key_path: "storage.wishlist_path",
            env_keys: &["CHOWBOT_STORAGE_WISHLIST_PATH"],
            value: config.storage.wishlist_path.display().to_string(),
        },
        ConfigField {
            key_path: "storage.style_path",
            env_keys: &["CHOWBOT_STORAGE_STYLE_PATH"],
            value: config.storage.style_path.display().to_string(),
        },
        ConfigField {
            key_path: "server.bind_address",
            env_keys: &["CHOWBOT_SERVER_BIND_ADDRESS"],
            value: config.server.bind_address.clone(),
        },
        ConfigField {
            key_path: "server.health_check_port",
            env_keys: &["CHOWBOT_SERVER_HEALTH_CHECK_PORT"],
            value: config.server.health_check_port.to_string(),
        },
        ConfigField {
            key_path: "logging.level",
            env_keys: &["CHOWBOT_LOGGING_LEVEL", "CHOWBOT_LOG_LEVEL"],
            value: config.logging.level.clone(),
        },
        ConfigField {
            key_path: "logging.format",
            env_keys: &["CHOWBOT_LOGGING_FORMAT", "CHOWBOT_LOG_FORMAT"],
            value: format!("{:?}", config.logging.format),
        },
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("chowbot.toml"), PathBuf::from("config/chowbot.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(doc: &Value, key_path: &str) -> bool {
    let mut current = doc;
    for segment in key_path.split('.') {
        let Some(next) = current.get(segment) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_optional(secret: Option<&SecretString>) -> String {
    match secret {
        Some(secret) => redact_token(secret.expose_secret()),
        None => "<unset>".to_string(),
    }
}

/// Keeps a short prefix so operators can tell two tokens apart without seeing either.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    let prefix: String = trimmed.chars().take(4).collect();
    if trimmed.chars().count() > 8 {
        return format!("{prefix}***");
    }

    "<redacted>".to_string()
}

#[cfg(test)]
mod tests {
    use super::redact_token;

    #[test]
    fn redaction_never_reveals_short_secrets() {
        assert_eq!(redact_token("   "), "<empty>");
        assert_eq!(redact_token("abcd1234"), "<redacted>");
        assert_eq!(redact_token("MTIzNDU2Nzg5.secret"), "MTIz***");
    }
}
