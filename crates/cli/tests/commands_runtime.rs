use std::env;
use std::sync::{Mutex, OnceLock};

use chowbot_cli::commands::{ask, config, doctor};
use serde_json::Value;

#[test]
fn config_redacts_secrets_and_attributes_env_sources() {
    with_env(
        &[
            ("CHOWBOT_DISCORD_BOT_TOKEN", "MTIzNDU2Nzg5.discord-secret"),
            ("GOOGLE_API_KEY", "AIzaSy-maps-secret"),
        ],
        || {
            let output = config::run();

            assert!(!output.contains("discord-secret"));
            assert!(!output.contains("maps-secret"));
            assert!(output
                .contains("- discord.bot_token = MTIz*** (source: env (CHOWBOT_DISCORD_BOT_TOKEN))"));
            assert!(output.contains("- gateway.google_api_key = AIza*** (source: env (GOOGLE_API_KEY))"));
            assert!(output.contains("- gateway.usda_api_key = <unset> (source: default)"));
            assert!(output.contains("- gateway.search_radius_m = 2000 (source: default)"));
        },
    );
}

#[test]
fn config_reports_validation_failure() {
    with_env(&[("CHOWBOT_GATEWAY_SEARCH_RADIUS_M", "0")], || {
        let output = config::run();
        assert!(output.starts_with("config validation failed"));
        assert!(output.contains("gateway.search_radius_m"));
    });
}

#[test]
fn doctor_passes_with_required_credentials_and_skips_optional_ones() {
    with_env(
        &[("CHOWBOT_DISCORD_BOT_TOKEN", "bot-token"), ("CHOWBOT_GOOGLE_API_KEY", "maps-key")],
        || {
            let result = doctor::run(true);
            assert_eq!(result.exit_code, 0, "expected passing doctor report");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["overall_status"], "pass");
            assert_eq!(check_status(&payload, "places_credentials"), "pass");
            assert_eq!(check_status(&payload, "generator_credentials"), "skipped");
            assert_eq!(check_status(&payload, "nutrition_credentials"), "skipped");
            assert_eq!(check_status(&payload, "storage_directories"), "pass");
        },
    );
}

#[test]
fn doctor_fails_without_places_key() {
    with_env(&[("CHOWBOT_DISCORD_BOT_TOKEN", "bot-token")], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 1);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "fail");
        assert_eq!(check_status(&payload, "discord_token_readiness"), "pass");
        assert_eq!(check_status(&payload, "places_credentials"), "fail");
    });
}

#[test]
fn doctor_fails_when_storage_directory_is_missing() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let missing = dir.path().join("nested").join("wishlist.json");
    let missing = missing.to_string_lossy().into_owned();

    with_env(
        &[
            ("CHOWBOT_DISCORD_BOT_TOKEN", "bot-token"),
            ("CHOWBOT_GOOGLE_API_KEY", "maps-key"),
            ("CHOWBOT_STORAGE_WISHLIST_PATH", missing.as_str()),
        ],
        || {
            let result = doctor::run(false);
            assert_eq!(result.exit_code, 1);
            assert!(result.output.starts_with("doctor: one or more readiness checks failed"));
            assert!(result.output.contains("- [fail] storage_directories:"));
        },
    );
}

#[test]
fn doctor_skips_dependent_checks_when_config_is_invalid() {
    with_env(&[("CHOWBOT_LLM_TIMEOUT_SECS", "0")], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 1);

        let payload = parse_payload(&result.output);
        assert_eq!(check_status(&payload, "config_validation"), "fail");
        assert_eq!(check_status(&payload, "storage_directories"), "skipped");
    });
}

#[test]
fn ask_rejects_blank_text_before_loading_config() {
    with_env(&[("CHOWBOT_LLM_TIMEOUT_SECS", "0")], || {
        let result = ask::run("   ");
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "ask");
        assert_eq!(payload["error_class"], "invalid_input");
    });
}

#[test]
fn ask_returns_config_failure_for_invalid_env() {
    with_env(&[("CHOWBOT_LLM_TIMEOUT_SECS", "0")], || {
        let result = ask::run("附近有什麼好吃的");
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn ask_requires_places_key() {
    with_env(&[], || {
        let result = ask::run("附近有什麼好吃的");
        assert_eq!(result.exit_code, 3);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "service_wiring");
        assert!(payload["message"].as_str().unwrap_or_default().contains("GOOGLE_API_KEY"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn check_status<'a>(payload: &'a Value, name: &str) -> &'a str {
    payload["checks"]
        .as_array()
        .and_then(|checks| checks.iter().find(|check| check["name"] == name))
        .and_then(|check| check["status"].as_str())
        .unwrap_or("missing")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "CHOWBOT_DISCORD_BOT_TOKEN",
        "DISCORD_BOT_TOKEN",
        "CHOWBOT_LLM_BASE_URL",
        "LLM_BASE_URL",
        "CHOWBOT_LLM_API_KEY",
        "LLM_API_KEY",
        "OPENAI_API_KEY",
        "CHOWBOT_LLM_MODEL",
        "CHOWBOT_LLM_TIMEOUT_SECS",
        "CHOWBOT_GOOGLE_API_KEY",
        "GOOGLE_API_KEY",
        "CHOWBOT_USDA_API_KEY",
        "USDA_API_KEY",
        "CHOWBOT_GATEWAY_TIMEOUT_SECS",
        "CHOWBOT_GATEWAY_NUTRITION_TIMEOUT_SECS",
        "CHOWBOT_GATEWAY_SEARCH_RADIUS_M",
        "CHOWBOT_STORAGE_WISHLIST_PATH",
        "CHOWBOT_STORAGE_STYLE_PATH",
        "CHOWBOT_SERVER_BIND_ADDRESS",
        "CHOWBOT_SERVER_HEALTH_CHECK_PORT",
        "CHOWBOT_LOGGING_LEVEL",
        "CHOWBOT_LOGGING_FORMAT",
        "CHOWBOT_LOG_LEVEL",
        "CHOWBOT_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
