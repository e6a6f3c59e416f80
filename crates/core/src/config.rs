use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub discord: DiscordConfig,
    pub llm: LlmConfig,
    pub gateway: GatewayConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DiscordConfig {
    pub bot_token: SecretString,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub google_api_key: Option<SecretString>,
    pub usda_api_key: Option<SecretString>,
    pub timeout_secs: u64,
    pub nutrition_timeout_secs: u64,
    pub search_radius_m: u32,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub wishlist_path: PathBuf,
    pub style_path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub health_check_port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub discord_bot_token: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_model: Option<String>,
    pub google_api_key: Option<String>,
    pub usda_api_key: Option<String>,
    pub wishlist_path: Option<PathBuf>,
    pub style_path: Option<PathBuf>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            discord: DiscordConfig { bot_token: String::new().into() },
            llm: LlmConfig {
                base_url: "https://api-gateway.netdb.csie.ncku.edu.tw".to_string(),
                api_key: None,
                model: "gemma3:4b".to_string(),
                timeout_secs: 300,
            },
            gateway: GatewayConfig {
                google_api_key: None,
                usda_api_key: None,
                timeout_secs: 10,
                nutrition_timeout_secs: 20,
                search_radius_m: 2_000,
            },
            storage: StorageConfig {
                wishlist_path: PathBuf::from("wishlist.json"),
                style_path: PathBuf::from("style.json"),
            },
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), health_check_port: 8080 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl DiscordConfig {
    /// Only the chat-facing server needs the token; offline tooling skips this check.
    pub fn require_token(&self) -> Result<&str, ConfigError> {
        let token = self.bot_token.expose_secret().trim();
        if token.is_empty() {
            return Err(ConfigError::Validation(
                "discord.bot_token is required. Get it from https://discord.com/developers/applications > Your App > Bot".to_string(),
            ));
        }
        Ok(token)
    }
}

impl LlmConfig {
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(|key| key.expose_secret().trim()).filter(|key| !key.is_empty())
    }
}

impl GatewayConfig {
    pub fn google_api_key(&self) -> Option<&str> {
        self.google_api_key
            .as_ref()
            .map(|key| key.expose_secret().trim())
            .filter(|key| !key.is_empty())
    }

    pub fn usda_api_key(&self) -> Option<&str> {
        self.usda_api_key
            .as_ref()
            .map(|key| key.expose_secret().trim())
            .filter(|key| !key.is_empty())
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("chowbot.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(discord) = patch.discord {
            if let Some(bot_token) = discord.bot_token {
                self.discord.bot_token = secret_value(bot_token);
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(api_key) = llm.api_key {
                self.llm.api_key = Some(secret_value(api_key));
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(gateway) = patch.gateway {
            if let Some(google_api_key) = gateway.google_api_key {
                self.gateway.google_api_key = Some(secret_value(google_api_key));
            }
            if let Some(usda_api_key) = gateway.usda_api_key {
                self.gateway.usda_api_key = Some(secret_value(usda_api_key));
            }
            if let Some(timeout_secs) = gateway.timeout_secs {
                self.gateway.timeout_secs = timeout_secs;
            }
            if let Some(nutrition_timeout_secs) = gateway.nutrition_timeout_secs {
                self.gateway.nutrition_timeout_secs = nutrition_timeout_secs;
            }
            if let Some(search_radius_m) = gateway.search_radius_m {
                self.gateway.search_radius_m = search_radius_m;
            }
        }

        if let Some(storage) = patch.storage {
            if let Some(wishlist_path) = storage.wishlist_path {
                self.storage.wishlist_path = wishlist_path;
            }
            if let Some(style_path) = storage.style_path {
                self.storage.style_path = style_path;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env_with_alias("CHOWBOT_DISCORD_BOT_TOKEN", &["DISCORD_BOT_TOKEN"])
        {
            self.discord.bot_token = secret_value(value);
        }

        if let Some(value) = read_env_with_alias("CHOWBOT_LLM_BASE_URL", &["LLM_BASE_URL"]) {
            self.llm.base_url = value;
        }
        if let Some(value) =
            read_env_with_alias("CHOWBOT_LLM_API_KEY", &["LLM_API_KEY", "OPENAI_API_KEY"])
        {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("CHOWBOT_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("CHOWBOT_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("CHOWBOT_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env_with_alias("CHOWBOT_GOOGLE_API_KEY", &["GOOGLE_API_KEY"]) {
            self.gateway.google_api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env_with_alias("CHOWBOT_USDA_API_KEY", &["USDA_API_KEY"]) {
            self.gateway.usda_api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("CHOWBOT_GATEWAY_TIMEOUT_SECS") {
            self.gateway.timeout_secs = parse_u64("CHOWBOT_GATEWAY_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("CHOWBOT_GATEWAY_NUTRITION_TIMEOUT_SECS") {
            self.gateway.nutrition_timeout_secs =
                parse_u64("CHOWBOT_GATEWAY_NUTRITION_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("CHOWBOT_GATEWAY_SEARCH_RADIUS_M") {
            self.gateway.search_radius_m = parse_u32("CHOWBOT_GATEWAY_SEARCH_RADIUS_M", &value)?;
        }

        if let Some(value) = read_env("CHOWBOT_STORAGE_WISHLIST_PATH") {
            self.storage.wishlist_path = PathBuf::from(value);
        }
        if let Some(value) = read_env("CHOWBOT_STORAGE_STYLE_PATH") {
            self.storage.style_path = PathBuf::from(value);
        }

        if let Some(value) = read_env("CHOWBOT_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("CHOWBOT_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port = parse_u16("CHOWBOT_SERVER_HEALTH_CHECK_PORT", &value)?;
        }

        let log_level =
            read_env("CHOWBOT_LOGGING_LEVEL").or_else(|| read_env("CHOWBOT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("CHOWBOT_LOGGING_FORMAT").or_else(|| read_env("CHOWBOT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(bot_token) = overrides.discord_bot_token {
            self.discord.bot_token = secret_value(bot_token);
        }
        if let Some(base_url) = overrides.llm_base_url {
            self.llm.base_url = base_url;
        }
        if let Some(api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(secret_value(api_key));
        }
        if let Some(model) = overrides.llm_model {
            self.llm.model = model;
        }
        if let Some(google_api_key) = overrides.google_api_key {
            self.gateway.google_api_key = Some(secret_value(google_api_key));
        }
        if let Some(usda_api_key) = overrides.usda_api_key {
            self.gateway.usda_api_key = Some(secret_value(usda_api_key));
        }
        if let Some(wishlist_path) = overrides.wishlist_path {
            self.storage.wishlist_path = wishlist_path;
        }
        if let Some(style_path) = overrides.style_path {
            self.storage.style_path = style_path;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_llm(&self.llm)?;
        validate_gateway(&self.gateway)?;
        validate_storage(&self.storage)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("chowbot.toml"), PathBuf::from("config/chowbot.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    let base_url = llm.base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "llm.base_url must start with http:// or https://".to_string(),
        ));
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    Ok(())
}

fn validate_gateway(gateway: &GatewayConfig) -> Result<(), ConfigError> {
    if gateway.timeout_secs == 0 || gateway.timeout_secs > 60 {
        return Err(ConfigError::Validation(
            "gateway.timeout_secs must be in range 1..=60".to_string(),
        ));
    }

    if gateway.nutrition_timeout_secs == 0 || gateway.nutrition_timeout_secs > 60 {
        return Err(ConfigError::Validation(
            "gateway.nutrition_timeout_secs must be in range 1..=60".to_string(),
        ));
    }

    if gateway.search_radius_m == 0 || gateway.search_radius_m > 50_000 {
        return Err(ConfigError::Validation(
            "gateway.search_radius_m must be in range 1..=50000".to_string(),
        ));
    }

    Ok(())
}

fn validate_storage(storage: &StorageConfig) -> Result<(), ConfigError> {
    if storage.wishlist_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "storage.wishlist_path must not be empty".to_string(),
        ));
    }
    if storage.style_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("storage.style_path must not be empty".to_string()));
    }
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn read_env_with_alias(key: &str, aliases: &[&str]) -> Option<String> {
    read_env(key).or_else(|| aliases.iter().find_map(|alias| read_env(alias)))
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    discord: Option<DiscordPatch>,
    llm: Option<LlmPatch>,
    gateway: Option<GatewayPatch>,
    storage: Option<StoragePatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DiscordPatch {
    bot_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    base_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct GatewayPatch {
    google_api_key: Option<String>,
    usda_api_key: Option<String>,
    timeout_secs: Option<u64>,
    nutrition_timeout_secs: Option<u64>,
    search_radius_m: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct StoragePatch {
    wishlist_path: Option<PathBuf>,
    style_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    health_check_port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
