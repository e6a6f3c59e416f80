use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use chowbot_core::domain::intent::GuildId;
use chowbot_core::errors::ApplicationError;
use chowbot_core::spin::{parse_spin_items, InvalidSpinSource, SpinSource};
use chowbot_db::RepositoryError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::info;

use crate::blocks::{food_messages, text_messages, MessageTemplate};
use crate::events::ChannelId;
use crate::reveal::{spin_then_search, RevealError};
use crate::service::BotService;
use crate::socket::ChatSender;
use crate::state::GuildRuntimeState;

pub const GUILD_ONLY_MESSAGE: &str = "請在伺服器頻道使用此指令。";
pub const EMPTY_SPIN_ITEMS_MESSAGE: &str = "沒有可抽的項目，請提供清單，例如：/spin 水餃,牛肉湯,拉麵";
pub const MANAGE_GUILD_REQUIRED: &str = "需要「管理伺服器」權限才能執行同步。";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlashCommandPayload {
    pub name: String,
    pub options: HashMap<String, OptionValue>,
    pub channel: ChannelId,
    pub guild: Option<GuildId>,
    /// Set by the transport from the invoking member's permissions.
    pub user_can_manage_guild: bool,
    pub interaction_id: String,
}

impl SlashCommandPayload {
    fn text(&self, key: &str) -> Option<&str> {
        match self.options.get(key) {
            Some(OptionValue::Text(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    fn required_text(&self, key: &'static str) -> Result<&str, CommandParseError> {
        self.text(key).ok_or(CommandParseError::MissingOption(key))
    }

    fn integer(&self, key: &'static str) -> Result<i64, CommandParseError> {
        match self.options.get(key) {
            Some(OptionValue::Integer(value)) => Ok(*value),
            Some(OptionValue::Text(value)) => {
                value.trim().parse().map_err(|_| CommandParseError::InvalidInteger(key))
            }
            _ => Err(CommandParseError::MissingOption(key)),
        }
    }

    fn boolean(&self, key: &str, default: bool) -> bool {
        match self.options.get(key) {
            Some(OptionValue::Boolean(value)) => *value,
            _ => default,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BotCommand {
    Eat { request: String },
    BotToggle { enabled: bool },
    Spin { items: Vec<String>, source: SpinSource, search: bool },
    Nutrition { food: String },
    RecipeNutrition { ingredients: String },
    WishlistShow,
    WishlistRemove { index: i64 },
    SyncCommands,
    Style { style: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("unsupported slash command: {0}")]
    UnsupportedCommand(String),
    #[error("missing option `{0}`")]
    MissingOption(&'static str),
    #[error("option `{0}` must be an integer")]
    InvalidInteger(&'static str),
    #[error("toggle state must be on or off")]
    InvalidToggle,
    #[error(transparent)]
    InvalidSpinSource(#[from] InvalidSpinSource),
}

impl CommandParseError {
    pub fn user_message(&self) -> String {
        match self {
            Self::UnsupportedCommand(name) => format!("不支援的指令：/{name}"),
            Self::MissingOption(key) => format!("缺少參數：{key}"),
            Self::InvalidInteger(key) => format!("參數 {key} 需要是整數"),
            Self::InvalidToggle => "請輸入 on 或 off".to_string(),
            Self::InvalidSpinSource(error) => error.to_string(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandRouteError {
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error(transparent)]
    Reveal(#[from] RevealError),
}

impl From<RepositoryError> for CommandRouteError {
    fn from(error: RepositoryError) -> Self {
        Self::Persistence(error.to_string())
    }
}

impl CommandRouteError {
    pub fn user_message(&self, correlation_id: &str) -> &'static str {
        let application = match self {
            Self::Persistence(message) => ApplicationError::Persistence(message.clone()),
            Self::Reveal(error) => ApplicationError::Transport(error.to_string()),
        };
        application.into_interface(correlation_id).user_message()
    }
}

pub fn parse_command(payload: &SlashCommandPayload) -> Result<BotCommand, CommandParseError> {
    match payload.name.trim_start_matches('/') {
        "eat" => Ok(BotCommand::Eat { request: payload.required_text("需求")?.to_string() }),
        "bot_toggle" => {
            let enabled = match payload.required_text("狀態")?.trim().to_lowercase().as_str() {
                "on" => true,
                "off" => false,
                _ => return Err(CommandParseError::InvalidToggle),
            };
            Ok(BotCommand::BotToggle { enabled })
        }
        "spin" => Ok(BotCommand::Spin {
            items: parse_spin_items(payload.text("items").unwrap_or_default()),
            source: SpinSource::from_str(payload.text("source").unwrap_or("auto"))?,
            search: payload.boolean("search", true),
        }),
        "nutrition" => Ok(BotCommand::Nutrition { food: payload.required_text("食物")?.to_string() }),
        "recipe_nutrition" => Ok(BotCommand::RecipeNutrition {
            ingredients: payload.text("食材列表").unwrap_or_default().to_string(),
        }),
        "wishlist_show" => Ok(BotCommand::WishlistShow),
        "wishlist_remove" => Ok(BotCommand::WishlistRemove { index: payload.integer("index")? }),
        "sync_commands" => Ok(BotCommand::SyncCommands),
        "style" => Ok(BotCommand::Style { style: payload.text("風格").unwrap_or_default().to_string() }),
        other => Err(CommandParseError::UnsupportedCommand(other.to_string())),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionKind {
    Text,
    Integer,
    Boolean,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: OptionKind,
    pub required: bool,
}

/// Registration shape handed to the platform by `sync_commands`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub options: Vec<OptionSpec>,
}

fn option(name: &'static str, description: &'static str, kind: OptionKind, required: bool) -> OptionSpec {
    OptionSpec { name, description, kind, required }
}

pub fn command_specs() -> Vec<CommandSpec> {
    vec![
        CommandSpec {
            name: "eat",
            description: "推薦我在成大/台南附近吃什麼",
            options: vec![option("需求", "例如：拉麵 200內 不要排隊 下雨想吃熱的", OptionKind::Text, true)],
        },
        CommandSpec {
            name: "bot_toggle",
            description: "開關此伺服器的一般聊天回覆",
            options: vec![option("狀態", "on 開啟；off 關閉一般訊息回覆", OptionKind::Text, true)],
        },
        CommandSpec {
            name: "spin",
            description: "美食轉盤：從清單抽一道要吃的",
            options: vec![
                option("items", "用逗號分隔的候選項目，空白則用清單來源", OptionKind::Text, false),
                option("source", "清單來源：auto / wishlist / default", OptionKind::Text, false),
                option("search", "是否直接搜尋餐廳", OptionKind::Boolean, false),
            ],
        },
        CommandSpec {
            name: "nutrition",
            description: "查詢食物的營養分析",
            options: vec![option("食物", "例如：1 bowl beef noodles / 1 apple", OptionKind::Text, true)],
        },
        CommandSpec {
            name: "recipe_nutrition",
            description: "查詢食譜營養",
            options: vec![option(
                "食材列表",
                "用逗號分隔食材，例如：1 cup rice, 200g chicken, 1 tbsp oil",
                OptionKind::Text,
                true,
            )],
        },
        CommandSpec { name: "wishlist_show", description: "查看待吃清單", options: Vec::new() },
        CommandSpec {
            name: "wishlist_remove",
            description: "從待吃清單刪除項目",
            options: vec![option("index", "要刪除的編號（從 1 開始）", OptionKind::Integer, true)],
        },
        CommandSpec {
            name: "sync_commands",
            description: "重新同步斜線指令（需管理伺服器權限）",
            options: Vec::new(),
        },
        CommandSpec {
            name: "style",
            description: "設定伺服器共用的回覆風格",
            options: vec![option("風格", "例如：簡短、幽默、正式、條列、可愛", OptionKind::Text, false)],
        },
    ]
}

pub fn wishlist_listing(items: &[String]) -> String {
    if items.is_empty() {
        return "待吃清單是空的。".to_string();
    }
    let lines: Vec<String> =
        items.iter().enumerate().map(|(index, item)| format!("{}. {item}", index + 1)).collect();
    format!("本伺服器待吃清單：\n{}", lines.join("\n"))
}

pub struct CommandRouter {
    service: Arc<dyn BotService>,
    state: Arc<GuildRuntimeState>,
    sender: Arc<dyn ChatSender>,
}

impl CommandRouter {
    pub fn new(
        service: Arc<dyn BotService>,
        state: Arc<GuildRuntimeState>,
        sender: Arc<dyn ChatSender>,
    ) -> Self {
        Self { service, state, sender }
    }

    pub async fn route(
        &self,
        command: BotCommand,
        payload: &SlashCommandPayload,
    ) -> Result<Vec<MessageTemplate>, CommandRouteError> {
        let guild = payload.guild;
        match command {
            BotCommand::Eat { request } => {
                Ok(food_messages(&self.service.recommend_food(&request, guild).await))
            }
            BotCommand::BotToggle { enabled } => {
                let Some(guild) = guild else {
                    return Ok(vec![MessageTemplate::ephemeral(GUILD_ONLY_MESSAGE)]);
                };
                self.state.set_enabled(guild, enabled).await;
                info!(event_name = "chat.guild.toggled", guild_id = guild.0, enabled, "chat replies toggled");
                let verb = if enabled { "開啟" } else { "關閉" };
                Ok(vec![MessageTemplate::ephemeral(format!("已{verb}此伺服器的一般聊天回覆功能。"))])
            }
            BotCommand::Spin { items, source, search } => {
                let candidates = self.service.spin_candidates(guild, items, source).await;
                if candidates.is_empty() {
                    return Ok(vec![MessageTemplate::ephemeral(EMPTY_SPIN_ITEMS_MESSAGE)]);
                }
                let mut rng = StdRng::from_entropy();
                Ok(spin_then_search(
                    self.service.as_ref(),
                    self.sender.as_ref(),
                    payload.channel,
                    guild,
                    &candidates,
                    search,
                    &mut rng,
                )
                .await?)
            }
            BotCommand::Nutrition { food } => {
                Ok(text_messages(&self.service.nutrition(&food, guild).await))
            }
            BotCommand::RecipeNutrition { ingredients } => {
                Ok(text_messages(&self.service.recipe_nutrition(&ingredients, guild).await))
            }
            BotCommand::WishlistShow => {
                let Some(guild) = guild else {
                    return Ok(vec![MessageTemplate::ephemeral(GUILD_ONLY_MESSAGE)]);
                };
                Ok(text_messages(&wishlist_listing(&self.service.wishlist(guild).await)))
            }
            BotCommand::WishlistRemove { index } => {
                let Some(guild) = guild else {
                    return Ok(vec![MessageTemplate::ephemeral(GUILD_ONLY_MESSAGE)]);
                };
                let removed = match usize::try_from(index) {
                    Ok(index) => self.service.remove_from_wishlist(guild, index).await?,
                    Err(_) => None,
                };
                Ok(vec![MessageTemplate::text(match removed {
                    Some(item) => format!("已刪除：{item}"),
                    None => "刪除失敗：請確認編號是否正確。".to_string(),
                })])
            }
            BotCommand::SyncCommands => {
                if !payload.user_can_manage_guild {
                    return Ok(vec![MessageTemplate::ephemeral(MANAGE_GUILD_REQUIRED)]);
                }
                let reply = match self.sender.sync_commands(guild, &command_specs()).await {
                    Ok(count) => format!("已同步全域指令共 {count} 個。"),
                    Err(error) => format!("同步失敗：{error}"),
                };
                Ok(vec![MessageTemplate::ephemeral(reply)])
            }
            BotCommand::Style { style } => {
                let Some(guild) = guild else {
                    return Ok(vec![MessageTemplate::ephemeral(GUILD_ONLY_MESSAGE)]);
                };
                let style = style.trim();
                if style.is_empty() {
                    let reply = match self.service.style(guild).await {
                        Some(current) => format!("目前風格：{current}"),
                        None => "目前沒有設定風格。".to_string(),
                    };
                    return Ok(vec![MessageTemplate::ephemeral(reply)]);
                }
                self.service.set_style(guild, style).await?;
                Ok(vec![MessageTemplate::text(format!("已設定此伺服器風格：{style}"))])
            }
        }
    }
}
