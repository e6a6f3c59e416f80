//! Chat transport layer: inbound events, slash commands, reply templates with
//! wishlist buttons, per-guild chat toggles and the reconnecting runner.

pub mod blocks;
pub mod commands;
pub mod events;
pub mod reveal;
pub mod service;
pub mod socket;
pub mod state;

pub use blocks::{ButtonAction, MessageTemplate};
pub use commands::{command_specs, parse_command, BotCommand, SlashCommandPayload};
pub use events::{default_dispatcher, ChannelId, ChatEnvelope, ChatEvent, EventDispatcher};
pub use service::BotService;
pub use socket::{
    ChatRunner, ChatSender, ChatTransport, NoopChatSender, NoopChatTransport, ReconnectPolicy,
};
pub use state::GuildRuntimeState;
