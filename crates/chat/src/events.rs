use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chowbot_agent::AgentReply;
use chowbot_core::domain::intent::GuildId;
use chowbot_core::spin::EMPTY_POOL_MESSAGE;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    blocks::{food_messages, text_messages, ButtonAction, MessageTemplate},
    commands::{parse_command, CommandParseError, CommandRouteError, CommandRouter, SlashCommandPayload},
    reveal::{spin_then_search, RevealError},
    service::BotService,
    socket::ChatSender,
    state::GuildRuntimeState,
};

pub const BUTTON_GUILD_ONLY_MESSAGE: &str = "請在伺服器頻道使用此功能。";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelId(pub u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatEnvelope {
    pub envelope_id: String,
    pub event: ChatEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatEvent {
    MessageCreated(InboundMessage),
    SlashCommand(SlashCommandPayload),
    ButtonPressed(ButtonPressEvent),
    Unsupported { event_type: String },
}

impl ChatEvent {
    pub fn event_type(&self) -> ChatEventType {
        match self {
            Self::MessageCreated(_) => ChatEventType::MessageCreated,
            Self::SlashCommand(_) => ChatEventType::SlashCommand,
            Self::ButtonPressed(_) => ChatEventType::ButtonPressed,
            Self::Unsupported { .. } => ChatEventType::Unsupported,
        }
    }

    /// Where replies to this event go.
    pub fn channel(&self) -> Option<ChannelId> {
        match self {
            Self::MessageCreated(message) => Some(message.channel),
            Self::SlashCommand(payload) => Some(payload.channel),
            Self::ButtonPressed(event) => Some(event.channel),
            Self::Unsupported { .. } => None,
        }
    }

    pub fn guild(&self) -> Option<GuildId> {
        match self {
            Self::MessageCreated(message) => message.guild,
            Self::SlashCommand(payload) => payload.guild,
            Self::ButtonPressed(event) => event.guild,
            Self::Unsupported { .. } => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChatEventType {
    MessageCreated,
    SlashCommand,
    ButtonPressed,
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    pub channel: ChannelId,
    pub guild: Option<GuildId>,
    pub author_is_bot: bool,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ButtonPressEvent {
    pub channel: ChannelId,
    pub guild: Option<GuildId>,
    pub action: ButtonAction,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    /// Messages for the runner to send, in order, to the event's channel.
    Responded(Vec<MessageTemplate>),
    Processed,
    Ignored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventHandlerError {
    #[error(transparent)]
    Parse(#[from] CommandParseError),
    #[error(transparent)]
    Route(#[from] CommandRouteError),
    #[error(transparent)]
    Reveal(#[from] RevealError),
}

impl EventHandlerError {
    /// The reply a user sees when a handler gives up.
    pub fn reply(&self, correlation_id: &str) -> Vec<MessageTemplate> {
        match self {
            Self::Parse(error) => vec![MessageTemplate::ephemeral(error.user_message())],
            Self::Route(error) => vec![MessageTemplate::ephemeral(error.user_message(correlation_id))],
            Self::Reveal(error) => text_messages(&chat_failure_message(error)),
        }
    }
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> ChatEventType;
    async fn handle(
        &self,
        envelope: &ChatEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<ChatEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    /// Handler errors end here: they are logged and turned into a reply.
    pub async fn dispatch(&self, envelope: &ChatEnvelope, ctx: &EventContext) -> HandlerResult {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            return HandlerResult::Ignored;
        };

        match handler.handle(envelope, ctx).await {
            Ok(result) => result,
            Err(error) => {
                warn!(
                    event_name = "chat.handler.failed",
                    correlation_id = %ctx.correlation_id,
                    event_type = ?envelope.event.event_type(),
                    error = %error,
                    "event handler failed"
                );
                HandlerResult::Responded(error.reply(&ctx.correlation_id))
            }
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

/// Message, slash-command and button handlers sharing one service, toggle
/// registry and sender.
pub fn default_dispatcher(
    service: Arc<dyn BotService>,
    state: Arc<GuildRuntimeState>,
    sender: Arc<dyn ChatSender>,
) -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(MessageHandler::new(service.clone(), state.clone(), sender.clone()));
    dispatcher.register(SlashCommandHandler::new(service.clone(), state, sender));
    dispatcher.register(ButtonHandler::new(service));
    dispatcher
}

pub fn chat_failure_message(error: impl std::fmt::Display) -> String {
    format!("抱歉，聊天時出錯：{error}")
}

/// Free-text messages: gated, routed through the agent, never fails.
pub struct MessageHandler {
    service: Arc<dyn BotService>,
    state: Arc<GuildRuntimeState>,
    sender: Arc<dyn ChatSender>,
}

impl MessageHandler {
    pub fn new(
        service: Arc<dyn BotService>,
        state: Arc<GuildRuntimeState>,
        sender: Arc<dyn ChatSender>,
    ) -> Self {
        Self { service, state, sender }
    }

    /// Bots, slash-prefixed text and toggled-off guilds get no reply.
    pub async fn accepts(&self, message: &InboundMessage) -> bool {
        if message.author_is_bot || message.text.starts_with('/') {
            return false;
        }
        match message.guild {
            Some(guild) => self.state.is_enabled(guild).await,
            None => true,
        }
    }

    async fn respond(&self, message: &InboundMessage) -> Result<Vec<MessageTemplate>, RevealError> {
        match self.service.handle_message(&message.text, message.guild).await {
            AgentReply::Text(text) => Ok(text_messages(&text)),
            AgentReply::Food(answer) => Ok(food_messages(&answer)),
            AgentReply::Spin { candidates, .. } if candidates.is_empty() => {
                Ok(vec![MessageTemplate::text(EMPTY_POOL_MESSAGE)])
            }
            AgentReply::Spin { candidates, .. } => {
                let mut rng = StdRng::from_entropy();
                spin_then_search(
                    self.service.as_ref(),
                    self.sender.as_ref(),
                    message.channel,
                    message.guild,
                    &candidates,
                    true,
                    &mut rng,
                )
                .await
            }
        }
    }
}

#[async_trait]
impl EventHandler for MessageHandler {
    fn event_type(&self) -> ChatEventType {
        ChatEventType::MessageCreated
    }

    async fn handle(
        &self,
        envelope: &ChatEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let ChatEvent::MessageCreated(message) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };
        if !self.accepts(message).await {
            debug!(correlation_id = %ctx.correlation_id, "message gated");
            return Ok(HandlerResult::Ignored);
        }

        let messages = self.respond(message).await?;
        Ok(if messages.is_empty() { HandlerResult::Processed } else { HandlerResult::Responded(messages) })
    }
}

pub struct SlashCommandHandler {
    router: CommandRouter,
}

impl SlashCommandHandler {
    pub fn new(
        service: Arc<dyn BotService>,
        state: Arc<GuildRuntimeState>,
        sender: Arc<dyn ChatSender>,
    ) -> Self {
        Self { router: CommandRouter::new(service, state, sender) }
    }
}

#[async_trait]
impl EventHandler for SlashCommandHandler {
    fn event_type(&self) -> ChatEventType {
        ChatEventType::SlashCommand
    }

    async fn handle(
        &self,
        envelope: &ChatEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let ChatEvent::SlashCommand(payload) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let command = parse_command(payload)?;
        debug!(correlation_id = %ctx.correlation_id, command = %payload.name, "slash command parsed");

        let messages = self.router.route(command, payload).await?;
        Ok(if messages.is_empty() { HandlerResult::Processed } else { HandlerResult::Responded(messages) })
    }
}

/// Wishlist buttons. The item was bound when the button was built.
pub struct ButtonHandler {
    service: Arc<dyn BotService>,
}

impl ButtonHandler {
    pub fn new(service: Arc<dyn BotService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl EventHandler for ButtonHandler {
    fn event_type(&self) -> ChatEventType {
        ChatEventType::ButtonPressed
    }

    async fn handle(
        &self,
        envelope: &ChatEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let ChatEvent::ButtonPressed(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };
        let Some(guild) = event.guild else {
            return Ok(HandlerResult::Responded(vec![MessageTemplate::ephemeral(BUTTON_GUILD_ONLY_MESSAGE)]));
        };

        let ButtonAction::AddToWishlist { item, .. } = &event.action;
        let added = self.service.add_to_wishlist(guild, item).await.map_err(CommandRouteError::from)?;
        debug!(correlation_id = %ctx.correlation_id, added, "wishlist button handled");
        let reply = if added { format!("已加入待吃清單：{item}") } else { format!("已在待吃清單：{item}") };
        Ok(HandlerResult::Responded(vec![MessageTemplate::text(reply)]))
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chowbot_core::domain::intent::GuildId;

    use super::{
        ChannelId, ChatEnvelope, ChatEvent, ChatEventType, EventContext, EventDispatcher,
        EventHandler, EventHandlerError, HandlerResult, InboundMessage,
    };
    use crate::blocks::MessageTemplate;
    use crate::commands::{CommandParseError, CommandRouteError};
    use crate::reveal::RevealError;
    use crate::socket::TransportError;

    struct FailingHandler(fn() -> EventHandlerError);

    #[async_trait]
    impl EventHandler for FailingHandler {
        fn event_type(&self) -> ChatEventType {
            ChatEventType::MessageCreated
        }

        async fn handle(
            &self,
            _envelope: &ChatEnvelope,
            _ctx: &EventContext,
        ) -> Result<HandlerResult, EventHandlerError> {
            Err((self.0)())
        }
    }

    fn envelope() -> ChatEnvelope {
        ChatEnvelope {
            envelope_id: "env-1".to_owned(),
            event: ChatEvent::MessageCreated(InboundMessage {
                channel: ChannelId(3),
                guild: Some(GuildId(1)),
                author_is_bot: false,
                text: "嗨".to_owned(),
            }),
        }
    }

    async fn dispatch_failure(error: fn() -> EventHandlerError) -> HandlerResult {
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(FailingHandler(error));
        dispatcher.dispatch(&envelope(), &EventContext { correlation_id: "req-9".to_owned() }).await
    }

    #[tokio::test]
    async fn parse_failures_become_ephemeral_hints() {
        let result = dispatch_failure(|| CommandParseError::InvalidToggle.into()).await;
        assert_eq!(result, HandlerResult::Responded(vec![MessageTemplate::ephemeral("請輸入 on 或 off")]));
    }

    #[tokio::test]
    async fn persistence_failures_become_ephemeral_apologies() {
        let result =
            dispatch_failure(|| CommandRouteError::Persistence("disk full".to_owned()).into()).await;
        assert_eq!(
            result,
            HandlerResult::Responded(vec![MessageTemplate::ephemeral("抱歉，資料暫時無法儲存，請稍後再試。")])
        );
    }

    #[tokio::test]
    async fn reveal_failures_become_chat_apologies() {
        let result = dispatch_failure(|| {
            RevealError::from(TransportError::Send("gateway closed".to_owned())).into()
        })
        .await;
        assert_eq!(
            result,
            HandlerResult::Responded(vec![MessageTemplate::text(
                "抱歉，聊天時出錯：transport send failed: gateway closed"
            )])
        );
    }

    #[tokio::test]
    async fn unregistered_event_types_are_ignored() {
        let dispatcher = EventDispatcher::new();
        assert_eq!(dispatcher.dispatch(&envelope(), &EventContext::default()).await, HandlerResult::Ignored);
    }
}
