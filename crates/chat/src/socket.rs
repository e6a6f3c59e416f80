use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use chowbot_core::domain::intent::GuildId;
use thiserror::Error;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::blocks::MessageTemplate;
use crate::commands::CommandSpec;
use crate::events::{ChannelId, ChatEnvelope, EventContext, EventDispatcher, HandlerResult};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport failed to connect: {0}")]
    Connect(String),
    #[error("transport read failed: {0}")]
    Receive(String),
    #[error("transport send failed: {0}")]
    Send(String),
    #[error("transport edit failed: {0}")]
    Edit(String),
    #[error("command sync failed: {0}")]
    Sync(String),
    #[error("transport disconnect failed: {0}")]
    Disconnect(String),
}

/// A sent message that can be edited in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageHandle {
    pub channel: ChannelId,
    pub message_id: String,
}

/// Outbound side of the chat platform.
#[async_trait]
pub trait ChatSender: Send + Sync {
    async fn send(
        &self,
        channel: ChannelId,
        message: MessageTemplate,
    ) -> Result<MessageHandle, TransportError>;

    async fn edit(&self, handle: &MessageHandle, content: &str) -> Result<(), TransportError>;

    /// Clears per-guild registrations when `guild` is given, then registers
    /// `specs` globally. Returns how many commands were registered.
    async fn sync_commands(
        &self,
        guild: Option<GuildId>,
        specs: &[CommandSpec],
    ) -> Result<usize, TransportError>;
}

#[derive(Default)]
pub struct NoopChatSender;

#[async_trait]
impl ChatSender for NoopChatSender {
    async fn send(
        &self,
        channel: ChannelId,
        _message: MessageTemplate,
    ) -> Result<MessageHandle, TransportError> {
        Ok(MessageHandle { channel, message_id: Uuid::new_v4().to_string() })
    }

    async fn edit(&self, _handle: &MessageHandle, _content: &str) -> Result<(), TransportError> {
        Ok(())
    }

    async fn sync_commands(
        &self,
        _guild: Option<GuildId>,
        specs: &[CommandSpec],
    ) -> Result<usize, TransportError> {
        Ok(specs.len())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_retries: 5, base_delay_ms: 250, max_delay_ms: 5_000 }
    }
}

impl ReconnectPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// Inbound side of the chat platform.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn connect(&self) -> Result<(), TransportError>;
    async fn next_envelope(&self) -> Result<Option<ChatEnvelope>, TransportError>;
    async fn disconnect(&self) -> Result<(), TransportError>;
}

#[derive(Default)]
pub struct NoopChatTransport;

#[async_trait]
impl ChatTransport for NoopChatTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn next_envelope(&self) -> Result<Option<ChatEnvelope>, TransportError> {
        Ok(None)
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

pub struct ChatRunner {
    transport: Arc<dyn ChatTransport>,
    sender: Arc<dyn ChatSender>,
    dispatcher: Arc<EventDispatcher>,
    reconnect_policy: ReconnectPolicy,
}

impl ChatRunner {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        sender: Arc<dyn ChatSender>,
        dispatcher: EventDispatcher,
        reconnect_policy: ReconnectPolicy,
    ) -> Self {
        Self { transport, sender, dispatcher: Arc::new(dispatcher), reconnect_policy }
    }

    pub async fn start(&self) -> Result<()> {
        for attempt in 0..=self.reconnect_policy.max_retries {
            match self.connect_and_pump(attempt).await {
                Ok(()) => return Ok(()),
                Err(transport_error) => {
                    warn!(
                        attempt,
                        max_retries = self.reconnect_policy.max_retries,
                        error = %transport_error,
                        "chat transport failed"
                    );

                    if attempt >= self.reconnect_policy.max_retries {
                        warn!(
                            max_retries = self.reconnect_policy.max_retries,
                            "chat transport retries exhausted; continuing process without crash"
                        );
                        return Ok(());
                    }

                    let delay = self.reconnect_policy.backoff(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Ok(())
    }

    /// Each envelope runs in its own task, so a slow interaction never holds
    /// back the next one. A clean close waits for in-flight tasks; a transport
    /// error leaves them running while the runner reconnects.
    async fn connect_and_pump(&self, attempt: u32) -> Result<(), TransportError> {
        info!(attempt, "opening chat transport connection");
        self.transport.connect().await?;
        info!(attempt, "chat transport connected");

        let mut in_flight = JoinSet::new();
        loop {
            let envelope = match self.transport.next_envelope().await {
                Ok(Some(envelope)) => envelope,
                Ok(None) => break,
                Err(error) => {
                    in_flight.detach_all();
                    return Err(error);
                }
            };
            let guild = envelope.event.guild();

            info!(
                event_name = "ingress.chat.event_received",
                envelope_id = %envelope.envelope_id,
                event_type = ?envelope.event.event_type(),
                correlation_id = %envelope.envelope_id,
                guild_id = guild.map(|guild| guild.0),
                "received chat event"
            );

            let dispatcher = self.dispatcher.clone();
            let sender = self.sender.clone();
            in_flight.spawn(async move {
                let context = EventContext { correlation_id: envelope.envelope_id.clone() };
                if let HandlerResult::Responded(messages) = dispatcher.dispatch(&envelope, &context).await {
                    deliver(sender.as_ref(), &envelope, messages).await;
                }
            });

            while let Some(finished) = in_flight.try_join_next() {
                log_task_failure(finished);
            }
        }

        info!(attempt, in_flight = in_flight.len(), "chat transport stream closed");
        while let Some(finished) = in_flight.join_next().await {
            log_task_failure(finished);
        }
        self.transport.disconnect().await
    }
}

fn log_task_failure(finished: Result<(), JoinError>) {
    if let Err(error) = finished {
        warn!(error = %error, "chat event task aborted; continuing chat loop");
    }
}

/// Replies for one envelope go out in order; the first failed send stops the rest.
async fn deliver(sender: &dyn ChatSender, envelope: &ChatEnvelope, messages: Vec<MessageTemplate>) {
    let Some(channel) = envelope.event.channel() else {
        return;
    };
    for message in messages {
        match sender.send(channel, message).await {
            Ok(handle) => debug!(
                event_name = "egress.chat.message_sent",
                correlation_id = %envelope.envelope_id,
                message_id = %handle.message_id,
                "sent chat reply"
            ),
            Err(error) => {
                warn!(
                    event_name = "egress.chat.message_sent",
                    correlation_id = %envelope.envelope_id,
                    error = %error,
                    "failed to send chat reply"
                );
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use chowbot_core::domain::intent::GuildId;
    use tokio::sync::{Mutex, Notify};

    use super::{
        ChatRunner, ChatSender, ChatTransport, MessageHandle, ReconnectPolicy, TransportError,
    };
    use crate::blocks::MessageTemplate;
    use crate::commands::CommandSpec;
    use crate::events::{
        ChannelId, ChatEnvelope, ChatEvent, ChatEventType, EventContext, EventDispatcher,
        EventHandler, EventHandlerError, HandlerResult,
    };

    #[derive(Default)]
    struct ScriptedTransport {
        state: Mutex<ScriptedState>,
    }

    #[derive(Default)]
    struct ScriptedState {
        connect_results: VecDeque<Result<(), TransportError>>,
        envelopes: VecDeque<Result<Option<ChatEnvelope>, TransportError>>,
        connect_attempts: usize,
        disconnect_calls: usize,
    }

    impl ScriptedTransport {
        fn with_script(
            connect_results: Vec<Result<(), TransportError>>,
            envelopes: Vec<Result<Option<ChatEnvelope>, TransportError>>,
        ) -> Self {
            Self {
                state: Mutex::new(ScriptedState {
                    connect_results: connect_results.into(),
                    envelopes: envelopes.into(),
                    ..ScriptedState::default()
                }),
            }
        }

        async fn connect_attempts(&self) -> usize {
            self.state.lock().await.connect_attempts
        }

        async fn disconnect_calls(&self) -> usize {
            self.state.lock().await.disconnect_calls
        }
    }

    #[async_trait]
    impl ChatTransport for ScriptedTransport {
        async fn connect(&self) -> Result<(), TransportError> {
            let mut state = self.state.lock().await;
            state.connect_attempts += 1;
            state.connect_results.pop_front().unwrap_or(Ok(()))
        }

        async fn next_envelope(&self) -> Result<Option<ChatEnvelope>, TransportError> {
            let mut state = self.state.lock().await;
            state.envelopes.pop_front().unwrap_or(Ok(None))
        }

        async fn disconnect(&self) -> Result<(), TransportError> {
            self.state.lock().await.disconnect_calls += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<(ChannelId, MessageTemplate)>>,
    }

    #[async_trait]
    impl ChatSender for RecordingSender {
        async fn send(
            &self,
            channel: ChannelId,
            message: MessageTemplate,
        ) -> Result<MessageHandle, TransportError> {
            let mut sent = self.sent.lock().await;
            sent.push((channel, message));
            Ok(MessageHandle { channel, message_id: format!("m-{}", sent.len()) })
        }

        async fn edit(&self, _handle: &MessageHandle, _content: &str) -> Result<(), TransportError> {
            Ok(())
        }

        async fn sync_commands(
            &self,
            _guild: Option<GuildId>,
            specs: &[CommandSpec],
        ) -> Result<usize, TransportError> {
            Ok(specs.len())
        }
    }

    struct EchoHandler;

    #[async_trait]
    impl EventHandler for EchoHandler {
        fn event_type(&self) -> ChatEventType {
            ChatEventType::MessageCreated
        }

        async fn handle(
            &self,
            envelope: &ChatEnvelope,
            _ctx: &EventContext,
        ) -> Result<HandlerResult, EventHandlerError> {
            let ChatEvent::MessageCreated(message) = &envelope.event else {
                return Ok(HandlerResult::Ignored);
            };
            Ok(HandlerResult::Responded(vec![
                MessageTemplate::text(format!("echo {}", message.text)),
                MessageTemplate::text("done"),
            ]))
        }
    }

    fn message_envelope(id: &str, text: &str) -> ChatEnvelope {
        ChatEnvelope {
            envelope_id: id.to_owned(),
            event: ChatEvent::MessageCreated(crate::events::InboundMessage {
                channel: ChannelId(9),
                guild: Some(GuildId(1)),
                author_is_bot: false,
                text: text.to_owned(),
            }),
        }
    }

    #[tokio::test]
    async fn reconnects_after_initial_connect_failure() -> anyhow::Result<()> {
        let transport = Arc::new(ScriptedTransport::with_script(
            vec![Err(TransportError::Connect("network down".to_owned())), Ok(())],
            vec![
                Ok(Some(ChatEnvelope {
                    envelope_id: "env-1".to_owned(),
                    event: ChatEvent::Unsupported { event_type: "typing".to_owned() },
                })),
                Ok(None),
            ],
        ));

        let runner = ChatRunner::new(
            transport.clone(),
            Arc::new(RecordingSender::default()),
            EventDispatcher::default(),
            ReconnectPolicy { max_retries: 2, base_delay_ms: 0, max_delay_ms: 0 },
        );

        runner.start().await?;

        assert_eq!(transport.connect_attempts().await, 2);
        assert_eq!(transport.disconnect_calls().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn exhausts_retries_without_crashing() -> anyhow::Result<()> {
        let transport = Arc::new(ScriptedTransport::with_script(
            vec![
                Err(TransportError::Connect("fail-1".to_owned())),
                Err(TransportError::Connect("fail-2".to_owned())),
                Err(TransportError::Connect("fail-3".to_owned())),
            ],
            vec![],
        ));

        let runner = ChatRunner::new(
            transport.clone(),
            Arc::new(RecordingSender::default()),
            EventDispatcher::default(),
            ReconnectPolicy { max_retries: 2, base_delay_ms: 0, max_delay_ms: 0 },
        );

        runner.start().await?;
        assert_eq!(transport.connect_attempts().await, 3);
        Ok(())
    }

    #[tokio::test]
    async fn responded_messages_are_sent_in_order_to_the_event_channel() -> anyhow::Result<()> {
        let transport = Arc::new(ScriptedTransport::with_script(
            vec![],
            vec![Ok(Some(message_envelope("env-2", "拉麵"))), Ok(None)],
        ));
        let sender = Arc::new(RecordingSender::default());
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(EchoHandler);

        let runner = ChatRunner::new(
            transport,
            sender.clone(),
            dispatcher,
            ReconnectPolicy { max_retries: 0, base_delay_ms: 0, max_delay_ms: 0 },
        );
        runner.start().await?;

        let sent = sender.sent.lock().await;
        let contents: Vec<&str> = sent.iter().map(|(_, message)| message.content.as_str()).collect();
        assert_eq!(contents, vec!["echo 拉麵", "done"]);
        assert!(sent.iter().all(|(channel, _)| *channel == ChannelId(9)));
        Ok(())
    }

    /// "slow" only finishes once "fast" has run.
    struct HandOffHandler {
        released: Arc<Notify>,
    }

    #[async_trait]
    impl EventHandler for HandOffHandler {
        fn event_type(&self) -> ChatEventType {
            ChatEventType::MessageCreated
        }

        async fn handle(
            &self,
            envelope: &ChatEnvelope,
            _ctx: &EventContext,
        ) -> Result<HandlerResult, EventHandlerError> {
            if envelope.envelope_id == "slow" {
                self.released.notified().await;
            } else {
                self.released.notify_one();
            }
            Ok(HandlerResult::Responded(vec![MessageTemplate::text(envelope.envelope_id.clone())]))
        }
    }

    #[tokio::test]
    async fn a_slow_interaction_does_not_hold_back_other_guilds() -> anyhow::Result<()> {
        let mut fast = message_envelope("fast", "嗨");
        if let ChatEvent::MessageCreated(message) = &mut fast.event {
            message.guild = Some(GuildId(2));
            message.channel = ChannelId(10);
        }
        let transport = Arc::new(ScriptedTransport::with_script(
            vec![],
            vec![Ok(Some(message_envelope("slow", "轉盤"))), Ok(Some(fast)), Ok(None)],
        ));
        let sender = Arc::new(RecordingSender::default());
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(HandOffHandler { released: Arc::new(Notify::new()) });

        let runner = ChatRunner::new(
            transport.clone(),
            sender.clone(),
            dispatcher,
            ReconnectPolicy { max_retries: 0, base_delay_ms: 0, max_delay_ms: 0 },
        );
        tokio::time::timeout(Duration::from_secs(3), runner.start()).await??;

        let sent = sender.sent.lock().await;
        let mut delivered: Vec<(ChannelId, &str)> =
            sent.iter().map(|(channel, message)| (*channel, message.content.as_str())).collect();
        delivered.sort_by_key(|(channel, _)| channel.0);
        assert_eq!(delivered, vec![(ChannelId(9), "slow"), (ChannelId(10), "fast")]);
        assert_eq!(transport.disconnect_calls().await, 1);
        Ok(())
    }

    #[test]
    fn backoff_is_exponential_and_capped() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.backoff(0).as_millis(), 250);
        assert_eq!(policy.backoff(2).as_millis(), 1_000);
        assert_eq!(policy.backoff(10).as_millis(), 5_000);
    }
}
