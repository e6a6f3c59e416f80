use async_trait::async_trait;
use chowbot_agent::{run_spin, DisplayError, SpinDisplay, SpinError};
use chowbot_core::domain::intent::GuildId;
use chowbot_core::spin::SPIN_STARTING_MESSAGE;
use rand::Rng;
use thiserror::Error;

use crate::blocks::{food_messages, MessageTemplate};
use crate::events::ChannelId;
use crate::service::BotService;
use crate::socket::{ChatSender, MessageHandle, TransportError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RevealError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Spin(#[from] SpinError),
}

/// Spin frames land as edits of one sent message.
struct EditedMessage<'a> {
    sender: &'a dyn ChatSender,
    handle: MessageHandle,
}

#[async_trait]
impl<'a> SpinDisplay for EditedMessage<'a> {
    async fn show(&self, text: &str) -> Result<(), DisplayError> {
        self.sender.edit(&self.handle, text).await.map_err(|error| DisplayError(error.to_string()))
    }
}

pub fn searching_message(choice: &str) -> String {
    format!("🔎 正在搜尋「{choice}」附近餐廳…")
}

/// Posts the starting frame, animates the draw in place and returns the winner.
pub async fn reveal_spin<R: Rng + Send>(
    sender: &dyn ChatSender,
    channel: ChannelId,
    candidates: &[String],
    rng: &mut R,
) -> Result<String, RevealError> {
    if candidates.is_empty() {
        return Err(SpinError::EmptyPool.into());
    }
    let handle = sender.send(channel, MessageTemplate::text(SPIN_STARTING_MESSAGE)).await?;
    let display = EditedMessage { sender, handle };
    Ok(run_spin(candidates, &display, rng).await?)
}

/// Spin, then optionally search restaurants for the winner. The search notice
/// goes out before the search starts; the food reply is returned for delivery.
pub async fn spin_then_search<R: Rng + Send>(
    service: &dyn BotService,
    sender: &dyn ChatSender,
    channel: ChannelId,
    guild: Option<GuildId>,
    candidates: &[String],
    search: bool,
    rng: &mut R,
) -> Result<Vec<MessageTemplate>, RevealError> {
    let choice = reveal_spin(sender, channel, candidates, rng).await?;
    if !search {
        return Ok(Vec::new());
    }

    sender.send(channel, MessageTemplate::text(searching_message(&choice))).await?;
    let answer = service.recommend_food(&choice, guild).await;
    Ok(food_messages(&answer))
}
