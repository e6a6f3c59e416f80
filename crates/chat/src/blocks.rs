use chowbot_agent::FoodAnswer;
use chowbot_core::format::{chunk_message, make_urls_clickable, MAX_MESSAGE_CHARS, MAX_RESTAURANT_NAMES};
use serde::Serialize;

pub const WISHLIST_PROMPT: &str = "想加入待吃清單？點下面按鈕：";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Secondary,
}

/// What a button does when pressed. Values are bound when the button is
/// built, so each button keeps its own item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ButtonAction {
    AddToWishlist { index: usize, item: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ButtonElement {
    pub custom_id: String,
    pub label: String,
    pub style: ButtonStyle,
    pub action: ButtonAction,
}

impl ButtonElement {
    pub fn new(custom_id: impl Into<String>, label: impl Into<String>, action: ButtonAction) -> Self {
        Self { custom_id: custom_id.into(), label: label.into(), style: ButtonStyle::Secondary, action }
    }

    pub fn style(mut self, style: ButtonStyle) -> Self {
        self.style = style;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<ButtonElement>,
    pub ephemeral: bool,
}

impl MessageTemplate {
    pub fn text(content: impl Into<String>) -> Self {
        MessageBuilder::new(content).build()
    }

    /// Visible only to the user who triggered it.
    pub fn ephemeral(content: impl Into<String>) -> Self {
        MessageBuilder::new(content).ephemeral().build()
    }
}

pub struct MessageBuilder {
    content: String,
    buttons: Vec<ButtonElement>,
    ephemeral: bool,
}

impl MessageBuilder {
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into(), buttons: Vec::new(), ephemeral: false }
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }

    pub fn actions<F>(mut self, build: F) -> Self
    where
        F: FnOnce(&mut ActionsBuilder),
    {
        let mut builder = ActionsBuilder::default();
        build(&mut builder);
        self.buttons.extend(builder.build());
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate { content: self.content, buttons: self.buttons, ephemeral: self.ephemeral }
    }
}

#[derive(Default)]
pub struct ActionsBuilder {
    elements: Vec<ButtonElement>,
}

impl ActionsBuilder {
    pub fn button(&mut self, button: ButtonElement) -> &mut Self {
        self.elements.push(button);
        self
    }

    fn build(self) -> Vec<ButtonElement> {
        self.elements
    }
}

/// Links made clickable, then split into transport-sized messages.
pub fn text_messages(text: &str) -> Vec<MessageTemplate> {
    chunk_message(&make_urls_clickable(text), MAX_MESSAGE_CHARS)
        .into_iter()
        .map(MessageTemplate::text)
        .collect()
}

/// The answer text, then the wishlist buttons when the raw answer lists places.
pub fn food_messages(answer: &FoodAnswer) -> Vec<MessageTemplate> {
    let mut messages = text_messages(&answer.display);
    messages.extend(wishlist_prompt(&answer.restaurant_names()));
    messages
}

/// One `加入 N` button per name, at most five. `None` when there are no names.
pub fn wishlist_prompt(names: &[String]) -> Option<MessageTemplate> {
    if names.is_empty() {
        return None;
    }

    let message = MessageBuilder::new(WISHLIST_PROMPT)
        .actions(|actions| {
            for (index, item) in names.iter().take(MAX_RESTAURANT_NAMES).enumerate() {
                let number = index + 1;
                actions.button(
                    ButtonElement::new(
                        format!("wishlist.add.{number}"),
                        format!("加入 {number}"),
                        ButtonAction::AddToWishlist { index: number, item: item.clone() },
                    )
                    .style(ButtonStyle::Primary),
                );
            }
        })
        .build();
    Some(message)
}
