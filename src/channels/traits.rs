use async_trait::async_trait;

/// Payload of an inbound chat update, reduced to the kinds the flows consume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Plain text or a reply-keyboard button press
    Text(String),
    /// Photo attachment; `file_id` references the highest-resolution variant
    Photo { file_id: String },
    /// Structured contact share
    Contact { phone: String },
}

/// A message received from a channel
#[derive(Debug, Clone)]
pub struct ChannelMessage {
    pub id: String,
    /// Chat identifier the reply goes back to
    pub chat_id: String,
    pub event: InboundEvent,
    pub channel: String,
    pub timestamp: u64,
}

/// A single reply-keyboard button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub text: String,
    /// Ask the client to share the user's contact when pressed
    pub request_contact: bool,
}

impl Button {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            request_contact: false,
        }
    }

    pub fn contact(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            request_contact: true,
        }
    }
}

/// Quick-reply keyboard attached to an outgoing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Rows of buttons shown under the input field
    Buttons(Vec<Vec<Button>>),
    /// Remove any previously shown keyboard
    Remove,
}

impl Keyboard {
    /// One row of plain text buttons
    pub fn row<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Buttons(vec![labels.into_iter().map(Button::new).collect()])
    }
}

/// Outgoing effect produced by the dialog engine for the originating chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Effect {
    pub text: String,
    /// `None` leaves whatever keyboard is currently shown
    pub keyboard: Option<Keyboard>,
}

impl Effect {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}

/// Core channel trait, implemented once per messaging platform
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name
    fn name(&self) -> &str;

    /// Send a text reply, optionally with a quick-reply keyboard
    async fn reply(
        &self,
        chat_id: &str,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> anyhow::Result<()>;

    /// Start listening for incoming messages (long-running)
    async fn listen(&self, tx: tokio::sync::mpsc::Sender<ChannelMessage>) -> anyhow::Result<()>;

    /// Check if channel is healthy
    async fn health_check(&self) -> bool {
        true
    }
}
