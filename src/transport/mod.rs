//! Chat transport abstraction.
//!
//! The engine never talks to a chat platform directly. Everything goes
//! through the [`Transport`] trait, so the lifecycle logic can be driven by
//! a real platform adapter, or by the in-memory transport used by the local
//! console and the integration tests.

pub mod memory;

pub use memory::InMemoryTransport;

use async_trait::async_trait;
use thiserror::Error;

/// Community (tenant) identifier.
pub type CommunityId = u64;
/// Channel identifier within a community.
pub type ChannelId = u64;
/// Member identifier.
pub type MemberId = u64;
/// Message identifier assigned by the transport.
pub type MessageId = u64;
/// Suggestion identifier, allocated per community starting at 1.
pub type SuggestionId = u64;

/// `message_id` value for a record whose display was never posted.
pub const MSG_UNPOSTED: MessageId = 0;

/// `message_id` sentinel for "resolved, but reposted nowhere": the original
/// message was deleted and no destination channel was configured.
pub const MSG_ORPHANED: MessageId = 1;

/// A reaction glyph used to cast a vote.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol(pub String);

impl Symbol {
    /// Default up-vote glyph when a community has not configured one.
    pub const DEFAULT_UP: &'static str = "\u{2705}";
    /// Default down-vote glyph when a community has not configured one.
    pub const DEFAULT_DOWN: &'static str = "\u{274e}";

    pub fn new(glyph: impl Into<String>) -> Self {
        Self(glyph.into())
    }

    pub fn default_up() -> Self {
        Self(Self::DEFAULT_UP.to_string())
    }

    pub fn default_down() -> Self {
        Self(Self::DEFAULT_DOWN.to_string())
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named field appended to a display (Results, Reason).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
}

/// Renderable display content for a suggestion message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageContent {
    /// Top content line, e.g. "Suggestion #12".
    pub title: String,
    /// State-dependent author line, e.g. "Suggestion by alice".
    pub author_line: String,
    /// The proposal text.
    pub body: String,
    /// Appended fields, in display order.
    pub fields: Vec<Field>,
    /// Optional attachment image URL.
    pub image: Option<String>,
    /// Footer, e.g. "Suggested by alice#0441 (17)".
    pub footer: String,
}

impl MessageContent {
    /// Append a named field.
    pub fn push_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push(Field {
            name: name.into(),
            value: value.into(),
        });
    }

    /// Look up a field's value by name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

/// One reaction entry on a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub symbol: Symbol,
    /// Raw participant count, including the engine's own seed reaction.
    pub count: u64,
    /// Members who reacted. The engine's seed carries no member entry.
    pub members: Vec<MemberId>,
}

/// A message as read back from the transport.
#[derive(Debug, Clone)]
pub struct FetchedMessage {
    pub content: MessageContent,
    pub reactions: Vec<Reaction>,
}

/// A member profile as resolved by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: MemberId,
    pub name: String,
    pub discriminator: String,
}

/// Transport-level failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("channel {0} does not exist")]
    ChannelMissing(ChannelId),

    #[error("message {0} not found")]
    NotFound(MessageId),

    #[error("operation forbidden")]
    Forbidden,

    #[error("transport failure: {0}")]
    Io(String),
}

/// The chat platform boundary.
///
/// Every method is a suspension point; callers tolerate arbitrary latency
/// and convert failures at their own boundary (see `SuggestError`).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Post a new message, returning its transport-assigned id.
    async fn post_message(
        &self,
        channel: ChannelId,
        content: &MessageContent,
    ) -> Result<MessageId, TransportError>;

    /// Replace the content of an existing message.
    async fn edit_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        content: &MessageContent,
    ) -> Result<(), TransportError>;

    /// Delete a message.
    async fn delete_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<(), TransportError>;

    /// Read a message back, including its reaction state.
    async fn fetch_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<FetchedMessage, TransportError>;

    /// Add the engine's own reaction (vote seeding, symbol validation).
    async fn add_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        symbol: &Symbol,
    ) -> Result<(), TransportError>;

    /// Remove one member's reaction.
    async fn remove_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        symbol: &Symbol,
        member: MemberId,
    ) -> Result<(), TransportError>;

    /// Resolve a member profile. `None` means the member is gone; callers
    /// fall back to the snapshot captured at submission time.
    async fn fetch_user(&self, member: MemberId) -> Result<Option<Profile>, TransportError>;

    /// Send a private message to a member.
    async fn send_direct(
        &self,
        member: MemberId,
        text: &str,
        content: &MessageContent,
    ) -> Result<(), TransportError>;
}
