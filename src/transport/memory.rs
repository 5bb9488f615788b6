//! In-memory transport.
//!
//! Backs the local console front-end and the integration tests. Messages,
//! reactions and profiles live in process memory; test helpers can inject
//! member reactions and inspect the direct-message outbox.

use super::{
    ChannelId, FetchedMessage, MemberId, MessageContent, MessageId, Profile, Reaction, Symbol,
    Transport, TransportError,
};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Message id counter starts at 2: 0 and 1 are reserved record sentinels
/// (never-posted and resolved-but-reposted-nowhere).
const MESSAGE_ID_START: u64 = 2;

#[derive(Debug, Clone)]
struct StoredMessage {
    channel: ChannelId,
    content: MessageContent,
    reactions: Vec<Reaction>,
}

/// A delivered direct message, kept for inspection.
#[derive(Debug, Clone)]
pub struct DirectMessage {
    pub member: MemberId,
    pub text: String,
    pub content: MessageContent,
}

/// Transport implementation over process memory.
#[derive(Default)]
pub struct InMemoryTransport {
    next_message_id: AtomicU64,
    channels: DashSet<ChannelId>,
    messages: DashMap<MessageId, StoredMessage>,
    profiles: DashMap<MemberId, Profile>,
    /// Members whose direct messages bounce with `Forbidden`.
    unreachable: DashSet<MemberId>,
    outbox: Mutex<Vec<DirectMessage>>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self {
            next_message_id: AtomicU64::new(MESSAGE_ID_START),
            ..Self::default()
        }
    }

    /// Register a channel so messages can be posted into it.
    pub fn open_channel(&self, channel: ChannelId) {
        self.channels.insert(channel);
    }

    /// Register a resolvable member profile.
    pub fn add_profile(&self, profile: Profile) {
        self.profiles.insert(profile.id, profile);
    }

    /// Mark a member's direct messages as refused.
    pub fn set_unreachable(&self, member: MemberId) {
        self.unreachable.insert(member);
    }

    /// Record a member's vote on a message, as the platform would.
    pub fn react(&self, message: MessageId, member: MemberId, symbol: &Symbol) {
        if let Some(mut stored) = self.messages.get_mut(&message) {
            match stored.reactions.iter_mut().find(|r| r.symbol == *symbol) {
                Some(reaction) => {
                    if !reaction.members.contains(&member) {
                        reaction.count += 1;
                        reaction.members.push(member);
                    }
                }
                None => stored.reactions.push(Reaction {
                    symbol: symbol.clone(),
                    count: 1,
                    members: vec![member],
                }),
            }
        }
    }

    /// Current content of a message, if it exists.
    pub fn content(&self, message: MessageId) -> Option<MessageContent> {
        self.messages.get(&message).map(|m| m.content.clone())
    }

    /// Current reaction state of a message.
    pub fn reactions(&self, message: MessageId) -> Vec<Reaction> {
        self.messages
            .get(&message)
            .map(|m| m.reactions.clone())
            .unwrap_or_default()
    }

    /// Ids of all live messages in a channel, in posting order.
    pub fn channel_messages(&self, channel: ChannelId) -> Vec<MessageId> {
        let mut ids: Vec<MessageId> = self
            .messages
            .iter()
            .filter(|e| e.value().channel == channel)
            .map(|e| *e.key())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Snapshot of delivered direct messages.
    pub fn outbox(&self) -> Vec<DirectMessage> {
        self.outbox.lock().clone()
    }

    fn stored(&self, channel: ChannelId, message: MessageId) -> Result<StoredMessage, TransportError> {
        if !self.channels.contains(&channel) {
            return Err(TransportError::ChannelMissing(channel));
        }
        match self.messages.get(&message) {
            Some(m) if m.channel == channel => Ok(m.clone()),
            _ => Err(TransportError::NotFound(message)),
        }
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn post_message(
        &self,
        channel: ChannelId,
        content: &MessageContent,
    ) -> Result<MessageId, TransportError> {
        if !self.channels.contains(&channel) {
            return Err(TransportError::ChannelMissing(channel));
        }
        let id = self.next_message_id.fetch_add(1, Ordering::Relaxed);
        self.messages.insert(
            id,
            StoredMessage {
                channel,
                content: content.clone(),
                reactions: Vec::new(),
            },
        );
        Ok(id)
    }

    async fn edit_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        content: &MessageContent,
    ) -> Result<(), TransportError> {
        self.stored(channel, message)?;
        if let Some(mut stored) = self.messages.get_mut(&message) {
            stored.content = content.clone();
        }
        Ok(())
    }

    async fn delete_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<(), TransportError> {
        self.stored(channel, message)?;
        self.messages.remove(&message);
        Ok(())
    }

    async fn fetch_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<FetchedMessage, TransportError> {
        let stored = self.stored(channel, message)?;
        Ok(FetchedMessage {
            content: stored.content,
            reactions: stored.reactions,
        })
    }

    async fn add_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        symbol: &Symbol,
    ) -> Result<(), TransportError> {
        self.stored(channel, message)?;
        if let Some(mut stored) = self.messages.get_mut(&message) {
            // The engine's own reaction: counted, but no member entry.
            match stored.reactions.iter_mut().find(|r| r.symbol == *symbol) {
                Some(reaction) => reaction.count += 1,
                None => stored.reactions.push(Reaction {
                    symbol: symbol.clone(),
                    count: 1,
                    members: Vec::new(),
                }),
            }
        }
        Ok(())
    }

    async fn remove_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        symbol: &Symbol,
        member: MemberId,
    ) -> Result<(), TransportError> {
        self.stored(channel, message)?;
        if let Some(mut stored) = self.messages.get_mut(&message) {
            if let Some(reaction) = stored.reactions.iter_mut().find(|r| r.symbol == *symbol) {
                if let Some(pos) = reaction.members.iter().position(|m| *m == member) {
                    reaction.members.remove(pos);
                    reaction.count = reaction.count.saturating_sub(1);
                }
            }
        }
        Ok(())
    }

    async fn fetch_user(&self, member: MemberId) -> Result<Option<Profile>, TransportError> {
        Ok(self.profiles.get(&member).map(|p| p.clone()))
    }

    async fn send_direct(
        &self,
        member: MemberId,
        text: &str,
        content: &MessageContent,
    ) -> Result<(), TransportError> {
        if self.unreachable.contains(&member) {
            return Err(TransportError::Forbidden);
        }
        self.outbox.lock().push(DirectMessage {
            member,
            text: text.to_string(),
            content: content.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(title: &str) -> MessageContent {
        MessageContent {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_post_edit_delete_cycle() {
        let transport = InMemoryTransport::new();
        transport.open_channel(5);

        let id = transport.post_message(5, &content("one")).await.unwrap();
        assert!(id >= MESSAGE_ID_START);

        transport.edit_message(5, id, &content("two")).await.unwrap();
        let fetched = transport.fetch_message(5, id).await.unwrap();
        assert_eq!(fetched.content.title, "two");

        transport.delete_message(5, id).await.unwrap();
        assert_eq!(
            transport.fetch_message(5, id).await,
            Err(TransportError::NotFound(id))
        );
    }

    #[tokio::test]
    async fn test_unknown_channel_is_missing() {
        let transport = InMemoryTransport::new();
        assert_eq!(
            transport.post_message(9, &content("x")).await,
            Err(TransportError::ChannelMissing(9))
        );
    }

    #[tokio::test]
    async fn test_seed_reaction_has_no_member_entry() {
        let transport = InMemoryTransport::new();
        transport.open_channel(1);
        let id = transport.post_message(1, &content("x")).await.unwrap();

        let up = Symbol::default_up();
        transport.add_reaction(1, id, &up).await.unwrap();
        transport.react(id, 42, &up);
        transport.react(id, 43, &up);

        let reactions = transport.reactions(id);
        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions[0].count, 3);
        assert_eq!(reactions[0].members, vec![42, 43]);
    }

    #[tokio::test]
    async fn test_remove_reaction_only_touches_member_votes() {
        let transport = InMemoryTransport::new();
        transport.open_channel(1);
        let id = transport.post_message(1, &content("x")).await.unwrap();

        let up = Symbol::default_up();
        transport.add_reaction(1, id, &up).await.unwrap();
        transport.react(id, 42, &up);
        transport.remove_reaction(1, id, &up, 42).await.unwrap();

        let reactions = transport.reactions(id);
        assert_eq!(reactions[0].count, 1);
        assert!(reactions[0].members.is_empty());
    }

    #[tokio::test]
    async fn test_direct_messages_and_forbidden() {
        let transport = InMemoryTransport::new();
        transport
            .send_direct(7, "hello", &content("x"))
            .await
            .unwrap();
        assert_eq!(transport.outbox().len(), 1);

        transport.set_unreachable(8);
        assert_eq!(
            transport.send_direct(8, "hello", &content("x")).await,
            Err(TransportError::Forbidden)
        );
        assert_eq!(transport.outbox().len(), 1);
    }
}
