//! Engine state and orchestration.
//!
//! The [`Engine`] composes the store, the transport and the keyed critical
//! sections; the lifecycle operations live in the submodules.

mod allocator;
mod bans;
pub mod display;
mod lifecycle;
mod locks;
pub mod router;
pub mod tally;

mod notify;

pub use bans::{BanOutcome, UnbanOutcome};
pub use lifecycle::{Resolution, SubmitOutcome, SubmitRequest};
pub use locks::KeyedLocks;
pub use router::Transition;
pub use tally::{VoteTotals, tally};

use crate::error::SuggestError;
use crate::store::{CommunitySettings, Database};
use crate::transport::{CommunityId, MemberId, SuggestionId, Transport};
use std::sync::Arc;

/// Shared engine state.
///
/// Settings and suggestion records are owned exclusively by the store;
/// every read here is a fresh fetch and every write goes through one of the
/// keyed critical sections. Nothing is cached across suspension points.
pub struct Engine {
    pub(crate) db: Database,
    pub(crate) transport: Arc<dyn Transport>,
    /// The engine's own member id on the chat platform. Its reactions seed
    /// the vote counters and are excluded from tallies and the guard.
    pub(crate) self_member: MemberId,
    /// Serializes id allocation and settings writes per community.
    pub(crate) community_locks: KeyedLocks<CommunityId>,
    /// Serializes the read-check-mutate of resolution per suggestion.
    pub(crate) suggestion_locks: KeyedLocks<(CommunityId, SuggestionId)>,
    /// Serializes ban mutations per (community, member) pair.
    pub(crate) ban_locks: KeyedLocks<(CommunityId, MemberId)>,
}

impl Engine {
    pub fn new(db: Database, transport: Arc<dyn Transport>, self_member: MemberId) -> Self {
        Self {
            db,
            transport,
            self_member,
            community_locks: KeyedLocks::new(),
            suggestion_locks: KeyedLocks::new(),
            ban_locks: KeyedLocks::new(),
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Current settings for a community (defaults when never configured).
    pub async fn settings(&self, community: CommunityId) -> Result<CommunitySettings, SuggestError> {
        Ok(self.db.settings().load(community).await?)
    }

    /// Mutate a community's settings under its critical section and return
    /// the updated value.
    pub async fn update_settings<F>(
        &self,
        community: CommunityId,
        update: F,
    ) -> Result<CommunitySettings, SuggestError>
    where
        F: FnOnce(&mut CommunitySettings),
    {
        let _guard = self.community_locks.acquire(community).await;
        let mut settings = self.db.settings().load(community).await?;
        update(&mut settings);
        self.db.settings().save(community, &settings).await?;
        Ok(settings)
    }
}
