//! Submission ban registry operations.
//!
//! Who may ban whom (self/owner/rank rules) is the command layer's concern;
//! the registry itself only guarantees serialized, lost-update-free
//! mutations per (community, member) pair and reports no-op outcomes.

use super::Engine;
use crate::error::SuggestError;
use crate::store::BanEntry;
use crate::transport::{CommunityId, MemberId};

/// Outcome of a ban request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BanOutcome {
    Added,
    AlreadyBanned,
}

/// Outcome of an unban request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnbanOutcome {
    Removed,
    NotBanned,
}

impl Engine {
    /// Bar a member from submitting.
    pub async fn ban(
        &self,
        community: CommunityId,
        member: MemberId,
        banned_by: MemberId,
    ) -> Result<BanOutcome, SuggestError> {
        let _guard = self.ban_locks.acquire((community, member)).await;

        if self.db.bans().add(community, member, banned_by).await? {
            tracing::info!(community, member, banned_by, "member banned from suggesting");
            Ok(BanOutcome::Added)
        } else {
            Ok(BanOutcome::AlreadyBanned)
        }
    }

    /// Lift a member's submission ban.
    pub async fn unban(
        &self,
        community: CommunityId,
        member: MemberId,
    ) -> Result<UnbanOutcome, SuggestError> {
        let _guard = self.ban_locks.acquire((community, member)).await;

        if self.db.bans().remove(community, member).await? {
            tracing::info!(community, member, "member unbanned from suggesting");
            Ok(UnbanOutcome::Removed)
        } else {
            Ok(UnbanOutcome::NotBanned)
        }
    }

    /// Whether a member is currently banned.
    pub async fn is_banned(
        &self,
        community: CommunityId,
        member: MemberId,
    ) -> Result<bool, SuggestError> {
        Ok(self.db.bans().contains(community, member).await?)
    }

    /// All bans in a community.
    pub async fn banned_members(
        &self,
        community: CommunityId,
    ) -> Result<Vec<BanEntry>, SuggestError> {
        Ok(self.db.bans().list(community).await?)
    }

    /// Drop every ban in a community, returning how many were lifted.
    /// Confirmation of the request happens in the command layer before this
    /// is called.
    pub async fn clear_bans(&self, community: CommunityId) -> Result<u64, SuggestError> {
        let cleared = self.db.bans().clear(community).await?;
        tracing::info!(community, cleared, "ban list cleared");
        Ok(cleared)
    }
}
