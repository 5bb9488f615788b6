//! Per-community suggestion id allocation.

use super::Engine;
use crate::error::SuggestError;
use crate::transport::{CommunityId, SuggestionId};

impl Engine {
    /// Allocate the next suggestion id for a community.
    ///
    /// Read-increment-write of `next_id` inside the community critical
    /// section: two concurrent submissions never observe the same value and
    /// the allocated range has no gaps. The first allocation for an unseen
    /// community returns 1.
    pub(crate) async fn allocate_id(
        &self,
        community: CommunityId,
    ) -> Result<SuggestionId, SuggestError> {
        let _guard = self.community_locks.acquire(community).await;

        let mut settings = self.db.settings().load(community).await?;
        let id = settings.next_id;
        settings.next_id += 1;
        self.db.settings().save(community, &settings).await?;

        Ok(id)
    }
}
