//! Per-community settings storage.

use super::DbError;
use crate::transport::{ChannelId, CommunityId, Symbol};
use sqlx::SqlitePool;

/// Per-community configuration.
///
/// A community that has never been configured gets these defaults on load;
/// the row is written on the first settings mutation or id allocation and
/// persists for the community's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunitySettings {
    /// Resolve suggestions in the submission channel instead of moving them.
    pub same_channel: bool,
    pub submission_channel: Option<ChannelId>,
    pub approved_channel: Option<ChannelId>,
    pub rejected_channel: Option<ChannelId>,
    /// Next suggestion id to allocate; mutated only by the allocator.
    pub next_id: u64,
    pub up_symbol: Option<Symbol>,
    pub down_symbol: Option<Symbol>,
    /// Delete the triggering request message after a submission.
    pub delete_on_submit: bool,
    /// Delete the original message when a suggestion is resolved away.
    pub delete_on_resolve: bool,
    pub allow_attachments: bool,
}

impl Default for CommunitySettings {
    fn default() -> Self {
        Self {
            same_channel: false,
            submission_channel: None,
            approved_channel: None,
            rejected_channel: None,
            next_id: 1,
            up_symbol: None,
            down_symbol: None,
            delete_on_submit: false,
            delete_on_resolve: true,
            allow_attachments: true,
        }
    }
}

impl CommunitySettings {
    /// Configured up-vote symbol, or the default checkmark.
    pub fn up_or_default(&self) -> Symbol {
        self.up_symbol.clone().unwrap_or_else(Symbol::default_up)
    }

    /// Configured down-vote symbol, or the default cross.
    pub fn down_or_default(&self) -> Symbol {
        self.down_symbol.clone().unwrap_or_else(Symbol::default_down)
    }
}

/// Repository for community settings.
pub struct SettingsRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SettingsRepository<'a> {
    /// Create a new settings repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Load a community's settings, defaulting when no row exists yet.
    pub async fn load(&self, community: CommunityId) -> Result<CommunitySettings, DbError> {
        let row = sqlx::query_as::<
            _,
            (
                i64,
                Option<i64>,
                Option<i64>,
                Option<i64>,
                i64,
                Option<String>,
                Option<String>,
                i64,
                i64,
                i64,
            ),
        >(
            r#"
            SELECT same_channel, submission_channel, approved_channel, rejected_channel,
                   next_id, up_symbol, down_symbol,
                   delete_on_submit, delete_on_resolve, allow_attachments
            FROM community_settings
            WHERE community = ?
            "#,
        )
        .bind(community as i64)
        .fetch_optional(self.pool)
        .await?;

        Ok(row
            .map(
                |(
                    same_channel,
                    submission_channel,
                    approved_channel,
                    rejected_channel,
                    next_id,
                    up_symbol,
                    down_symbol,
                    delete_on_submit,
                    delete_on_resolve,
                    allow_attachments,
                )| {
                    CommunitySettings {
                        same_channel: same_channel != 0,
                        submission_channel: submission_channel.map(|c| c as ChannelId),
                        approved_channel: approved_channel.map(|c| c as ChannelId),
                        rejected_channel: rejected_channel.map(|c| c as ChannelId),
                        next_id: next_id as u64,
                        up_symbol: up_symbol.map(Symbol),
                        down_symbol: down_symbol.map(Symbol),
                        delete_on_submit: delete_on_submit != 0,
                        delete_on_resolve: delete_on_resolve != 0,
                        allow_attachments: allow_attachments != 0,
                    }
                },
            )
            .unwrap_or_default())
    }

    /// Save a community's settings as a full row.
    pub async fn save(
        &self,
        community: CommunityId,
        settings: &CommunitySettings,
    ) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO community_settings
            (community, same_channel, submission_channel, approved_channel, rejected_channel,
             next_id, up_symbol, down_symbol,
             delete_on_submit, delete_on_resolve, allow_attachments)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(community as i64)
        .bind(settings.same_channel as i64)
        .bind(settings.submission_channel.map(|c| c as i64))
        .bind(settings.approved_channel.map(|c| c as i64))
        .bind(settings.rejected_channel.map(|c| c as i64))
        .bind(settings.next_id as i64)
        .bind(settings.up_symbol.as_ref().map(|s| s.0.as_str()))
        .bind(settings.down_symbol.as_ref().map(|s| s.0.as_str()))
        .bind(settings.delete_on_submit as i64)
        .bind(settings.delete_on_resolve as i64)
        .bind(settings.allow_attachments as i64)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Every id ever allocated for a community, as the lazy range
    /// `1..next_id`. Used by bulk sweeps (data erasure); finite and
    /// restartable.
    pub async fn allocated_ids(
        &self,
        community: CommunityId,
    ) -> Result<std::ops::Range<u64>, DbError> {
        let settings = self.load(community).await?;
        Ok(1..settings.next_id)
    }

    /// All communities that have a settings row, for the erasure sweep.
    pub async fn communities(&self) -> Result<Vec<CommunityId>, DbError> {
        let rows = sqlx::query_as::<_, (i64,)>(
            "SELECT community FROM community_settings ORDER BY community",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(|(c,)| c as CommunityId).collect())
    }
}
