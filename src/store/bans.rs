//! Repository for per-community submission bans.

use super::DbError;
use crate::transport::{CommunityId, MemberId};
use sqlx::SqlitePool;

/// One ban entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanEntry {
    pub member: MemberId,
    pub banned_by: MemberId,
    pub banned_at: i64,
}

/// Repository for ban operations.
pub struct BanRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> BanRepository<'a> {
    /// Create a new ban repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Add a ban. Returns false when the member was already banned.
    pub async fn add(
        &self,
        community: CommunityId,
        member: MemberId,
        banned_by: MemberId,
    ) -> Result<bool, DbError> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO suggestion_bans (community, member, banned_by, banned_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(community as i64)
        .bind(member as i64)
        .bind(banned_by as i64)
        .bind(now)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a ban. Returns false when the member was not banned.
    pub async fn remove(
        &self,
        community: CommunityId,
        member: MemberId,
    ) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM suggestion_bans WHERE community = ? AND member = ?")
            .bind(community as i64)
            .bind(member as i64)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether a member is banned from submitting.
    pub async fn contains(
        &self,
        community: CommunityId,
        member: MemberId,
    ) -> Result<bool, DbError> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT 1 FROM suggestion_bans WHERE community = ? AND member = ?",
        )
        .bind(community as i64)
        .bind(member as i64)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.is_some())
    }

    /// All bans in a community, oldest first.
    pub async fn list(&self, community: CommunityId) -> Result<Vec<BanEntry>, DbError> {
        let rows = sqlx::query_as::<_, (i64, i64, i64)>(
            r#"
            SELECT member, banned_by, banned_at
            FROM suggestion_bans
            WHERE community = ?
            ORDER BY banned_at, member
            "#,
        )
        .bind(community as i64)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(member, banned_by, banned_at)| BanEntry {
                member: member as MemberId,
                banned_by: banned_by as MemberId,
                banned_at,
            })
            .collect())
    }

    /// Remove every ban in a community, returning how many were dropped.
    pub async fn clear(&self, community: CommunityId) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM suggestion_bans WHERE community = ?")
            .bind(community as i64)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
