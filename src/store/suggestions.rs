//! Suggestion record storage.

use super::DbError;
use crate::transport::{CommunityId, MSG_UNPOSTED, MemberId, MessageId, Profile, SuggestionId};
use sqlx::SqlitePool;

/// One suggestion, keyed (community, suggestion id).
///
/// `finished` implies exactly one of `approved`/`rejected`; a finished
/// record only ever changes again through reason back-fill or author
/// erasure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionRecord {
    pub author_id: Option<MemberId>,
    /// Name snapshot from submission time, in case the author becomes
    /// unresolvable later.
    pub author_name: Option<String>,
    pub author_discriminator: Option<String>,
    /// Live display message, or one of the sentinels (0 unposted, 1 orphaned).
    pub message_id: MessageId,
    pub body: String,
    pub attachment_url: Option<String>,
    pub finished: bool,
    pub approved: bool,
    pub rejected: bool,
    pub has_reason: bool,
    pub reason: Option<String>,
    pub created_at: i64,
}

impl SuggestionRecord {
    /// Fresh pending record for a new submission, not yet posted.
    pub fn new(author: &Profile, body: &str, attachment: Option<&str>) -> Self {
        Self {
            author_id: Some(author.id),
            author_name: Some(author.name.clone()),
            author_discriminator: Some(author.discriminator.clone()),
            message_id: MSG_UNPOSTED,
            body: body.to_string(),
            attachment_url: attachment.map(str::to_string),
            finished: false,
            approved: false,
            rejected: false,
            has_reason: false,
            reason: None,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Whether the display message was ever posted. An unposted record is
    /// reported as nonexistent by lookups.
    pub fn is_posted(&self) -> bool {
        self.message_id != MSG_UNPOSTED
    }
}

type SuggestionRow = (
    Option<i64>,
    Option<String>,
    Option<String>,
    i64,
    String,
    Option<String>,
    i64,
    i64,
    i64,
    i64,
    Option<String>,
    i64,
);

fn from_row(row: SuggestionRow) -> SuggestionRecord {
    let (
        author_id,
        author_name,
        author_discriminator,
        message_id,
        body,
        attachment_url,
        finished,
        approved,
        rejected,
        has_reason,
        reason,
        created_at,
    ) = row;
    SuggestionRecord {
        author_id: author_id.map(|a| a as MemberId),
        author_name,
        author_discriminator,
        message_id: message_id as MessageId,
        body,
        attachment_url,
        finished: finished != 0,
        approved: approved != 0,
        rejected: rejected != 0,
        has_reason: has_reason != 0,
        reason,
        created_at,
    }
}

/// Repository for suggestion records.
pub struct SuggestionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SuggestionRepository<'a> {
    /// Create a new suggestion repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new record. `Duplicate` when the key is already taken,
    /// which callers treat as an allocator invariant violation.
    pub async fn create(
        &self,
        community: CommunityId,
        id: SuggestionId,
        record: &SuggestionRecord,
    ) -> Result<(), DbError> {
        let result = sqlx::query(
            r#"
            INSERT INTO suggestions
            (community, suggestion_id, author_id, author_name, author_discriminator,
             message_id, body, attachment_url,
             finished, approved, rejected, has_reason, reason, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(community as i64)
        .bind(id as i64)
        .bind(record.author_id.map(|a| a as i64))
        .bind(record.author_name.as_deref())
        .bind(record.author_discriminator.as_deref())
        .bind(record.message_id as i64)
        .bind(&record.body)
        .bind(record.attachment_url.as_deref())
        .bind(record.finished as i64)
        .bind(record.approved as i64)
        .bind(record.rejected as i64)
        .bind(record.has_reason as i64)
        .bind(record.reason.as_deref())
        .bind(record.created_at)
        .execute(self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                if e.as_database_error()
                    .is_some_and(|d| d.is_unique_violation())
                {
                    Err(DbError::Duplicate)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    /// Fetch a record, `None` when the key was never created.
    pub async fn fetch(
        &self,
        community: CommunityId,
        id: SuggestionId,
    ) -> Result<Option<SuggestionRecord>, DbError> {
        let row = sqlx::query_as::<_, SuggestionRow>(
            r#"
            SELECT author_id, author_name, author_discriminator,
                   message_id, body, attachment_url,
                   finished, approved, rejected, has_reason, reason, created_at
            FROM suggestions
            WHERE community = ? AND suggestion_id = ?
            "#,
        )
        .bind(community as i64)
        .bind(id as i64)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(from_row))
    }

    /// Overwrite an existing record.
    pub async fn update(
        &self,
        community: CommunityId,
        id: SuggestionId,
        record: &SuggestionRecord,
    ) -> Result<(), DbError> {
        sqlx::query(
            r#"
            UPDATE suggestions
            SET author_id = ?, author_name = ?, author_discriminator = ?,
                message_id = ?, body = ?, attachment_url = ?,
                finished = ?, approved = ?, rejected = ?,
                has_reason = ?, reason = ?, created_at = ?
            WHERE community = ? AND suggestion_id = ?
            "#,
        )
        .bind(record.author_id.map(|a| a as i64))
        .bind(record.author_name.as_deref())
        .bind(record.author_discriminator.as_deref())
        .bind(record.message_id as i64)
        .bind(&record.body)
        .bind(record.attachment_url.as_deref())
        .bind(record.finished as i64)
        .bind(record.approved as i64)
        .bind(record.rejected as i64)
        .bind(record.has_reason as i64)
        .bind(record.reason.as_deref())
        .bind(record.created_at)
        .bind(community as i64)
        .bind(id as i64)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Clear the author snapshot for one record (data erasure). The body
    /// and resolution are left intact.
    pub async fn clear_author(
        &self,
        community: CommunityId,
        id: SuggestionId,
    ) -> Result<(), DbError> {
        sqlx::query(
            r#"
            UPDATE suggestions
            SET author_id = NULL, author_name = NULL, author_discriminator = NULL
            WHERE community = ? AND suggestion_id = ?
            "#,
        )
        .bind(community as i64)
        .bind(id as i64)
        .execute(self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Database;

    fn author() -> Profile {
        Profile {
            id: 21,
            name: "alice".to_string(),
            discriminator: "0441".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_fetch_update_cycle() {
        let db = Database::new(":memory:").await.unwrap();
        let record = SuggestionRecord::new(&author(), "add dark mode", None);
        assert!(!record.is_posted());

        db.suggestions().create(1, 1, &record).await.unwrap();

        let mut loaded = db.suggestions().fetch(1, 1).await.unwrap().unwrap();
        assert_eq!(loaded, record);

        loaded.message_id = 42;
        loaded.finished = true;
        loaded.approved = true;
        db.suggestions().update(1, 1, &loaded).await.unwrap();

        let reloaded = db.suggestions().fetch(1, 1).await.unwrap().unwrap();
        assert!(reloaded.is_posted());
        assert!(reloaded.finished && reloaded.approved && !reloaded.rejected);
    }

    #[tokio::test]
    async fn test_duplicate_key_is_reported() {
        let db = Database::new(":memory:").await.unwrap();
        let record = SuggestionRecord::new(&author(), "x", None);

        db.suggestions().create(1, 1, &record).await.unwrap();
        assert!(matches!(
            db.suggestions().create(1, 1, &record).await,
            Err(DbError::Duplicate)
        ));

        // Same id under another community is a distinct key.
        db.suggestions().create(2, 1, &record).await.unwrap();
    }

    #[tokio::test]
    async fn test_clear_author_preserves_body_and_flags() {
        let db = Database::new(":memory:").await.unwrap();
        let mut record = SuggestionRecord::new(&author(), "keep me", Some("http://img"));
        record.message_id = 9;
        record.finished = true;
        record.rejected = true;
        db.suggestions().create(1, 3, &record).await.unwrap();

        db.suggestions().clear_author(1, 3).await.unwrap();

        let loaded = db.suggestions().fetch(1, 3).await.unwrap().unwrap();
        assert_eq!(loaded.author_id, None);
        assert_eq!(loaded.author_name, None);
        assert_eq!(loaded.author_discriminator, None);
        assert_eq!(loaded.body, "keep me");
        assert!(loaded.finished && loaded.rejected);
    }
}
