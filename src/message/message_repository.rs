use crate::{
    error::{AppError, Result},
    message::message_models::{ConversationSummary, Message, NewMessage},
};
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Durable record of direct messages.
///
/// Every read path only ever sees active messages; soft-deleted rows stay in
/// storage but are invisible here except through `find_by_id`.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn insert(&self, new_message: NewMessage) -> Result<Message>;

    /// Looks a message up regardless of its active flag.
    async fn find_by_id(&self, message_id: Uuid) -> Result<Option<Message>>;

    /// Active messages between the pair, oldest first.
    async fn find_conversation(
        &self,
        user_id: Uuid,
        other_user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>>;

    async fn count_conversation(&self, user_id: Uuid, other_user_id: Uuid) -> Result<i64>;

    /// One summary per counterpart, newest conversation first.
    async fn find_user_conversations(&self, user_id: Uuid) -> Result<Vec<ConversationSummary>>;

    /// Sets `is_read` on an active message. An already read message is
    /// returned untouched; a missing or deleted one is `NotFound`. Callers
    /// check authorization first.
    async fn mark_as_read(&self, message_id: Uuid) -> Result<Message>;

    /// Marks every active unread message `sender_id -> recipient_id` as read.
    async fn mark_conversation_as_read(&self, sender_id: Uuid, recipient_id: Uuid) -> Result<u64>;

    async fn deactivate(&self, message_id: Uuid) -> Result<()>;

    /// Case-insensitive literal substring search, newest first.
    async fn search(
        &self,
        user_id: Uuid,
        query: &str,
        counterpart_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>>;

    async fn count_search(&self, user_id: Uuid, query: &str, counterpart_id: Option<Uuid>) -> Result<i64>;

    async fn count_unread(&self, user_id: Uuid) -> Result<i64>;
}

#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

#[derive(FromRow)]
struct ConversationRow {
    counterpart_id: Uuid,
    unread_count: i64,
    #[sqlx(flatten)]
    message: Message,
}

const SEARCH_FILTER: &str = "is_active = true
     AND content ILIKE $2 ESCAPE '\\'
     AND (
        ($3::uuid IS NULL AND (sender_id = $1 OR recipient_id = $1))
        OR (sender_id = $1 AND recipient_id = $3)
        OR (sender_id = $3 AND recipient_id = $1)
     )";

impl MessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Builds an ILIKE pattern that matches `query` literally anywhere in the text.
pub fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl MessageStore for MessageRepository {
    async fn insert(&self, new_message: NewMessage) -> Result<Message> {
        let message = sqlx::query_as::<_, Message>(
            "INSERT INTO messages (sender_id, recipient_id, content, message_type, attachment_url)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(new_message.sender_id)
        .bind(new_message.recipient_id)
        .bind(&new_message.content)
        .bind(new_message.message_type)
        .bind(new_message.attachment_url.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    async fn find_by_id(&self, message_id: Uuid) -> Result<Option<Message>> {
        let message = sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = $1")
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(message)
    }

    async fn find_conversation(
        &self,
        user_id: Uuid,
        other_user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            "SELECT * FROM messages
             WHERE ((sender_id = $1 AND recipient_id = $2)
                OR (sender_id = $2 AND recipient_id = $1))
             AND is_active = true
             ORDER BY created_at ASC
             LIMIT $3 OFFSET $4",
        )
        .bind(user_id)
        .bind(other_user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn count_conversation(&self, user_id: Uuid, other_user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages
             WHERE ((sender_id = $1 AND recipient_id = $2)
                OR (sender_id = $2 AND recipient_id = $1))
             AND is_active = true",
        )
        .bind(user_id)
        .bind(other_user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn find_user_conversations(&self, user_id: Uuid) -> Result<Vec<ConversationSummary>> {
        let rows = sqlx::query_as::<_, ConversationRow>(
            "WITH touching AS (
                SELECT m.*,
                    CASE WHEN m.sender_id = $1 THEN m.recipient_id ELSE m.sender_id END AS counterpart_id
                FROM messages m
                WHERE (m.sender_id = $1 OR m.recipient_id = $1) AND m.is_active = true
            ),
            latest AS (
                SELECT DISTINCT ON (counterpart_id) *
                FROM touching
                ORDER BY counterpart_id, created_at DESC
            ),
            unread AS (
                SELECT counterpart_id, COUNT(*) AS unread_count
                FROM touching
                WHERE recipient_id = $1 AND is_read = false
                GROUP BY counterpart_id
            )
            SELECT latest.*, COALESCE(unread.unread_count, 0) AS unread_count
            FROM latest
            LEFT JOIN unread ON unread.counterpart_id = latest.counterpart_id
            ORDER BY latest.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ConversationSummary {
                counterpart_id: row.counterpart_id,
                last_message: row.message,
                unread_count: row.unread_count,
            })
            .collect())
    }

    async fn mark_as_read(&self, message_id: Uuid) -> Result<Message> {
        let updated = sqlx::query_as::<_, Message>(
            "UPDATE messages
             SET is_read = true, updated_at = NOW()
             WHERE id = $1 AND is_active = true AND is_read = false
             RETURNING *",
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(message) = updated {
            return Ok(message);
        }

        // No row changed, so tell an already read message from a deleted one.
        self.find_by_id(message_id)
            .await?
            .filter(|m| m.is_active)
            .ok_or(AppError::NotFound("Message not found".to_string()))
    }

    async fn mark_conversation_as_read(&self, sender_id: Uuid, recipient_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE messages
             SET is_read = true, updated_at = NOW()
             WHERE sender_id = $1 AND recipient_id = $2 AND is_read = false AND is_active = true",
        )
        .bind(sender_id)
        .bind(recipient_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn deactivate(&self, message_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE messages
             SET is_active = false, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(message_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Message not found".to_string()));
        }

        Ok(())
    }

    async fn search(
        &self,
        user_id: Uuid,
        query: &str,
        counterpart_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>> {
        let sql = format!(
            "SELECT * FROM messages WHERE {} ORDER BY created_at DESC LIMIT $4 OFFSET $5",
            SEARCH_FILTER
        );

        let messages = sqlx::query_as::<_, Message>(&sql)
            .bind(user_id)
            .bind(like_pattern(query))
            .bind(counterpart_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(messages)
    }

    async fn count_search(&self, user_id: Uuid, query: &str, counterpart_id: Option<Uuid>) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM messages WHERE {}", SEARCH_FILTER);

        let count: i64 = sqlx::query_scalar(&sql)
            .bind(user_id)
            .bind(like_pattern(query))
            .bind(counterpart_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn count_unread(&self, user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages
             WHERE recipient_id = $1 AND is_read = false AND is_active = true",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
