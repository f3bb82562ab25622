use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, Result};
use super::conversation::aggregate_conversations;
use super::message_models::{ConversationSummary, Message, NewMessage};
use super::message_repository::MessageStore;

/// Process-local message store.
///
/// Messages are kept in insertion order. Creation timestamps are made strictly
/// increasing so that ordering by `created_at` matches send order.
#[derive(Default)]
pub struct InMemoryMessageStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    messages: Vec<Message>,
    last_created_at: Option<DateTime<Utc>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored rows, soft-deleted ones included.
    #[cfg(test)]
    pub async fn stored_count(&self) -> usize {
        self.inner.read().await.messages.len()
    }
}

impl Inner {
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let at = match self.last_created_at {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_created_at = Some(at);
        at
    }

    fn get_mut(&mut self, message_id: Uuid) -> Result<&mut Message> {
        self.messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or(AppError::NotFound("Message not found".to_string()))
    }

    fn search_matches<'a>(
        &'a self,
        user_id: Uuid,
        query: &str,
        counterpart_id: Option<Uuid>,
    ) -> Vec<&'a Message> {
        let needle = query.to_lowercase();
        let mut found: Vec<&Message> = self
            .messages
            .iter()
            .filter(|m| m.is_active)
            .filter(|m| match counterpart_id {
                Some(other) => m.is_between(user_id, other),
                None => m.involves(user_id),
            })
            .filter(|m| m.content.to_lowercase().contains(&needle))
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        found
    }
}

fn page<T: Clone>(items: &[T], limit: i64, offset: i64) -> Vec<T> {
    items
        .iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .cloned()
        .collect()
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn insert(&self, new_message: NewMessage) -> Result<Message> {
        let mut inner = self.inner.write().await;
        let now = inner.next_timestamp();
        let message = Message {
            id: Uuid::new_v4(),
            sender_id: new_message.sender_id,
            recipient_id: new_message.recipient_id,
            content: new_message.content,
            message_type: new_message.message_type,
            attachment_url: new_message.attachment_url,
            is_read: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        inner.messages.push(message.clone());
        Ok(message)
    }

    async fn find_by_id(&self, message_id: Uuid) -> Result<Option<Message>> {
        let inner = self.inner.read().await;
        Ok(inner.messages.iter().find(|m| m.id == message_id).cloned())
    }

    async fn find_conversation(
        &self,
        user_id: Uuid,
        other_user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>> {
        let inner = self.inner.read().await;
        let mut conversation: Vec<Message> = inner
            .messages
            .iter()
            .filter(|m| m.is_active && m.is_between(user_id, other_user_id))
            .cloned()
            .collect();
        conversation.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(page(&conversation, limit, offset))
    }

    async fn count_conversation(&self, user_id: Uuid, other_user_id: Uuid) -> Result<i64> {
        let inner = self.inner.read().await;
        Ok(inner
            .messages
            .iter()
            .filter(|m| m.is_active && m.is_between(user_id, other_user_id))
            .count() as i64)
    }

    async fn find_user_conversations(&self, user_id: Uuid) -> Result<Vec<ConversationSummary>> {
        let inner = self.inner.read().await;
        Ok(aggregate_conversations(user_id, &inner.messages))
    }

    async fn mark_as_read(&self, message_id: Uuid) -> Result<Message> {
        let mut inner = self.inner.write().await;
        let message = inner.get_mut(message_id)?;
        if !message.is_active {
            return Err(AppError::NotFound("Message not found".to_string()));
        }
        if !message.is_read {
            message.is_read = true;
            message.updated_at = Utc::now();
        }
        Ok(message.clone())
    }

    async fn mark_conversation_as_read(&self, sender_id: Uuid, recipient_id: Uuid) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let mut changed = 0;
        for message in inner.messages.iter_mut().filter(|m| {
            m.sender_id == sender_id && m.recipient_id == recipient_id && m.is_active && !m.is_read
        }) {
            message.is_read = true;
            message.updated_at = now;
            changed += 1;
        }
        Ok(changed)
    }

    async fn deactivate(&self, message_id: Uuid) -> Result<()> {
        let mut inner = self.inner.write().await;
        let message = inner.get_mut(message_id)?;
        if message.is_active {
            message.is_active = false;
            message.updated_at = Utc::now();
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
        let inner = self.inner.read().await;
        let found: Vec<Message> = inner
            .search_matches(user_id, query, counterpart_id)
            .into_iter()
            .cloned()
            .collect();
        Ok(page(&found, limit, offset))
    }

    async fn count_search(&self, user_id: Uuid, query: &str, counterpart_id: Option<Uuid>) -> Result<i64> {
        let inner = self.inner.read().await;
        Ok(inner.search_matches(user_id, query, counterpart_id).len() as i64)
    }

    async fn count_unread(&self, user_id: Uuid) -> Result<i64> {
        let inner = self.inner.read().await;
        Ok(inner
            .messages
            .iter()
            .filter(|m| m.recipient_id == user_id && !m.is_read && m.is_active)
            .count() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::message_models::MessageType;

    fn text(sender: Uuid, recipient: Uuid, content: &str) -> NewMessage {
        NewMessage::new(sender, recipient, content, MessageType::Text, None).unwrap()
    }

    #[tokio::test]
    async fn test_timestamps_strictly_increase() {
        let store = InMemoryMessageStore::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let mut previous = None;
        for i in 0..50 {
            let m = store.insert(text(a, b, &format!("n{}", i))).await.unwrap();
            if let Some(prev) = previous {
                assert!(m.created_at > prev);
            }
            previous = Some(m.created_at);
        }
    }

    #[tokio::test]
    async fn test_conversation_pagination_is_oldest_first() {
        let store = InMemoryMessageStore::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        for i in 0..5 {
            store.insert(text(a, b, &format!("n{}", i))).await.unwrap();
        }

        let second_page = store.find_conversation(b, a, 2, 2).await.unwrap();
        let contents: Vec<&str> = second_page.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["n2", "n3"]);
        assert_eq!(store.count_conversation(a, b).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_search_is_literal_and_case_insensitive() {
        let store = InMemoryMessageStore::new();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        store.insert(text(a, b, "Interview tips?")).await.unwrap();
        store.insert(text(c, a, "interview at 5")).await.unwrap();
        store.insert(text(b, c, "interview elsewhere")).await.unwrap();
        store.insert(text(a, b, "tips.*")).await.unwrap();

        let found = store.search(a, "INTERVIEW", None, 10, 0).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].content, "interview at 5");

        let only_b = store.search(a, "interview", Some(b), 10, 0).await.unwrap();
        assert_eq!(only_b.len(), 1);

        let literal = store.search(a, ".*", None, 10, 0).await.unwrap();
        assert_eq!(literal.len(), 1);
        assert_eq!(store.count_search(a, "interview", None).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_deactivated_rows_remain_stored() {
        let store = InMemoryMessageStore::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let m = store.insert(text(a, b, "gone soon")).await.unwrap();

        store.deactivate(m.id).await.unwrap();

        assert_eq!(store.stored_count().await, 1);
        assert!(!store.find_by_id(m.id).await.unwrap().unwrap().is_active);
        assert_eq!(store.count_unread(b).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mark_as_read_skips_deleted_and_read_rows() {
        let store = InMemoryMessageStore::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let kept = store.insert(text(a, b, "keep")).await.unwrap();
        let gone = store.insert(text(a, b, "gone")).await.unwrap();
        store.deactivate(gone.id).await.unwrap();

        let err = store.mark_as_read(gone.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(!store.find_by_id(gone.id).await.unwrap().unwrap().is_read);

        let first = store.mark_as_read(kept.id).await.unwrap();
        assert!(first.is_read);
        let again = store.mark_as_read(kept.id).await.unwrap();
        assert_eq!(again.updated_at, first.updated_at);
    }
}
