use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::pagination::{PaginatedResponse, Pagination};
use crate::user::{UserStore, UserSummary};
use crate::websocket::DeliveryRelay;

use super::message_dto::{ConversationEntry, SendMessageRequest};
use super::message_models::{Message, MessageResponse, NewMessage};
use super::message_repository::MessageStore;

pub const CONVERSATION_DEFAULT_LIMIT: u32 = 50;
pub const CONVERSATION_MAX_LIMIT: u32 = 100;
pub const SEARCH_DEFAULT_LIMIT: u32 = 20;
pub const SEARCH_MAX_LIMIT: u32 = 50;
pub const SEARCH_MIN_QUERY_CHARS: usize = 2;

#[derive(Clone)]
pub struct MessageService {
    messages: Arc<dyn MessageStore>,
    users: Arc<dyn UserStore>,
    relay: DeliveryRelay,
}

impl MessageService {
    pub fn new(messages: Arc<dyn MessageStore>, users: Arc<dyn UserStore>, relay: DeliveryRelay) -> Self {
        Self {
            messages,
            users,
            relay,
        }
    }

    /// Validates, stores and then relays a message to its recipient.
    pub async fn send(&self, sender_id: Uuid, request: SendMessageRequest) -> Result<Message> {
        let new_message = NewMessage::new(
            sender_id,
            request.recipient_id,
            &request.content,
            request.message_type,
            request.attachment_url.as_deref(),
        )?;

        self.users
            .find_active(new_message.recipient_id)
            .await?
            .ok_or(AppError::NotFound("Recipient not found".to_string()))?;

        let message = self.messages.insert(new_message).await?;
        tracing::info!(
            message_id = %message.id,
            %sender_id,
            recipient_id = %message.recipient_id,
            "Message stored"
        );

        self.relay.deliver(&message);

        Ok(message)
    }

    pub async fn get_conversation(
        &self,
        user_id: Uuid,
        other_user_id: Uuid,
        pagination: Pagination,
    ) -> Result<PaginatedResponse<Message>> {
        self.ensure_counterpart(user_id, other_user_id).await?;

        let messages = self
            .messages
            .find_conversation(user_id, other_user_id, pagination.limit(), pagination.offset())
            .await?;
        let total = self.messages.count_conversation(user_id, other_user_id).await?;

        Ok(PaginatedResponse::new(messages, total, pagination))
    }

    /// One entry per counterpart, newest conversation first.
    ///
    /// Deactivated counterparts keep their entry; only ids that no longer
    /// resolve to a user are left out.
    pub async fn list_conversations(&self, user_id: Uuid) -> Result<Vec<ConversationEntry>> {
        let summaries = self.messages.find_user_conversations(user_id).await?;
        if summaries.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = summaries.iter().map(|s| s.counterpart_id).collect();
        let counterparts: HashMap<Uuid, UserSummary> = self
            .users
            .find_by_ids(&ids)
            .await?
            .iter()
            .map(|user| (user.id, UserSummary::from(user)))
            .collect();

        let entries = summaries
            .into_iter()
            .filter_map(|summary| {
                let counterpart = counterparts.get(&summary.counterpart_id)?.clone();
                Some(ConversationEntry {
                    counterpart,
                    last_message: MessageResponse::from(summary.last_message),
                    unread_count: summary.unread_count,
                })
            })
            .collect();

        Ok(entries)
    }

    /// Marks a single message read. Only its recipient may do so.
    pub async fn mark_read(&self, message_id: Uuid, requestor_id: Uuid) -> Result<Message> {
        let message = self
            .messages
            .find_by_id(message_id)
            .await?
            .filter(|m| m.is_active)
            .ok_or(AppError::NotFound("Message not found".to_string()))?;

        if message.recipient_id != requestor_id {
            return Err(AppError::Forbidden(
                "Not authorized to mark this message as read".to_string(),
            ));
        }

        if message.is_read {
            return Ok(message);
        }

        self.messages.mark_as_read(message_id).await
    }

    /// Marks every unread message from `other_user_id` to `user_id` as read.
    pub async fn mark_conversation_read(&self, other_user_id: Uuid, user_id: Uuid) -> Result<u64> {
        if other_user_id == user_id {
            return Err(AppError::Validation(
                "Cannot mark a conversation with yourself".to_string(),
            ));
        }

        let modified = self
            .messages
            .mark_conversation_as_read(other_user_id, user_id)
            .await?;

        if modified > 0 {
            tracing::debug!(%user_id, %other_user_id, modified, "Conversation marked as read");
        }

        Ok(modified)
    }

    /// Tombstones a message. Only its sender may do so; repeating it is harmless.
    pub async fn soft_delete(&self, message_id: Uuid, requestor_id: Uuid) -> Result<()> {
        let message = self
            .messages
            .find_by_id(message_id)
            .await?
            .ok_or(AppError::NotFound("Message not found".to_string()))?;

        if message.sender_id != requestor_id {
            if !message.is_active {
                return Err(AppError::NotFound("Message not found".to_string()));
            }
            return Err(AppError::Forbidden(
                "Not authorized to delete this message".to_string(),
            ));
        }

        if !message.is_active {
            return Ok(());
        }

        self.messages.deactivate(message_id).await?;
        tracing::info!(%message_id, sender_id = %requestor_id, "Message deleted");

        Ok(())
    }

    pub async fn search(
        &self,
        user_id: Uuid,
        query: &str,
        counterpart_id: Option<Uuid>,
        pagination: Pagination,
    ) -> Result<PaginatedResponse<Message>> {
        let query = query.trim();
        if query.chars().count() < SEARCH_MIN_QUERY_CHARS {
            return Err(AppError::Validation(format!(
                "Search query must be at least {} characters",
                SEARCH_MIN_QUERY_CHARS
            )));
        }

        let messages = self
            .messages
            .search(user_id, query, counterpart_id, pagination.limit(), pagination.offset())
            .await?;
        let total = self.messages.count_search(user_id, query, counterpart_id).await?;

        Ok(PaginatedResponse::new(messages, total, pagination))
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        self.messages.count_unread(user_id).await
    }

    async fn ensure_counterpart(&self, user_id: Uuid, other_user_id: Uuid) -> Result<()> {
        if user_id == other_user_id {
            return Err(AppError::Validation(
                "Cannot open a conversation with yourself".to_string(),
            ));
        }

        // History stays readable after the counterpart is deactivated.
        self.users
            .find_by_id(other_user_id)
            .await?
            .ok_or(AppError::NotFound("User not found".to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{InMemoryMessageStore, MessageType};
    use crate::user::{InMemoryUserStore, NewUser, UserRole};
    use crate::websocket::{ConnectionRegistry, WsMessage};
    use tokio::sync::mpsc;

    struct Fixture {
        service: MessageService,
        users: Arc<InMemoryUserStore>,
        registry: ConnectionRegistry,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUserStore::new());
        let registry = ConnectionRegistry::new();
        let service = MessageService::new(
            Arc::new(InMemoryMessageStore::new()),
            users.clone(),
            DeliveryRelay::new(registry.clone()),
        );
        Fixture {
            service,
            users,
            registry,
        }
    }

    async fn user(f: &Fixture, name: &str) -> Uuid {
        f.users
            .create(NewUser {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                password_hash: "hash".to_string(),
                role: UserRole::Student,
            })
            .await
            .unwrap()
            .id
    }

    fn text(to: Uuid, content: &str) -> SendMessageRequest {
        SendMessageRequest {
            recipient_id: to,
            content: content.to_string(),
            message_type: MessageType::Text,
            attachment_url: None,
        }
    }

    fn first_page(limit: u32) -> Pagination {
        Pagination { page: 1, limit }
    }

    #[tokio::test]
    async fn test_send_stores_unread_active_message() {
        let f = fixture();
        let (a, b) = (user(&f, "Ada").await, user(&f, "Bob").await);

        let m = f.service.send(a, text(b, "  hello  ")).await.unwrap();

        assert_eq!(m.content, "hello");
        assert!(!m.is_read);
        assert!(m.is_active);
        assert_eq!(m.sender_id, a);
        assert_eq!(m.recipient_id, b);
    }

    #[tokio::test]
    async fn test_self_send_fails_before_recipient_lookup() {
        let f = fixture();
        let ghost = Uuid::new_v4();

        let err = f.service.send(ghost, text(ghost, "hi")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_send_to_unknown_or_inactive_recipient_is_not_found() {
        let f = fixture();
        let (a, b) = (user(&f, "Ada").await, user(&f, "Bob").await);

        let err = f.service.send(a, text(Uuid::new_v4(), "hi")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        f.users.set_active(b, false).await.unwrap();
        let err = f.service.send(a, text(b, "hi")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_attachment_only_send_accepted_and_empty_rejected() {
        let f = fixture();
        let (a, b) = (user(&f, "Ada").await, user(&f, "Bob").await);

        let mut req = text(b, "");
        req.message_type = MessageType::Image;
        req.attachment_url = Some("http://localhost:5000/uploads/file-1-2.png".to_string());
        assert!(f.service.send(a, req).await.is_ok());

        let err = f.service.send(a, text(b, "   ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_conversation_is_symmetric_and_ascending() {
        let f = fixture();
        let (a, b) = (user(&f, "Ada").await, user(&f, "Bob").await);
        f.service.send(a, text(b, "one")).await.unwrap();
        f.service.send(b, text(a, "two")).await.unwrap();
        f.service.send(a, text(b, "three")).await.unwrap();

        let from_a = f.service.get_conversation(a, b, first_page(50)).await.unwrap();
        let from_b = f.service.get_conversation(b, a, first_page(50)).await.unwrap();

        let ids = |p: &PaginatedResponse<Message>| p.data.iter().map(|m| m.id).collect::<Vec<_>>();
        assert_eq!(ids(&from_a), ids(&from_b));
        let contents: Vec<&str> = from_a.data.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
        assert!(from_a.data.windows(2).all(|w| w[0].created_at < w[1].created_at));
        assert_eq!(from_a.total, 3);
    }

    #[tokio::test]
    async fn test_conversation_rejects_self_and_unknown_counterpart() {
        let f = fixture();
        let a = user(&f, "Ada").await;

        let err = f.service.get_conversation(a, a, first_page(50)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = f
            .service
            .get_conversation(a, Uuid::new_v4(), first_page(50))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_mark_read_is_idempotent_and_recipient_only() {
        let f = fixture();
        let (a, b) = (user(&f, "Ada").await, user(&f, "Bob").await);
        let m = f.service.send(a, text(b, "hello")).await.unwrap();

        let err = f.service.mark_read(m.id, a).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let first = f.service.mark_read(m.id, b).await.unwrap();
        let second = f.service.mark_read(m.id, b).await.unwrap();
        assert!(first.is_read && second.is_read);
        assert_eq!(first.updated_at, second.updated_at);

        let err = f.service.mark_read(Uuid::new_v4(), b).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unread_count_round_trip() {
        let f = fixture();
        let (a, b) = (user(&f, "Ada").await, user(&f, "Bob").await);

        f.service.send(a, text(b, "hello")).await.unwrap();
        assert_eq!(f.service.unread_count(b).await.unwrap(), 1);
        assert_eq!(f.service.unread_count(a).await.unwrap(), 0);

        assert_eq!(f.service.mark_conversation_read(a, b).await.unwrap(), 1);
        assert_eq!(f.service.unread_count(b).await.unwrap(), 0);
        assert_eq!(f.service.mark_conversation_read(a, b).await.unwrap(), 0);

        let err = f.service.mark_conversation_read(b, b).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_soft_deleted_messages_disappear_everywhere() {
        let f = fixture();
        let (a, b) = (user(&f, "Ada").await, user(&f, "Bob").await);
        let keep = f.service.send(a, text(b, "keep this note")).await.unwrap();
        let gone = f.service.send(a, text(b, "delete this note")).await.unwrap();

        let err = f.service.soft_delete(gone.id, b).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        f.service.soft_delete(gone.id, a).await.unwrap();
        f.service.soft_delete(gone.id, a).await.unwrap();

        let err = f.service.soft_delete(gone.id, b).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let conversation = f.service.get_conversation(b, a, first_page(50)).await.unwrap();
        assert_eq!(conversation.data.len(), 1);
        assert_eq!(conversation.data[0].id, keep.id);

        let found = f.service.search(b, "note", None, first_page(20)).await.unwrap();
        assert_eq!(found.total, 1);
        assert_eq!(f.service.unread_count(b).await.unwrap(), 1);

        let err = f.service.mark_read(gone.id, b).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_conversations_orders_and_counts() {
        let f = fixture();
        let (a, b, c) = (
            user(&f, "Ada").await,
            user(&f, "Bob").await,
            user(&f, "Cy").await,
        );
        f.service.send(b, text(a, "from bob")).await.unwrap();
        f.service.send(c, text(a, "from cy 1")).await.unwrap();
        f.service.send(c, text(a, "from cy 2")).await.unwrap();

        let entries = f.service.list_conversations(a).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].counterpart.id, c);
        assert_eq!(entries[0].unread_count, 2);
        assert_eq!(entries[0].last_message.content, "from cy 2");
        assert_eq!(entries[1].counterpart.id, b);
        assert_eq!(entries[1].unread_count, 1);

        f.service.send(a, text(b, "reply")).await.unwrap();
        let entries = f.service.list_conversations(a).await.unwrap();
        assert_eq!(entries[0].counterpart.id, b);
        assert_eq!(entries[0].unread_count, 1);

        f.users.set_active(c, false).await.unwrap();
        let entries = f.service.list_conversations(a).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].counterpart.id, c);
        assert_eq!(entries[1].unread_count, 2);
    }

    #[tokio::test]
    async fn test_deactivated_sender_stays_visible_to_recipient() {
        let f = fixture();
        let (a, c) = (user(&f, "Ada").await, user(&f, "Cy").await);
        f.service.send(c, text(a, "hi")).await.unwrap();
        f.users.set_active(c, false).await.unwrap();

        let entries = f.service.list_conversations(a).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].counterpart.id, c);
        assert_eq!(entries[0].unread_count, 1);
        assert_eq!(f.service.unread_count(a).await.unwrap(), 1);

        let page = f.service.get_conversation(a, c, first_page(50)).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].content, "hi");

        let err = f.service.send(a, text(c, "still there?")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_search_requires_two_characters() {
        let f = fixture();
        let a = user(&f, "Ada").await;

        for query in ["", " a ", "é"] {
            let err = f.service.search(a, query, None, first_page(20)).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert!(f.service.search(a, "ab", None, first_page(20)).await.is_ok());
    }

    #[tokio::test]
    async fn test_registered_recipient_receives_push() {
        let f = fixture();
        let (a, b) = (user(&f, "Ada").await, user(&f, "Bob").await);
        let (tx, mut rx) = mpsc::unbounded_channel();
        f.registry.register(a, tx);

        let sent = f.service.send(b, text(a, "ping you")).await.unwrap();

        match rx.try_recv() {
            Ok(WsMessage::ReceiveMessage(payload)) => {
                assert_eq!(payload.id, sent.id);
                assert_eq!(payload.content, "ping you");
            }
            other => panic!("expected receive_message, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_absent_recipient_does_not_block_send() {
        let f = fixture();
        let (a, b) = (user(&f, "Ada").await, user(&f, "Bob").await);

        let (tx, rx) = mpsc::unbounded_channel();
        f.registry.register(a, tx);
        drop(rx);

        assert!(f.service.send(b, text(a, "later")).await.is_ok());
        let conversation = f.service.get_conversation(a, b, first_page(50)).await.unwrap();
        assert_eq!(conversation.data.len(), 1);
    }
}
