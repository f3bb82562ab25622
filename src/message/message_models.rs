use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, Result};

pub const MAX_CONTENT_CHARS: usize = 1000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Text,
    Image,
    File,
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageType::Text => write!(f, "text"),
            MessageType::Image => write!(f, "image"),
            MessageType::File => write!(f, "file"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub content: String,
    pub message_type: MessageType,
    pub attachment_url: Option<String>,
    pub is_read: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    /// True if the message was exchanged between `a` and `b`, in either direction.
    pub fn is_between(&self, a: Uuid, b: Uuid) -> bool {
        (self.sender_id == a && self.recipient_id == b)
            || (self.sender_id == b && self.recipient_id == a)
    }

    pub fn involves(&self, user_id: Uuid) -> bool {
        self.sender_id == user_id || self.recipient_id == user_id
    }

    /// The other participant, seen from `user_id`.
    pub fn counterpart_of(&self, user_id: Uuid) -> Uuid {
        if self.sender_id == user_id {
            self.recipient_id
        } else {
            self.sender_id
        }
    }

    pub fn conversation_id(&self) -> String {
        conversation_id(self.sender_id, self.recipient_id)
    }
}

/// Order-independent identifier for the conversation between two users.
pub fn conversation_id(a: Uuid, b: Uuid) -> String {
    let (first, second) = if a.to_string() <= b.to_string() { (a, b) } else { (b, a) };
    format!("{}_{}", first, second)
}

/// A message that passed validation and is ready to be stored.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub content: String,
    pub message_type: MessageType,
    pub attachment_url: Option<String>,
}

impl NewMessage {
    pub fn new(
        sender_id: Uuid,
        recipient_id: Uuid,
        content: &str,
        message_type: MessageType,
        attachment_url: Option<&str>,
    ) -> Result<Self> {
        if sender_id == recipient_id {
            return Err(AppError::Validation(
                "Cannot send message to yourself".to_string(),
            ));
        }

        let content = content.trim();
        let attachment_url = attachment_url
            .map(str::trim)
            .filter(|url| !url.is_empty());

        if content.is_empty() && attachment_url.is_none() {
            return Err(AppError::Validation(
                "Message content cannot be empty if no attachment".to_string(),
            ));
        }

        if content.chars().count() > MAX_CONTENT_CHARS {
            return Err(AppError::Validation(format!(
                "Message cannot exceed {} characters",
                MAX_CONTENT_CHARS
            )));
        }

        if let Some(url) = attachment_url {
            if !is_http_url(url) {
                return Err(AppError::Validation(
                    "Attachment must be a valid URL".to_string(),
                ));
            }
        }

        Ok(Self {
            sender_id,
            recipient_id,
            content: content.to_string(),
            message_type,
            attachment_url: attachment_url.map(str::to_string),
        })
    }
}

fn is_http_url(url: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        url.len() > scheme.len()
            && url
                .get(..scheme.len())
                .map_or(false, |prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub id: Uuid,
    pub conversation_id: String,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub content: String,
    pub message_type: MessageType,
    pub attachment_url: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            conversation_id: message.conversation_id(),
            id: message.id,
            sender_id: message.sender_id,
            recipient_id: message.recipient_id,
            content: message.content,
            message_type: message.message_type,
            attachment_url: message.attachment_url,
            is_read: message.is_read,
            created_at: message.created_at,
            updated_at: message.updated_at,
        }
    }
}

/// One row of a user's conversation list, before the counterpart is resolved.
#[derive(Debug, Clone)]
pub struct ConversationSummary {
    pub counterpart_id: Uuid,
    pub last_message: Message,
    pub unread_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_send_rejected_regardless_of_content() {
        let user = Uuid::new_v4();
        for content in ["hello", "", "   "] {
            let err = NewMessage::new(user, user, content, MessageType::Text, None).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }

    #[test]
    fn test_content_is_trimmed_and_bounded() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let msg = NewMessage::new(a, b, "  hello  ", MessageType::Text, None).unwrap();
        assert_eq!(msg.content, "hello");

        let exactly_max = "é".repeat(MAX_CONTENT_CHARS);
        assert!(NewMessage::new(a, b, &exactly_max, MessageType::Text, None).is_ok());

        let too_long = "a".repeat(MAX_CONTENT_CHARS + 1);
        let err = NewMessage::new(a, b, &too_long, MessageType::Text, None).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_empty_content_needs_attachment() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let msg = NewMessage::new(a, b, "", MessageType::Image, Some("https://x/y.png")).unwrap();
        assert_eq!(msg.attachment_url.as_deref(), Some("https://x/y.png"));
        assert_eq!(msg.content, "");

        let err = NewMessage::new(a, b, "", MessageType::Text, None).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = NewMessage::new(a, b, "", MessageType::File, Some("  ")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_attachment_must_be_http_url() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let err = NewMessage::new(a, b, "", MessageType::File, Some("ftp://x/y.pdf")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(NewMessage::new(a, b, "", MessageType::File, Some("HTTP://x/y.pdf")).is_ok());
    }

    #[test]
    fn test_conversation_id_is_order_independent() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(conversation_id(a, b), conversation_id(b, a));
        assert!(conversation_id(a, b).contains(&a.to_string()));
        assert!(conversation_id(a, b).contains('_'));
    }

    #[test]
    fn test_message_type_display() {
        assert_eq!(MessageType::Text.to_string(), "text");
        assert_eq!(MessageType::Image.to_string(), "image");
        assert_eq!(MessageType::File.to_string(), "file");
        assert_eq!(MessageType::default(), MessageType::Text);
    }
}
