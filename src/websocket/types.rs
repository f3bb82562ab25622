use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::message::{MessageResponse, MessageType};

/// Events pushed from the server to a connected client.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    Registered(RegisteredPayload),
    /// A new message addressed to this user
    ReceiveMessage(MessageResponse),
    /// Acknowledges a `send_message` issued over this socket
    MessageSent(MessageResponse),
    Error(ErrorPayload),
    Ping,
    Pong,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisteredPayload {
    pub user_id: Uuid,
    pub connection_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

/// Events a client may send.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Register {
        user_id: Uuid,
    },
    SendMessage {
        recipient_id: Uuid,
        #[serde(default)]
        content: String,
        #[serde(default)]
        message_type: MessageType,
        attachment_url: Option<String>,
    },
    MarkRead {
        message_id: Uuid,
    },
    Ping,
}
