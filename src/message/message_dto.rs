use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::user::UserSummary;
use super::message_models::{MessageResponse, MessageType};

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub recipient_id: Uuid,
    /// May be empty when an attachment is present
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub message_type: MessageType,
    pub attachment_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Text to look for (at least 2 characters)
    #[serde(default)]
    pub query: String,
    /// Restrict the search to the conversation with this user
    pub user_id: Option<Uuid>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationEntry {
    pub counterpart: UserSummary,
    pub last_message: MessageResponse,
    pub unread_count: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UnreadCountResponse {
    pub unread_count: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MarkConversationReadResponse {
    pub modified_count: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteMessageResponse {
    pub message: String,
}
