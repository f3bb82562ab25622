use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::user::UserRole;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    /// True when the reply did not come from the primary prompt
    pub fallback: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<String>,
    pub user_role: UserRole,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatbotHealthResponse {
    pub status: String,
    pub gemini_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gemini_working: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gemini_error: Option<String>,
    pub timestamp: DateTime<Utc>,
}
