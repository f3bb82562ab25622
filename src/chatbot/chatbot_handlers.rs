use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    error::{AppError, Result},
    extract::AppJson,
    middleware::AuthUser,
    state::AppState,
    user::User,
};
use super::chatbot_dto::{ChatRequest, ChatResponse, ChatbotHealthResponse, SuggestionsResponse};

async fn current_user(state: &AppState, user_id: uuid::Uuid) -> Result<User> {
    state
        .users
        .find_active(user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))
}

/// Ask the AI assistant a question
#[utoipa::path(
    post,
    path = "/api/chatbot/chat",
    tag = "chatbot",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatResponse),
        (status = 400, description = "Empty or overlong message"),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "AI service unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn chat(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<ChatRequest>,
) -> Result<impl IntoResponse> {
    let user = current_user(&state, user_id).await?;
    let reply = state.chatbot_service.chat(&user, &payload.message).await?;

    Ok((StatusCode::OK, Json(reply)))
}

/// Suggested questions for the caller's role
#[utoipa::path(
    get,
    path = "/api/chatbot/suggestions",
    tag = "chatbot",
    responses(
        (status = 200, description = "Suggested prompts", body = SuggestionsResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn suggestions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse> {
    let user = current_user(&state, user_id).await?;

    Ok((StatusCode::OK, Json(state.chatbot_service.suggestions(user.role))))
}

/// AI gateway health
#[utoipa::path(
    get,
    path = "/api/chatbot/health",
    tag = "chatbot",
    responses(
        (status = 200, description = "Gateway status", body = ChatbotHealthResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn health(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
) -> Result<impl IntoResponse> {
    Ok((StatusCode::OK, Json(state.chatbot_service.health().await)))
}
