use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    error::Result,
    extract::{AppJson, AppQuery},
    middleware::{parse_id, AuthUser},
    pagination::{MessagePage, PageQuery, Pagination},
    state::AppState,
};
use super::{
    message_dto::{
        ConversationEntry, DeleteMessageResponse, MarkConversationReadResponse, SearchQuery,
        SendMessageRequest, UnreadCountResponse,
    },
    message_models::MessageResponse,
    message_service::{
        CONVERSATION_DEFAULT_LIMIT, CONVERSATION_MAX_LIMIT, SEARCH_DEFAULT_LIMIT, SEARCH_MAX_LIMIT,
    },
};

/// Send a message to another user
#[utoipa::path(
    post,
    path = "/api/messages",
    tag = "messages",
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message sent successfully", body = MessageResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Recipient not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<SendMessageRequest>,
) -> Result<impl IntoResponse> {
    let message = state.message_service.send(user_id, payload).await?;

    Ok((StatusCode::CREATED, Json(MessageResponse::from(message))))
}

/// Get the conversation with a specific user and mark it read
#[utoipa::path(
    get,
    path = "/api/messages/conversation/{user_id}",
    tag = "messages",
    params(
        ("user_id" = Uuid, Path, description = "Other participant"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Paginated conversation, oldest first", body = MessagePage),
        (status = 400, description = "Invalid pagination or user ID"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_conversation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(other_user_id): Path<String>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<impl IntoResponse> {
    let other_user_id = parse_id(&other_user_id, "user")?;
    let pagination = Pagination::resolve(
        query.page,
        query.limit,
        CONVERSATION_DEFAULT_LIMIT,
        CONVERSATION_MAX_LIMIT,
    )?;

    let page = state
        .message_service
        .get_conversation(user_id, other_user_id, pagination)
        .await?;

    // Opening a conversation reads it.
    if let Err(e) = state
        .message_service
        .mark_conversation_read(other_user_id, user_id)
        .await
    {
        tracing::warn!(%user_id, %other_user_id, "Failed to mark conversation read: {}", e);
    }

    Ok((StatusCode::OK, Json(page.map(MessageResponse::from))))
}

/// List the authenticated user's conversations
#[utoipa::path(
    get,
    path = "/api/messages/conversations",
    tag = "messages",
    responses(
        (status = 200, description = "Conversations, most recent first", body = Vec<ConversationEntry>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_conversations(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse> {
    let conversations = state.message_service.list_conversations(user_id).await?;

    Ok((StatusCode::OK, Json(conversations)))
}

/// Mark a message as read
#[utoipa::path(
    put,
    path = "/api/messages/{id}/read",
    tag = "messages",
    params(
        ("id" = Uuid, Path, description = "Message ID")
    ),
    responses(
        (status = 200, description = "Message marked as read", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the recipient"),
        (status = 404, description = "Message not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn mark_message_read(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(message_id): Path<String>,
) -> Result<impl IntoResponse> {
    let message_id = parse_id(&message_id, "message")?;
    let message = state.message_service.mark_read(message_id, user_id).await?;

    Ok((StatusCode::OK, Json(MessageResponse::from(message))))
}

/// Mark every message from a user as read
#[utoipa::path(
    put,
    path = "/api/messages/conversation/{user_id}/read",
    tag = "messages",
    params(
        ("user_id" = Uuid, Path, description = "Other participant")
    ),
    responses(
        (status = 200, description = "Number of messages marked read", body = MarkConversationReadResponse),
        (status = 400, description = "Invalid user ID"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn mark_conversation_read(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(other_user_id): Path<String>,
) -> Result<impl IntoResponse> {
    let other_user_id = parse_id(&other_user_id, "user")?;
    let modified_count = state
        .message_service
        .mark_conversation_read(other_user_id, user_id)
        .await?;

    Ok((StatusCode::OK, Json(MarkConversationReadResponse { modified_count })))
}

/// Delete a message you sent
#[utoipa::path(
    delete,
    path = "/api/messages/{id}",
    tag = "messages",
    params(
        ("id" = Uuid, Path, description = "Message ID")
    ),
    responses(
        (status = 200, description = "Message deleted", body = DeleteMessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the sender"),
        (status = 404, description = "Message not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_message(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(message_id): Path<String>,
) -> Result<impl IntoResponse> {
    let message_id = parse_id(&message_id, "message")?;
    state.message_service.soft_delete(message_id, user_id).await?;

    Ok((
        StatusCode::OK,
        Json(DeleteMessageResponse {
            message: "Message deleted successfully".to_string(),
        }),
    ))
}

/// Search messages
#[utoipa::path(
    get,
    path = "/api/messages/search",
    tag = "messages",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching messages, newest first", body = MessagePage),
        (status = 400, description = "Query too short or bad pagination"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn search_messages(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppQuery(query): AppQuery<SearchQuery>,
) -> Result<impl IntoResponse> {
    let pagination =
        Pagination::resolve(query.page, query.limit, SEARCH_DEFAULT_LIMIT, SEARCH_MAX_LIMIT)?;

    let page = state
        .message_service
        .search(user_id, &query.query, query.user_id, pagination)
        .await?;

    Ok((StatusCode::OK, Json(page.map(MessageResponse::from))))
}

/// Count unread messages
#[utoipa::path(
    get,
    path = "/api/messages/unread-count",
    tag = "messages",
    responses(
        (status = 200, description = "Unread message count", body = UnreadCountResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn unread_count(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse> {
    let unread_count = state.message_service.unread_count(user_id).await?;

    Ok((StatusCode::OK, Json(UnreadCountResponse { unread_count })))
}
