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
    state::AppState,
};
use super::user_dto::{FollowResponse, ProfileUpdatedResponse, UpdateProfileRequest, UserSearchQuery};
use super::user_models::{UserResponse, UserSummary};

/// Get a user's public profile
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile retrieved successfully", body = UserResponse),
        (status = 400, description = "Invalid user ID format"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let user_id = parse_id(&id, "user")?;
    let user = state.user_service.profile(user_id).await?;

    Ok((StatusCode::OK, Json(user)))
}

/// Search active users by name
#[utoipa::path(
    get,
    path = "/api/users/search",
    tag = "users",
    params(UserSearchQuery),
    responses(
        (status = 200, description = "Matching users, newest first", body = Vec<UserResponse>),
        (status = 400, description = "Empty query or unknown role"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn search_users(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppQuery(query): AppQuery<UserSearchQuery>,
) -> Result<impl IntoResponse> {
    let users = state.user_service.search(user_id, &query).await?;

    Ok((StatusCode::OK, Json(users)))
}

/// Update the authenticated user's profile
#[utoipa::path(
    put,
    path = "/api/users/profile",
    tag = "users",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileUpdatedResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse> {
    let user = state.user_service.update_profile(user_id, payload).await?;

    Ok((
        StatusCode::OK,
        Json(ProfileUpdatedResponse {
            message: "Profile updated successfully".to_string(),
            user,
        }),
    ))
}

/// Follow a user, or unfollow when already following
#[utoipa::path(
    post,
    path = "/api/users/{id}/follow",
    tag = "users",
    params(
        ("id" = Uuid, Path, description = "User to follow or unfollow")
    ),
    responses(
        (status = 200, description = "Follow state toggled", body = FollowResponse),
        (status = 400, description = "Invalid ID or self-follow"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn toggle_follow(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let target_id = parse_id(&id, "user")?;
    let response = state.user_service.toggle_follow(user_id, target_id).await?;

    Ok((StatusCode::OK, Json(response)))
}

/// List a user's followers
#[utoipa::path(
    get,
    path = "/api/users/{id}/followers",
    tag = "users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Followers, most recent first", body = Vec<UserSummary>),
        (status = 400, description = "Invalid user ID format"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_followers(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let user_id = parse_id(&id, "user")?;
    let users = state.user_service.followers(user_id).await?;

    Ok((StatusCode::OK, Json(users)))
}

/// List the users a user follows
#[utoipa::path(
    get,
    path = "/api/users/{id}/following",
    tag = "users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Followed users, most recent first", body = Vec<UserSummary>),
        (status = 400, description = "Invalid user ID format"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_following(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let user_id = parse_id(&id, "user")?;
    let users = state.user_service.following(user_id).await?;

    Ok((StatusCode::OK, Json(users)))
}

/// People to follow
#[utoipa::path(
    get,
    path = "/api/users/suggestions",
    tag = "users",
    responses(
        (status = 200, description = "Active users not yet followed", body = Vec<UserResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_suggestions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse> {
    let users = state.user_service.suggestions(user_id).await?;

    Ok((StatusCode::OK, Json(users)))
}
