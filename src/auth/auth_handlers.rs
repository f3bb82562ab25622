use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{error::Result, extract::AppJson, middleware::AuthUser, state::AppState, user::UserResponse};
use super::auth_dto::{
    AckResponse, AuthResponse, ChangePasswordRequest, LoginRequest, RefreshResponse,
    RegisterRequest,
};

/// Create a student or alumni account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let response = state.auth_service.register(payload).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account is deactivated")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse> {
    let response = state.auth_service.login(payload).await?;

    Ok((StatusCode::OK, Json(response)))
}

/// Get the authenticated user
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse> {
    let user = state.auth_service.me(user_id).await?;

    Ok((StatusCode::OK, Json(user)))
}

/// Issue a fresh token for the authenticated user
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "auth",
    responses(
        (status = 200, description = "New token", body = RefreshResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse> {
    let token = state.auth_service.refresh(user_id).await?;

    Ok((
        StatusCode::OK,
        Json(RefreshResponse {
            message: "Token refreshed successfully".to_string(),
            token,
        }),
    ))
}

/// Log out. Tokens are stateless, so the client simply discards its token.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logged out", body = AckResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn logout(AuthUser(user_id): AuthUser) -> Result<impl IntoResponse> {
    tracing::debug!(%user_id, "User logged out");

    Ok((
        StatusCode::OK,
        Json(AckResponse {
            message: "Logout successful".to_string(),
        }),
    ))
}

/// Change the authenticated user's password
#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    tag = "auth",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = AckResponse),
        (status = 400, description = "Missing fields, short new password or wrong current password"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse> {
    state.auth_service.change_password(user_id, payload).await?;

    Ok((
        StatusCode::OK,
        Json(AckResponse {
            message: "Password changed successfully".to_string(),
        }),
    ))
}
