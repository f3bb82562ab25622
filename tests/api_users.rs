mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{app, call, register};

#[tokio::test]
async fn test_search_profile_and_follow_flow() {
    let app = app();
    let (sam_token, sam_id) = register(&app, "Sam", "Student").await;
    let (_, samira_id) = register(&app, "Samira", "Alumni").await;

    let (status, found) = call(&app, Method::GET, "/api/users/search?query=SAM&role=all", Some(&sam_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["id"], samira_id.as_str());

    let (status, body) = call(&app, Method::GET, "/api/users/search?query=%20", Some(&sam_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Search query must be at least 1 character long");

    let (status, updated) = call(
        &app,
        Method::PUT,
        "/api/users/profile",
        Some(&sam_token),
        Some(json!({ "bio": "  Learning Rust  " })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert_eq!(updated["message"], "Profile updated successfully");
    assert_eq!(updated["user"]["bio"], "Learning Rust");

    let uri = format!("/api/users/{}/follow", samira_id);
    let (status, followed) = call(&app, Method::POST, &uri, Some(&sam_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(followed["is_following"], true);
    assert_eq!(followed["follower_count"], 1);
    assert_eq!(followed["following_count"], 1);

    let uri = format!("/api/users/{}/followers", samira_id);
    let (status, followers) = call(&app, Method::GET, &uri, Some(&sam_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(followers[0]["id"], sam_id.as_str());

    let (_, suggestions) = call(&app, Method::GET, "/api/users/suggestions", Some(&sam_token), None).await;
    assert_eq!(suggestions, json!([]));

    let uri = format!("/api/users/{}/follow", sam_id);
    let (status, body) = call(&app, Method::POST, &uri, Some(&sam_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You cannot follow yourself");
}

#[tokio::test]
async fn test_refresh_logout_and_change_password() {
    let app = app();
    let (token, user_id) = register(&app, "Lin", "Alumni").await;

    let (status, refreshed) = call(&app, Method::POST, "/api/auth/refresh", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refreshed["message"], "Token refreshed successfully");
    let new_token = refreshed["token"].as_str().unwrap().to_string();
    let (_, me) = call(&app, Method::GET, "/api/auth/me", Some(&new_token), None).await;
    assert_eq!(me["id"], user_id.as_str());

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/change-password",
        Some(&token),
        Some(json!({ "current_password": "wrong", "new_password": "another1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Current password is incorrect");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/change-password",
        Some(&token),
        Some(json!({ "current_password": "secret123", "new_password": "another1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password changed successfully");

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "lin@example.com", "password": "another1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, Method::POST, "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logout successful");
}

#[tokio::test]
async fn test_padded_registration_email_is_accepted() {
    let app = app();

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "name": "  Ivy ",
            "email": "  Ivy@Example.com ",
            "password": "secret123",
            "role": "Student",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["user"]["email"], "ivy@example.com");
    assert_eq!(body["user"]["name"], "Ivy");
}
