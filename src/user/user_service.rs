use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};
use super::user_dto::{FollowResponse, UpdateProfileRequest, UserSearchQuery};
use super::user_models::{User, UserResponse, UserSummary};
use super::user_repository::UserStore;

pub const SEARCH_LIMIT: i64 = 20;
pub const SUGGESTIONS_LIMIT: i64 = 10;

/// Profiles, directory search and the follow graph.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<UserResponse> {
        Ok(UserResponse::from(self.active(user_id).await?))
    }

    pub async fn search(&self, user_id: Uuid, query: &UserSearchQuery) -> Result<Vec<UserResponse>> {
        let needle = query.query.trim();
        if needle.is_empty() {
            return Err(AppError::Validation(
                "Search query must be at least 1 character long".to_string(),
            ));
        }

        let users = self
            .users
            .search(needle, query.role_filter()?, user_id, SEARCH_LIMIT)
            .await?;

        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    pub async fn update_profile(&self, user_id: Uuid, request: UpdateProfileRequest) -> Result<UserResponse> {
        let request = request.normalized();
        request.validate()?;

        let user = self.users.update_profile(user_id, request.into()).await?;
        tracing::info!(user_id = %user.id, "Profile updated");

        Ok(UserResponse::from(user))
    }

    pub async fn toggle_follow(&self, user_id: Uuid, target_id: Uuid) -> Result<FollowResponse> {
        if user_id == target_id {
            return Err(AppError::Validation("You cannot follow yourself".to_string()));
        }
        self.active(target_id).await?;

        let outcome = self.users.toggle_follow(user_id, target_id).await?;
        tracing::debug!(%user_id, %target_id, is_following = outcome.is_following, "Follow toggled");

        let message = if outcome.is_following {
            "User followed successfully"
        } else {
            "User unfollowed successfully"
        };

        Ok(FollowResponse {
            message: message.to_string(),
            is_following: outcome.is_following,
            follower_count: outcome.follower_count,
            following_count: outcome.following_count,
        })
    }

    pub async fn followers(&self, user_id: Uuid) -> Result<Vec<UserSummary>> {
        self.active(user_id).await?;
        let users = self.users.followers(user_id).await?;

        Ok(users.iter().map(UserSummary::from).collect())
    }

    pub async fn following(&self, user_id: Uuid) -> Result<Vec<UserSummary>> {
        self.active(user_id).await?;
        let users = self.users.following(user_id).await?;

        Ok(users.iter().map(UserSummary::from).collect())
    }

    pub async fn suggestions(&self, user_id: Uuid) -> Result<Vec<UserResponse>> {
        let users = self.users.suggestions(user_id, SUGGESTIONS_LIMIT).await?;

        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    async fn active(&self, user_id: Uuid) -> Result<User> {
        self.users
            .find_active(user_id)
            .await?
            .ok_or(AppError::NotFound("User not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::{InMemoryUserStore, NewUser, UserRole};

    struct Fixture {
        service: UserService,
        users: Arc<InMemoryUserStore>,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUserStore::new());
        Fixture {
            service: UserService::new(users.clone()),
            users,
        }
    }

    async fn user(f: &Fixture, name: &str, role: UserRole) -> Uuid {
        f.users
            .create(NewUser {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                password_hash: "hash".to_string(),
                role,
            })
            .await
            .unwrap()
            .id
    }

    fn search(query: &str, role: Option<&str>) -> UserSearchQuery {
        UserSearchQuery {
            query: query.to_string(),
            role: role.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_search_requires_text_and_filters_role() {
        let f = fixture();
        let me = user(&f, "Sam", UserRole::Student).await;
        user(&f, "Samira", UserRole::Alumni).await;
        user(&f, "Samuel", UserRole::Student).await;

        let err = f.service.search(me, &search("   ", None)).await.unwrap_err();
        assert_eq!(err.to_string(), "Search query must be at least 1 character long");

        let all = f.service.search(me, &search(" sam ", Some("all"))).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|u| u.id != me));

        let alumni = f.service.search(me, &search("sam", Some("Alumni"))).await.unwrap();
        assert_eq!(alumni.len(), 1);
        assert_eq!(alumni[0].name, "Samira");
    }

    #[tokio::test]
    async fn test_update_profile_trims_and_validates() {
        let f = fixture();
        let me = user(&f, "Sam", UserRole::Student).await;

        let updated = f
            .service
            .update_profile(
                me,
                UpdateProfileRequest {
                    name: Some("  Sam Smith ".into()),
                    bio: Some(" Rustacean ".into()),
                    profile_picture: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Sam Smith");
        assert_eq!(updated.bio, "Rustacean");

        let err = f
            .service
            .update_profile(
                me,
                UpdateProfileRequest {
                    bio: Some("x".repeat(501)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Bio cannot exceed 500 characters");
        assert_eq!(f.service.profile(me).await.unwrap().bio, "Rustacean");
    }

    #[tokio::test]
    async fn test_follow_rules() {
        let f = fixture();
        let me = user(&f, "Sam", UserRole::Student).await;
        let alum = user(&f, "Alex", UserRole::Alumni).await;

        let err = f.service.toggle_follow(me, me).await.unwrap_err();
        assert_eq!(err.to_string(), "You cannot follow yourself");
        assert!(matches!(
            f.service.toggle_follow(me, Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));

        let followed = f.service.toggle_follow(me, alum).await.unwrap();
        assert_eq!(followed.message, "User followed successfully");
        assert!(followed.is_following);
        assert_eq!(followed.follower_count, 1);
        assert_eq!(f.service.followers(alum).await.unwrap()[0].id, me);
        assert_eq!(f.service.following(me).await.unwrap()[0].id, alum);
        assert!(f.service.suggestions(me).await.unwrap().is_empty());

        let unfollowed = f.service.toggle_follow(me, alum).await.unwrap();
        assert_eq!(unfollowed.message, "User unfollowed successfully");
        assert_eq!(unfollowed.following_count, 0);
        assert_eq!(f.service.suggestions(me).await.unwrap()[0].id, alum);

        f.users.set_active(alum, false).await.unwrap();
        assert!(matches!(f.service.toggle_follow(me, alum).await, Err(AppError::NotFound(_))));
        assert!(matches!(f.service.followers(alum).await, Err(AppError::NotFound(_))));
    }
}
