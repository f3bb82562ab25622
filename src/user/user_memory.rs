use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::user_models::{FollowOutcome, NewUser, ProfileUpdate, User, UserRole};
use super::user_repository::UserStore;

/// Process-local identity store for tests and database-less runs.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
    /// Follow edges `(follower, followee, since)` in insertion order.
    follows: RwLock<Vec<(Uuid, Uuid, DateTime<Utc>)>>,
}

fn newest_first(mut users: Vec<User>) -> Vec<User> {
    users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    users
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_active(&self, user_id: Uuid, is_active: bool) -> Result<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        user.is_active = is_active;
        user.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == new_user.email) {
            return Err(AppError::Conflict(
                "User already exists with this email".to_string(),
            ));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: new_user.role,
            profile_picture: String::new(),
            bio: String::new(),
            is_active: true,
            last_login: now,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_ids(&self, user_ids: &[Uuid]) -> Result<Vec<User>> {
        let users = self.users.read().await;
        Ok(user_ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn touch_last_login(&self, user_id: Uuid) -> Result<()> {
        if let Some(user) = self.users.write().await.get_mut(&user_id) {
            user.last_login = Utc::now();
        }
        Ok(())
    }

    async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<User> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(bio) = update.bio {
            user.bio = bio;
        }
        if let Some(profile_picture) = update.profile_picture {
            user.profile_picture = profile_picture;
        }
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> Result<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn search(
        &self,
        query: &str,
        role: Option<UserRole>,
        exclude: Uuid,
        limit: i64,
    ) -> Result<Vec<User>> {
        let needle = query.to_lowercase();
        let users = self.users.read().await;
        let found = users
            .values()
            .filter(|u| u.is_active && u.id != exclude)
            .filter(|u| role.map_or(true, |role| u.role == role))
            .filter(|u| u.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();

        Ok(newest_first(found)
            .into_iter()
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn toggle_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<FollowOutcome> {
        let mut follows = self.follows.write().await;
        let before = follows.len();
        follows.retain(|(from, to, _)| !(*from == follower_id && *to == followee_id));
        let is_following = follows.len() == before;
        if is_following {
            follows.push((follower_id, followee_id, Utc::now()));
        }

        Ok(FollowOutcome {
            is_following,
            follower_count: follows.iter().filter(|(_, to, _)| *to == followee_id).count() as i64,
            following_count: follows.iter().filter(|(from, _, _)| *from == follower_id).count() as i64,
        })
    }

    async fn followers(&self, user_id: Uuid) -> Result<Vec<User>> {
        let follows = self.follows.read().await;
        let users = self.users.read().await;
        Ok(follows
            .iter()
            .rev()
            .filter(|(_, to, _)| *to == user_id)
            .filter_map(|(from, _, _)| users.get(from))
            .filter(|u| u.is_active)
            .cloned()
            .collect())
    }

    async fn following(&self, user_id: Uuid) -> Result<Vec<User>> {
        let follows = self.follows.read().await;
        let users = self.users.read().await;
        Ok(follows
            .iter()
            .rev()
            .filter(|(from, _, _)| *from == user_id)
            .filter_map(|(_, to, _)| users.get(to))
            .filter(|u| u.is_active)
            .cloned()
            .collect())
    }

    async fn suggestions(&self, user_id: Uuid, limit: i64) -> Result<Vec<User>> {
        let follows = self.follows.read().await;
        let users = self.users.read().await;
        let candidates = users
            .values()
            .filter(|u| u.is_active && u.id != user_id)
            .filter(|u| !follows.iter().any(|(from, to, _)| *from == user_id && *to == u.id))
            .cloned()
            .collect();

        Ok(newest_first(candidates)
            .into_iter()
            .take(limit.max(0) as usize)
            .collect())
    }
}
