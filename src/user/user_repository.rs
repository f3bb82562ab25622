use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;
use crate::message::message_repository::like_pattern;
use super::user_models::{FollowOutcome, NewUser, ProfileUpdate, User, UserRole};

/// Identity store. Owns user records; other modules only hold user ids.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, new_user: NewUser) -> Result<User>;

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Users with the given ids, in no particular order. Unknown ids are skipped.
    async fn find_by_ids(&self, user_ids: &[Uuid]) -> Result<Vec<User>>;

    async fn touch_last_login(&self, user_id: Uuid) -> Result<()>;

    async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<User>;

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> Result<()>;

    /// Active users whose name contains `query` (case-insensitive, literal),
    /// newest first, without `exclude`.
    async fn search(
        &self,
        query: &str,
        role: Option<UserRole>,
        exclude: Uuid,
        limit: i64,
    ) -> Result<Vec<User>>;

    /// Adds the edge `follower -> followee` or removes it when present.
    async fn toggle_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<FollowOutcome>;

    /// Active users following `user_id`, most recent follow first.
    async fn followers(&self, user_id: Uuid) -> Result<Vec<User>>;

    /// Active users `user_id` follows, most recent follow first.
    async fn following(&self, user_id: Uuid) -> Result<Vec<User>>;

    /// Active users `user_id` does not follow yet, newest first.
    async fn suggestions(&self, user_id: Uuid, limit: i64) -> Result<Vec<User>>;

    /// Resolves a user that may take part in messaging: exists and is active.
    async fn find_active(&self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self.find_by_id(user_id).await?.filter(|u| u.is_active))
    }
}

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING *"
        )
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("User already exists with this email".to_string())
            }
            other => AppError::Database(other),
        })?;

        Ok(user)
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_ids(&self, user_ids: &[Uuid]) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ANY($1)")
            .bind(user_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn touch_last_login(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users
             SET name = COALESCE($2, name),
                 bio = COALESCE($3, bio),
                 profile_picture = COALESCE($4, profile_picture),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(user_id)
        .bind(update.name)
        .bind(update.bio)
        .bind(update.profile_picture)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

        Ok(user)
    }

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        Ok(())
    }

    async fn search(
        &self,
        query: &str,
        role: Option<UserRole>,
        exclude: Uuid,
        limit: i64,
    ) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users
             WHERE is_active = true
               AND name ILIKE $1 ESCAPE '\\'
               AND ($2::text IS NULL OR role = $2)
               AND id <> $3
             ORDER BY created_at DESC
             LIMIT $4",
        )
        .bind(like_pattern(query))
        .bind(role)
        .bind(exclude)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn toggle_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<FollowOutcome> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2")
            .bind(follower_id)
            .bind(followee_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed == 0 {
            sqlx::query("INSERT INTO follows (follower_id, followee_id) VALUES ($1, $2)")
                .bind(follower_id)
                .bind(followee_id)
                .execute(&mut *tx)
                .await?;
        }

        let (follower_count, following_count): (i64, i64) = sqlx::query_as(
            "SELECT
                (SELECT COUNT(*) FROM follows WHERE followee_id = $2),
                (SELECT COUNT(*) FROM follows WHERE follower_id = $1)",
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(FollowOutcome {
            is_following: removed == 0,
            follower_count,
            following_count,
        })
    }

    async fn followers(&self, user_id: Uuid) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT u.* FROM follows f
             JOIN users u ON u.id = f.follower_id
             WHERE f.followee_id = $1 AND u.is_active = true
             ORDER BY f.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn following(&self, user_id: Uuid) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT u.* FROM follows f
             JOIN users u ON u.id = f.followee_id
             WHERE f.follower_id = $1 AND u.is_active = true
             ORDER BY f.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn suggestions(&self, user_id: Uuid, limit: i64) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users u
             WHERE u.is_active = true
               AND u.id <> $1
               AND NOT EXISTS (
                   SELECT 1 FROM follows f WHERE f.follower_id = $1 AND f.followee_id = u.id
               )
             ORDER BY u.created_at DESC
             LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
