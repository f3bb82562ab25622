use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::auth::{create_jwt, hash_password, verify_password};
use crate::auth::auth_dto::{
    AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest,
};
use crate::error::{AppError, Result};
use crate::user::{NewUser, User, UserResponse, UserStore};

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt_secret: String,
    jwt_expiration_hours: i64,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        jwt_secret: String,
        jwt_expiration_hours: i64,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            users,
            jwt_secret,
            jwt_expiration_hours,
            bcrypt_cost,
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse> {
        let request = request.normalized();
        request.validate()?;

        let email = request.email;
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(
                "User already exists with this email".to_string(),
            ));
        }

        let password_hash = hash_password(&request.password, self.bcrypt_cost)?;
        let user = self
            .users
            .create(NewUser {
                name: request.name,
                email,
                password_hash,
                role: request.role,
            })
            .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "User registered");

        self.issue(user)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse> {
        let request = request.normalized();
        request.validate()?;

        let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

        let user = self
            .users
            .find_by_email(&request.email)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(invalid());
        }

        if !user.is_active {
            return Err(AppError::Forbidden("Account is deactivated.".to_string()));
        }

        self.users.touch_last_login(user.id).await?;
        tracing::debug!(user_id = %user.id, "User logged in");

        self.issue(user)
    }

    pub async fn me(&self, user_id: Uuid) -> Result<UserResponse> {
        let user = self.active_user(user_id).await?;

        Ok(UserResponse::from(user))
    }

    /// Issues a fresh token for an already authenticated user.
    pub async fn refresh(&self, user_id: Uuid) -> Result<String> {
        let user = self.active_user(user_id).await?;
        tracing::debug!(user_id = %user.id, "Token refreshed");

        create_jwt(user.id, &user.email, &self.jwt_secret, self.jwt_expiration_hours)
    }

    pub async fn change_password(&self, user_id: Uuid, request: ChangePasswordRequest) -> Result<()> {
        request.validate()?;

        let user = self.active_user(user_id).await?;
        if !verify_password(&request.current_password, &user.password_hash)? {
            return Err(AppError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        let password_hash = hash_password(&request.new_password, self.bcrypt_cost)?;
        self.users.update_password(user.id, &password_hash).await?;
        tracing::info!(user_id = %user.id, "Password changed");

        Ok(())
    }

    async fn active_user(&self, user_id: Uuid) -> Result<User> {
        self.users
            .find_active(user_id)
            .await?
            .ok_or(AppError::NotFound("User not found".to_string()))
    }

    fn issue(&self, user: User) -> Result<AuthResponse> {
        let token = create_jwt(user.id, &user.email, &self.jwt_secret, self.jwt_expiration_hours)?;

        Ok(AuthResponse {
            token,
            user: UserResponse::from(user),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_jwt;
    use crate::user::{InMemoryUserStore, UserRole};

    fn service() -> (AuthService, Arc<InMemoryUserStore>) {
        let users = Arc::new(InMemoryUserStore::new());
        (AuthService::new(users.clone(), "secret".to_string(), 24, 4), users)
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Ada Lovelace".to_string(),
            email: email.to_string(),
            password: "secret123".to_string(),
            role: UserRole::Alumni,
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (service, _) = service();

        let registered = service.register(register_request("Ada@Example.com")).await.unwrap();
        assert_eq!(registered.user.email, "ada@example.com");
        let claims = verify_jwt(&registered.token, "secret").unwrap();
        assert_eq!(claims.sub, registered.user.id.to_string());

        let logged_in = service
            .login(LoginRequest {
                email: "ADA@example.com".to_string(),
                password: "secret123".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(logged_in.user.id, registered.user.id);
    }

    #[tokio::test]
    async fn test_padded_email_registers_and_logs_in() {
        let (service, _) = service();

        let mut request = register_request("  Grace@Example.com  ");
        request.name = "  Grace Hopper ".to_string();
        let registered = service.register(request).await.unwrap();
        assert_eq!(registered.user.email, "grace@example.com");
        assert_eq!(registered.user.name, "Grace Hopper");

        let logged_in = service
            .login(LoginRequest {
                email: " GRACE@example.com".to_string(),
                password: "secret123".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(logged_in.user.id, registered.user.id);
    }

    #[tokio::test]
    async fn test_change_password_and_refresh() {
        let (service, users) = service();
        let registered = service.register(register_request("ada@example.com")).await.unwrap();
        let user_id = registered.user.id;

        let err = service
            .change_password(
                user_id,
                ChangePasswordRequest {
                    current_password: "not-it".to_string(),
                    new_password: "brand-new".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Current password is incorrect");

        service
            .change_password(
                user_id,
                ChangePasswordRequest {
                    current_password: "secret123".to_string(),
                    new_password: "brand-new".to_string(),
                },
            )
            .await
            .unwrap();

        let old = service
            .login(LoginRequest {
                email: "ada@example.com".to_string(),
                password: "secret123".to_string(),
            })
            .await;
        assert!(matches!(old, Err(AppError::Unauthorized(_))));
        service
            .login(LoginRequest {
                email: "ada@example.com".to_string(),
                password: "brand-new".to_string(),
            })
            .await
            .unwrap();

        let token = service.refresh(user_id).await.unwrap();
        assert_eq!(verify_jwt(&token, "secret").unwrap().sub, user_id.to_string());

        users.set_active(user_id, false).await.unwrap();
        assert!(matches!(service.refresh(user_id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let (service, _) = service();
        service.register(register_request("ada@example.com")).await.unwrap();

        let err = service.register(register_request(" ADA@example.com ")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_bad_credentials_and_short_password() {
        let (service, users) = service();
        let registered = service.register(register_request("ada@example.com")).await.unwrap();

        let err = service
            .login(LoginRequest {
                email: "ada@example.com".to_string(),
                password: "wrong-password".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let mut short = register_request("bob@example.com");
        short.password = "123".to_string();
        assert!(matches!(service.register(short).await, Err(AppError::Validation(_))));

        users.set_active(registered.user.id, false).await.unwrap();
        let err = service
            .login(LoginRequest {
                email: "ada@example.com".to_string(),
                password: "secret123".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
