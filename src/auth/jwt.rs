use crate::error::{AppError, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn create_jwt(user_id: Uuid, email: &str, secret: &str, expiration_hours: i64) -> Result<String> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(Duration::hours(expiration_hours))
        .ok_or(AppError::Internal("token expiry overflow".to_string()))?
        .timestamp();

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        iat: now.timestamp(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("failed to create token: {}", e)))
}

pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let user_id = Uuid::new_v4();
        let token = create_jwt(user_id, "ada@example.com", "secret", 24).unwrap();

        let claims = verify_jwt(&token, "secret").unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "ada@example.com");
    }

    #[test]
    fn test_wrong_secret_and_expired_tokens_are_unauthorized() {
        let token = create_jwt(Uuid::new_v4(), "ada@example.com", "secret", 24).unwrap();
        assert!(matches!(verify_jwt(&token, "other"), Err(AppError::Unauthorized(_))));

        let expired = create_jwt(Uuid::new_v4(), "ada@example.com", "secret", -2).unwrap();
        match verify_jwt(&expired, "secret") {
            Err(AppError::Unauthorized(msg)) => assert!(msg.contains("expired")),
            other => panic!("unexpected {:?}", other.map(|c| c.sub)),
        }
    }
}
