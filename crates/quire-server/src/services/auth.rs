//! Authentication service

use crate::storage::Database;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use quire_core::ports::UserStore;
use quire_core::{QuireError, Result, User};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

const TOKEN_TTL_DAYS: i64 = 30;

pub struct AuthService {
    db: Arc<Database>,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(db: Arc<Database>, jwt_secret: String) -> Self {
        Self { db, jwt_secret }
    }

    pub async fn create_user(&self, email: &str, password: &str, name: Option<&str>) -> Result<User> {
        if !email.contains('@') {
            return Err(QuireError::InvalidInput("invalid email".to_string()));
        }
        if password.len() < 6 {
            return Err(QuireError::InvalidInput(
                "password must be at least 6 characters".to_string(),
            ));
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| QuireError::InvalidInput(format!("Failed to hash password: {}", e)))?
            .to_string();

        self.db.create_user(email, &password_hash, name).await
    }

    /// Create the configured admin account unless it already exists
    pub async fn ensure_admin(&self, email: &str, password: &str) -> Result<()> {
        if self.db.get_user_by_email(email).await?.is_some() {
            return Ok(());
        }
        let user = self.create_user(email, password, Some("Admin")).await?;
        info!("Created admin user {} ({})", user.email, user.id);
        Ok(())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(User, AuthToken)> {
        if let Some((user, password_hash)) = self.db.get_user_by_email(email).await? {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| QuireError::Unauthorized(format!("Invalid password hash: {}", e)))?;

            if Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok()
            {
                let token = self.generate_token(&user.id)?;
                return Ok((user, token));
            }
        }

        Err(QuireError::Unauthorized("Invalid credentials".to_string()))
    }

    /// Validate a bearer token and return the user id it was issued to
    pub fn validate_token(&self, token: &str) -> Result<String> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| QuireError::Unauthorized(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims.sub)
    }

    fn generate_token(&self, user_id: &str) -> Result<AuthToken> {
        let now = Utc::now();
        let ttl = Duration::days(TOKEN_TTL_DAYS);
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| QuireError::Unauthorized(format!("Failed to sign token: {}", e)))?;

        Ok(AuthToken {
            access_token,
            expires_in: ttl.num_seconds(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // user_id
    exp: i64,    // expiration time
    iat: i64,    // issued at
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthToken {
    pub access_token: String,
    pub expires_in: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn service() -> AuthService {
        let db = Arc::new(Database::in_memory().await.unwrap());
        AuthService::new(db, "test-secret".to_string())
    }

    #[tokio::test]
    async fn test_login_roundtrip() {
        let auth = service().await;
        auth.ensure_admin("me@example.com", "hunter22").await.unwrap();
        // Second call is a no-op
        auth.ensure_admin("me@example.com", "other-pass").await.unwrap();

        let (user, token) = auth.login("me@example.com", "hunter22").await.unwrap();
        assert_eq!(user.email, "me@example.com");
        assert_eq!(token.expires_in, TOKEN_TTL_DAYS * 24 * 3600);
        assert_eq!(auth.validate_token(&token.access_token).unwrap(), user.id);
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let auth = service().await;
        auth.ensure_admin("me@example.com", "hunter22").await.unwrap();
        assert!(matches!(
            auth.login("me@example.com", "wrong").await,
            Err(QuireError::Unauthorized(_))
        ));
        assert!(auth.login("nobody@example.com", "hunter22").await.is_err());
        assert!(auth.validate_token("not-a-jwt").is_err());
    }

    #[tokio::test]
    async fn test_short_password_rejected() {
        let auth = service().await;
        assert!(matches!(
            auth.create_user("me@example.com", "123", None).await,
            Err(QuireError::InvalidInput(_))
        ));
    }
}
