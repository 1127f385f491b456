//! Registration, login and session tokens.
//!
//! Passwords are hashed with bcrypt on the blocking pool. Session tokens
//! are HS256 JWTs carrying `sub`, `iat` and `exp`; every validation failure
//! collapses into `Unauthorized`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::debug;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};
use crate::models::user::{normalize_email, User};
use crate::repository::UserRepository;

/// Session token claims.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// User id.
    pub sub: Uuid,
    /// Issued at, seconds since epoch.
    pub iat: i64,
    /// Expiry, seconds since epoch.
    pub exp: i64,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
    bcrypt_cost: u32,
    // Verified against when the email is unknown, hashed on first use
    dummy_hash: Arc<OnceCell<String>>,
}

const DUMMY_PASSWORD: &str = "no-such-user";

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, config: &AuthConfig) -> Self {
        Self {
            users,
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            token_ttl: config.token_ttl,
            bcrypt_cost: config.bcrypt_cost,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Creates an account and signs a token for it. Blank input and a taken
    /// email are both `Conflict`.
    pub async fn register(&self, email: &str, password: &str) -> AppResult<(User, String)> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AppError::Conflict);
        }

        let hash = hash_password(password.to_owned(), self.bcrypt_cost).await?;
        let user = self.users.create(&email, &hash).await?;
        let token = self.issue_token(user.id)?;
        Ok((user, token))
    }

    /// Unknown email and wrong password are reported identically.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(User, String)> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AppError::Unauthorized);
        }

        let user = match self.users.get_by_email(&email).await {
            Ok(user) => user,
            Err(AppError::NotFound) => {
                // Same bcrypt work as a wrong password
                let hash = self.dummy_hash().await?;
                verify_password(password.to_owned(), hash).await?;
                return Err(AppError::Unauthorized);
            }
            Err(e) => return Err(e),
        };

        if !verify_password(password.to_owned(), user.password_hash.clone()).await? {
            debug!(user_id = %user.id, "password mismatch");
            return Err(AppError::Unauthorized);
        }

        let token = self.issue_token(user.id)?;
        Ok((user, token))
    }

    async fn dummy_hash(&self) -> AppResult<String> {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| hash_password(DUMMY_PASSWORD.to_owned(), self.bcrypt_cost))
            .await?;
        Ok(hash.clone())
    }

    pub async fn get_user(&self, id: Uuid) -> AppResult<User> {
        self.users.get(id).await
    }

    pub fn issue_token(&self, user_id: Uuid) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.token_ttl.as_secs()).context("token ttl out of range")?;
        let exp = now.checked_add(ttl).context("token expiry out of range")?;
        let claims = Claims {
            sub: user_id,
            iat: now,
            exp,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("sign session token")?;
        Ok(token)
    }

    /// Returns the user id of a valid token.
    pub fn validate_token(&self, token: &str) -> AppResult<Uuid> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            debug!("rejected token: {}", e);
            AppError::Unauthorized
        })?;

        if data.claims.iat > data.claims.exp {
            return Err(AppError::Unauthorized);
        }
        Ok(data.claims.sub)
    }
}

async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .context("password hashing task")?
        .context("hash password")?;
    Ok(hash)
}

// A stored hash bcrypt cannot parse counts as a mismatch
async fn verify_password(password: String, hash: String) -> AppResult<bool> {
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .context("password verification task")?
        .unwrap_or(false);
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory::MemoryUserRepository;
    use fake::{faker::internet::en::SafeEmail, Fake};

    const SECRET: &str = "test-secret";

    fn service() -> AuthService {
        service_with_ttl(Duration::from_secs(3600))
    }

    fn service_with_ttl(token_ttl: Duration) -> AuthService {
        let config = AuthConfig {
            jwt_secret: SECRET.into(),
            token_ttl,
            bcrypt_cost: 4,
        };
        AuthService::new(Arc::new(MemoryUserRepository::default()), &config)
    }

    fn sign(claims: &Claims, algorithm: Algorithm) -> String {
        encode(
            &Header::new(algorithm),
            claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn register_normalizes_email_and_issues_valid_token() {
        let auth = service();
        let (user, token) = auth.register("  Someone@Example.COM ", "pw1").await.unwrap();

        assert_eq!(user.email, "someone@example.com");
        assert_ne!(user.password_hash, "pw1");
        assert_eq!(auth.validate_token(&token).unwrap(), user.id);
    }

    #[tokio::test]
    async fn register_rejects_blank_and_duplicate_input() {
        let auth = service();
        let email: String = SafeEmail().fake();

        assert!(matches!(auth.register("", "pw").await.unwrap_err(), AppError::Conflict));
        assert!(matches!(auth.register(&email, "").await.unwrap_err(), AppError::Conflict));

        auth.register(&email, "pw").await.unwrap();
        let upper = email.to_uppercase();
        assert!(matches!(auth.register(&upper, "pw").await.unwrap_err(), AppError::Conflict));
    }

    #[tokio::test]
    async fn login_does_not_distinguish_unknown_email_from_bad_password() {
        let auth = service();
        let email: String = SafeEmail().fake();
        auth.register(&email, "right").await.unwrap();

        let unknown = auth.login("nobody@example.com", "right").await.unwrap_err();
        let wrong = auth.login(&email, "wrong").await.unwrap_err();

        assert!(matches!(unknown, AppError::Unauthorized));
        assert!(matches!(wrong, AppError::Unauthorized));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn unknown_email_still_pays_for_a_bcrypt_verify() {
        let auth = service();
        assert!(auth.dummy_hash.get().is_none());

        let err = auth.login("ghost@example.com", "pw").await.unwrap_err();

        assert!(matches!(err, AppError::Unauthorized));
        let dummy = auth.dummy_hash.get().unwrap();
        assert!(dummy.starts_with("$2b$04$"), "{dummy}");
    }

    #[tokio::test]
    async fn login_with_correct_credentials_succeeds() {
        let auth = service();
        let (registered, _) = auth.register("a@x.test", "pw1").await.unwrap();
        let (user, token) = auth.login("A@X.TEST", "pw1").await.unwrap();
        assert_eq!(user.id, registered.id);
        assert_eq!(auth.validate_token(&token).unwrap(), user.id);
    }

    #[test]
    fn unrepresentable_expiry_is_an_error_not_a_panic() {
        let user = Uuid::new_v4();
        for ttl in [Duration::from_secs(i64::MAX as u64), Duration::from_secs(u64::MAX)] {
            let err = service_with_ttl(ttl).issue_token(user).unwrap_err();
            assert!(matches!(err, AppError::Internal(_)));
        }
    }

    #[test]
    fn expired_token_is_unauthorized() {
        let now = Utc::now().timestamp();
        let token = sign(
            &Claims { sub: Uuid::new_v4(), iat: now - 120, exp: now - 60 },
            Algorithm::HS256,
        );
        assert!(matches!(service().validate_token(&token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn other_algorithm_is_unauthorized() {
        let now = Utc::now().timestamp();
        let token = sign(
            &Claims { sub: Uuid::new_v4(), iat: now, exp: now + 600 },
            Algorithm::HS512,
        );
        assert!(matches!(service().validate_token(&token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn malformed_or_foreign_tokens_are_unauthorized() {
        let auth = service();
        assert!(matches!(auth.validate_token("not-a-jwt"), Err(AppError::Unauthorized)));
        assert!(matches!(auth.validate_token(""), Err(AppError::Unauthorized)));

        let now = Utc::now().timestamp();
        let foreign = encode(
            &Header::new(Algorithm::HS256),
            &Claims { sub: Uuid::new_v4(), iat: now, exp: now + 600 },
            &EncodingKey::from_secret(b"someone-else"),
        )
        .unwrap();
        assert!(matches!(auth.validate_token(&foreign), Err(AppError::Unauthorized)));
    }

    #[test]
    fn token_without_subject_is_unauthorized() {
        let now = Utc::now().timestamp();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "iat": now, "exp": now + 600 }),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(matches!(service().validate_token(&token), Err(AppError::Unauthorized)));
    }
}
