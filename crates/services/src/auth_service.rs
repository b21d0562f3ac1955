//! Registration, login and bearer-token identity.
//!
//! Tokens are compact HS256 JWTs carrying `sub` (user id), `iat` and `exp`.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Duration;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{info, warn};

use quiz_core::model::{Role, User, UserError, UserId, UserPatch, normalize_email};
use storage::repository::{StorageError, UserRepository};

use crate::Clock;
use crate::error::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Secrets and cost knobs handed down from configuration.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub secret: String,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
}

/// Fields accepted by `register`.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Wire shape of an issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

//
// ─── TOKENS ────────────────────────────────────────────────────────────────────
//

/// Signs and verifies HS256 tokens against one shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    clock: Clock,
    secret: Vec<u8>,
    ttl: Duration,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(clock: Clock, secret: &str, ttl: Duration) -> Self {
        Self {
            clock,
            secret: secret.as_bytes().to_vec(),
            ttl,
        }
    }

    /// # Errors
    ///
    /// Returns `AuthError::Encoding` if the claims cannot be serialized.
    pub fn issue(&self, user_id: UserId) -> Result<Token, AuthError> {
        let now = self.clock.now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        let header = serde_json::json!({ "alg": "HS256", "typ": "JWT" });

        let header_b64 = URL_SAFE_NO_PAD.encode(encode_json(&header)?);
        let payload_b64 = URL_SAFE_NO_PAD.encode(encode_json(&claims)?);
        let signing_input = format!("{header_b64}.{payload_b64}");
        let signature = self.mac(&signing_input)?.finalize().into_bytes();

        Ok(Token {
            access_token: format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature)),
            token_type: "bearer".to_owned(),
        })
    }

    /// Check signature and expiry and return the subject.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for any malformed, forged or expired
    /// token.
    pub fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(sig_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::InvalidToken);
        };

        let header: serde_json::Value = decode_segment(header_b64)?;
        if header.get("alg").and_then(serde_json::Value::as_str) != Some("HS256") {
            return Err(AuthError::InvalidToken);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(sig_b64.as_bytes())
            .map_err(|_| AuthError::InvalidToken)?;
        self.mac(&format!("{header_b64}.{payload_b64}"))?
            .verify_slice(&signature)
            .map_err(|_| AuthError::InvalidToken)?;

        let claims: Claims = decode_segment(payload_b64)?;
        if self.clock.now().timestamp() >= claims.exp {
            return Err(AuthError::InvalidToken);
        }
        claims.sub.parse().map_err(|_| AuthError::InvalidToken)
    }

    fn mac(&self, signing_input: &str) -> Result<HmacSha256, AuthError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AuthError::Encoding(e.to_string()))?;
        mac.update(signing_input.as_bytes());
        Ok(mac)
    }
}

fn encode_json<T: Serialize>(value: &T) -> Result<Vec<u8>, AuthError> {
    serde_json::to_vec(value).map_err(|e| AuthError::Encoding(e.to_string()))
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, AuthError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment.as_bytes())
        .map_err(|_| AuthError::InvalidToken)?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::InvalidToken)
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Account management and credential checks.
#[derive(Clone)]
pub struct AuthService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
    tokens: TokenIssuer,
    bcrypt_cost: u32,
}

impl AuthService {
    #[must_use]
    pub fn new(clock: Clock, users: Arc<dyn UserRepository>, settings: &AuthSettings) -> Self {
        Self {
            clock,
            users,
            tokens: TokenIssuer::new(clock, &settings.secret, settings.token_ttl),
            bcrypt_cost: settings.bcrypt_cost,
        }
    }

    /// Create an account. The role defaults to `user`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmailTaken` for a duplicate email and
    /// `AuthError::User` for blank or malformed fields.
    pub async fn register(&self, registration: Registration) -> Result<User, AuthError> {
        if registration.password.is_empty() {
            return Err(UserError::EmptyPassword.into());
        }
        let email = normalize_email(&registration.email)?;
        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = bcrypt::hash(&registration.password, self.bcrypt_cost)?;
        let user = User::new(
            UserId::generate(),
            registration.name,
            &email,
            password_hash,
            registration.role.unwrap_or_default(),
            self.clock.now(),
        )?;
        self.users.insert_user(&user).await.map_err(email_conflict)?;
        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email or a
    /// wrong password.
    pub async fn login(&self, credentials: Credentials) -> Result<Token, AuthError> {
        let Ok(email) = normalize_email(&credentials.email) else {
            warn!("login rejected: malformed email");
            return Err(AuthError::InvalidCredentials);
        };
        let Some(user) = self.users.find_user_by_email(&email).await? else {
            warn!("login rejected: unknown email");
            return Err(AuthError::InvalidCredentials);
        };
        if !bcrypt::verify(&credentials.password, &user.password_hash)? {
            warn!(user_id = %user.id, "login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }
        self.tokens.issue(user.id)
    }

    /// Resolve a bearer token to its user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token fails verification or
    /// its user no longer exists.
    pub async fn resolve_current_user(&self, token: &str) -> Result<User, AuthError> {
        let user_id = self.tokens.verify(token).inspect_err(|_| {
            warn!("bearer token rejected");
        })?;
        self.users
            .get_user(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)
    }

    /// Apply a profile patch. A new password is re-hashed.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmailTaken` if the new email belongs to another
    /// account and `AuthError::User` for invalid fields.
    pub async fn update_me(&self, user: &User, patch: UserPatch) -> Result<User, AuthError> {
        let mut updated = user.clone();
        if let Some(name) = patch.name {
            if name.trim().is_empty() {
                return Err(UserError::EmptyName.into());
            }
            updated.name = name;
        }
        if let Some(email) = patch.email {
            updated.email = normalize_email(&email)?;
        }
        if let Some(role) = patch.role {
            updated.role = role;
        }
        if let Some(password) = patch.password {
            if password.is_empty() {
                return Err(UserError::EmptyPassword.into());
            }
            updated.password_hash = bcrypt::hash(&password, self.bcrypt_cost)?;
        }
        updated.updated_at = Some(self.clock.now());

        self.users.update_user(&updated).await.map_err(email_conflict)?;
        info!(user_id = %updated.id, "user updated");
        Ok(updated)
    }

    /// # Errors
    ///
    /// Returns `AuthError::Encoding` if the token cannot be built.
    pub fn refresh(&self, user: &User) -> Result<Token, AuthError> {
        self.tokens.issue(user.id)
    }
}

fn email_conflict(err: StorageError) -> AuthError {
    match err {
        StorageError::Conflict(_) => AuthError::EmailTaken,
        other => AuthError::Storage(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use quiz_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn settings() -> AuthSettings {
        AuthSettings {
            secret: "test-secret".into(),
            token_ttl: Duration::minutes(30),
            bcrypt_cost: 4,
        }
    }

    fn service(clock: Clock) -> AuthService {
        AuthService::new(clock, Arc::new(InMemoryRepository::new()), &settings())
    }

    fn ann() -> Registration {
        Registration {
            name: "Ann".into(),
            email: "Ann@Example.com".into(),
            password: "hunter22".into(),
            role: None,
        }
    }

    #[tokio::test]
    async fn register_then_login_resolves_user() {
        let svc = service(Clock::fixed(fixed_now()));
        let user = svc.register(ann()).await.unwrap();
        assert_eq!(user.email, "ann@example.com");
        assert_eq!(user.role, Role::User);
        assert_ne!(user.password_hash, "hunter22");

        let token = svc
            .login(Credentials {
                email: "ann@example.com".into(),
                password: "hunter22".into(),
            })
            .await
            .unwrap();
        assert_eq!(token.token_type, "bearer");
        let resolved = svc.resolve_current_user(&token.access_token).await.unwrap();
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let svc = service(Clock::fixed(fixed_now()));
        svc.register(ann()).await.unwrap();
        let mut again = ann();
        again.email = " ann@example.COM".into();
        assert!(matches!(svc.register(again).await, Err(AuthError::EmailTaken)));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let svc = service(Clock::fixed(fixed_now()));
        svc.register(ann()).await.unwrap();
        for (email, password) in [("ann@example.com", "nope"), ("bob@example.com", "hunter22")] {
            let err = svc
                .login(Credentials {
                    email: email.into(),
                    password: password.into(),
                })
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials));
        }
    }

    #[test]
    fn expired_or_forged_tokens_are_rejected() {
        let mut clock = Clock::fixed(fixed_now());
        let issuer = TokenIssuer::new(clock, "secret", Duration::minutes(30));
        let user = UserId::generate();
        let token = issuer.issue(user).unwrap().access_token;
        assert_eq!(issuer.verify(&token).unwrap(), user);

        let other = TokenIssuer::new(clock, "other-secret", Duration::minutes(30));
        assert!(matches!(other.verify(&token), Err(AuthError::InvalidToken)));
        assert!(matches!(issuer.verify("a.b"), Err(AuthError::InvalidToken)));

        clock.advance(Duration::minutes(31));
        let later = TokenIssuer::new(clock, "secret", Duration::minutes(30));
        assert!(matches!(later.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn update_me_rehashes_password_and_guards_email() {
        let svc = service(Clock::fixed(fixed_now()));
        let ann = svc.register(ann()).await.unwrap();
        svc.register(Registration {
            name: "Bob".into(),
            email: "bob@example.com".into(),
            password: "pw".into(),
            role: Some(Role::Admin),
        })
        .await
        .unwrap();

        let taken = svc
            .update_me(
                &ann,
                UserPatch {
                    email: Some("BOB@example.com".into()),
                    ..UserPatch::default()
                },
            )
            .await;
        assert!(matches!(taken, Err(AuthError::EmailTaken)));

        let updated = svc
            .update_me(
                &ann,
                UserPatch {
                    name: Some("Annie".into()),
                    password: Some("new-pass".into()),
                    ..UserPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Annie");
        assert!(
            svc.login(Credentials {
                email: "ann@example.com".into(),
                password: "new-pass".into(),
            })
            .await
            .is_ok()
        );
    }
}
