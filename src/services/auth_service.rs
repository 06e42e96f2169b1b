//! Account and session lifecycle: registration, login, the
//! issuance-timestamp logout mechanism, and the password reset flow.

use std::sync::Arc;

use tokio::task;
use tracing::{info, warn};

use crate::auth::password::{hash_password, verify_password};
use crate::auth::{TokenCodec, TokenError};
use crate::config::{AuthConfig, SecurityConfig};
use crate::db::{Store, User};
use crate::email::Mailer;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("User already exists")]
    UsernameTaken,

    #[error("Email already registered")]
    EmailTaken,

    #[error("Incorrect email or password")]
    BadCredentials,

    /// Covers malformed tokens, expired tokens, tokens for unknown
    /// users and tokens predating the session cutover. Deliberately a
    /// single variant so the cause cannot leak to the client.
    #[error("Could not validate credentials")]
    InvalidToken,

    #[error("User not found")]
    UnknownEmail,

    #[error("Invalid or expired token")]
    InvalidResetToken,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub struct AuthService {
    store: Store,
    codec: TokenCodec,
    mailer: Arc<dyn Mailer>,
    security: SecurityConfig,
    frontend_url: String,
    reset_token_ttl_minutes: i64,
    conceal_unknown_emails: bool,
}

impl AuthService {
    #[must_use]
    pub fn new(
        store: Store,
        auth_config: &AuthConfig,
        security: SecurityConfig,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            store,
            codec: TokenCodec::new(&auth_config.secret_key, auth_config.token_ttl_days),
            mailer,
            security,
            frontend_url: auth_config.frontend_url.trim_end_matches('/').to_string(),
            reset_token_ttl_minutes: auth_config.reset_token_ttl_minutes,
            conceal_unknown_emails: auth_config.conceal_unknown_emails,
        }
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        if self.store.get_user_by_username(username).await?.is_some() {
            return Err(AuthError::UsernameTaken);
        }

        if self.store.get_user_by_email(email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let hash = self.hash_on_blocking_pool(password).await?;
        let user = self.store.create_user(username, email, Some(hash)).await?;

        info!("User registered: {}", user.username);
        Ok(user)
    }

    /// Verify credentials and mint a bearer token. Issuing also stamps
    /// the user's session cutover, so a successful login supersedes
    /// every earlier session.
    ///
    /// The failure message never distinguishes an unknown email from a
    /// wrong password or a passwordless account.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let Some((user, stored_hash)) = self.store.get_user_credentials(email).await? else {
            return Err(AuthError::BadCredentials);
        };

        let Some(stored_hash) = stored_hash else {
            return Err(AuthError::BadCredentials);
        };

        let password = password.to_string();
        let verified = task::spawn_blocking(move || verify_password(&password, &stored_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Password verification task panicked: {e}"))?;

        if !verified {
            return Err(AuthError::BadCredentials);
        }

        self.issue_token(&user).await
    }

    /// Sign a token and persist its issuance time as the user's new
    /// cutover watermark. The write comes before the token is handed
    /// out: if it fails, no token exists whose `iat` the store has
    /// never seen.
    pub async fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        let iat = TokenCodec::now();

        let token = self
            .codec
            .issue(&user.username, iat)
            .map_err(|e| anyhow::anyhow!("Failed to sign token: {e}"))?;

        self.store.set_user_issued_at(user.id, iat).await?;

        Ok(token)
    }

    /// Resolve the caller behind a bearer token: signature and expiry
    /// check, user lookup, session cutover gate. Every failure mode
    /// collapses into [`AuthError::InvalidToken`].
    pub async fn current_user(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.codec.verify(token).map_err(|e| {
            match e {
                TokenError::Expired => warn!("Rejected expired bearer token"),
                TokenError::Malformed => warn!("Rejected malformed bearer token"),
            }
            AuthError::InvalidToken
        })?;

        let user = self
            .store
            .get_user_by_username(&claims.sub)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if !claims.outlives(user.issued_at) {
            return Err(AuthError::InvalidToken);
        }

        Ok(user)
    }

    /// Invalidate every token issued before now.
    pub async fn logout(&self, user: &User) -> Result<(), AuthError> {
        self.store
            .set_user_issued_at(user.id, TokenCodec::now())
            .await?;

        info!("User logged out: {}", user.username);
        Ok(())
    }

    /// Create a one-time reset token and mail it as a link. Unknown
    /// emails surface as [`AuthError::UnknownEmail`] unless the service
    /// is configured to conceal account existence.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let Some(user) = self.store.get_user_by_email(email).await? else {
            if self.conceal_unknown_emails {
                info!("Password reset requested for unknown email");
                return Ok(());
            }
            return Err(AuthError::UnknownEmail);
        };

        let token = generate_reset_token();
        let expires_at = TokenCodec::now() + self.reset_token_ttl_minutes * 60;

        self.store
            .create_reset_token(user.id, &token, expires_at)
            .await?;

        let reset_url = format!("{}/reset-password?token={}", self.frontend_url, token);
        self.mailer
            .send_password_reset(&user.email, &reset_url)
            .await?;

        info!("Password reset token issued for user {}", user.id);
        Ok(())
    }

    /// Exchange a reset token for a new password. The token is
    /// consumed only on success; an expired token stays in place and is
    /// rejected again on retry. Existing bearer sessions are left
    /// untouched.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        let Some(reset) = self.store.get_reset_token(token).await? else {
            return Err(AuthError::InvalidResetToken);
        };

        if reset.expires_at < TokenCodec::now() {
            return Err(AuthError::InvalidResetToken);
        }

        let user = self
            .store
            .get_user_by_id(reset.user_id)
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        let hash = self.hash_on_blocking_pool(new_password).await?;
        self.store.set_user_password(user.id, hash).await?;
        self.store.delete_reset_token(token).await?;

        info!("Password reset completed for user {}", user.id);
        Ok(())
    }

    async fn hash_on_blocking_pool(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_string();
        let security = self.security.clone();

        let hash = task::spawn_blocking(move || hash_password(&password, &security))
            .await
            .map_err(|e| anyhow::anyhow!("Password hashing task panicked: {e}"))??;

        Ok(hash)
    }
}

/// Random 64-char hex string; unguessable by construction.
#[must_use]
pub fn generate_reset_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_tokens_are_long_and_unique() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
