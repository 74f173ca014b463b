// Identity provider: verifies credentials and manages the token lifecycle

use std::sync::Arc;

use axum::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::auth::{
    error::AuthError,
    models::{AccessToken, Credentials, User},
    password::PasswordService,
    repository::{TokenDenylist, UserStore},
    token::TokenService,
};

/// Identity established from a verified bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user_id: i64,
    /// `jti` of the token the request was made with
    pub token_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Operations handlers need from the authentication backend
///
/// Handlers receive this as an explicit dependency through application state.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Check credentials and issue a token.
    /// Unknown username and wrong password both yield `AuthError::InvalidCredentials`.
    async fn attempt(&self, credentials: &Credentials) -> Result<AccessToken, AuthError>;

    /// Turn a raw bearer token into a session, rejecting invalid, expired or revoked tokens
    async fn authenticate(&self, token: &str) -> Result<AuthSession, AuthError>;

    /// Resolve the user behind a session
    async fn user(&self, session: &AuthSession) -> Result<User, AuthError>;

    /// Invalidate the session's token
    async fn logout(&self, session: &AuthSession) -> Result<(), AuthError>;

    /// Issue a new token for the session's user and invalidate the current one
    async fn refresh(&self, session: &AuthSession) -> Result<AccessToken, AuthError>;

    /// Lifetime of issued tokens in seconds
    fn ttl_seconds(&self) -> i64;
}

pub type SharedIdentityProvider = Arc<dyn IdentityProvider>;

/// Identity provider backed by a user store, signed JWTs and a revoked-token list
pub struct JwtIdentityProvider {
    users: Arc<dyn UserStore>,
    denylist: Arc<dyn TokenDenylist>,
    tokens: TokenService,
    /// Verified against when the username is unknown, so both failure paths cost the same
    dummy_hash: String,
}

impl JwtIdentityProvider {
    pub fn new(
        users: Arc<dyn UserStore>,
        denylist: Arc<dyn TokenDenylist>,
        tokens: TokenService,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            users,
            denylist,
            tokens,
            dummy_hash: PasswordService::hash_password("dummy-password-for-timing")?,
        })
    }

    fn issue(&self, user_id: i64) -> Result<(AccessToken, DateTime<Utc>), AuthError> {
        let (value, claims) = self.tokens.issue(user_id)?;
        Ok((
            AccessToken {
                value,
                ttl_seconds: self.tokens.ttl_seconds(),
            },
            claims.expires_at(),
        ))
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn attempt(&self, credentials: &Credentials) -> Result<AccessToken, AuthError> {
        let user = match self.users.find_by_username(&credentials.username).await? {
            Some(user) => user,
            None => {
                let _ = PasswordService::verify_password(&credentials.password, &self.dummy_hash);
                debug!("Login failed: unknown username");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !PasswordService::verify_password(&credentials.password, &user.password_hash)? {
            debug!(user_id = user.id, "Login failed: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let (token, _) = self.issue(user.id)?;
        info!(user_id = user.id, "User logged in");
        Ok(token)
    }

    async fn authenticate(&self, token: &str) -> Result<AuthSession, AuthError> {
        let claims = self.tokens.validate(token)?;
        let user_id = claims.user_id()?;

        if self.denylist.is_revoked(&claims.jti).await? {
            return Err(AuthError::RevokedToken);
        }

        Ok(AuthSession {
            user_id,
            expires_at: claims.expires_at(),
            token_id: claims.jti,
        })
    }

    async fn user(&self, session: &AuthSession) -> Result<User, AuthError> {
        self.users
            .find_by_id(session.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn logout(&self, session: &AuthSession) -> Result<(), AuthError> {
        self.denylist.revoke(&session.token_id, session.expires_at).await?;
        info!(user_id = session.user_id, "User logged out");
        Ok(())
    }

    async fn refresh(&self, session: &AuthSession) -> Result<AccessToken, AuthError> {
        // Issue first so a signing failure leaves the current token usable.
        let (token, _) = self.issue(session.user_id)?;
        self.denylist.revoke(&session.token_id, session.expires_at).await?;
        info!(user_id = session.user_id, "Token refreshed");
        Ok(token)
    }

    fn ttl_seconds(&self) -> i64 {
        self.tokens.ttl_seconds()
    }
}
