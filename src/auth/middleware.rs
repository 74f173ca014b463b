// Authentication guard for protected routes

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use tracing::debug;

use crate::auth::{
    error::AuthError,
    provider::{AuthSession, SharedIdentityProvider},
};

/// Extract the token from an `Authorization: Bearer <token>` header value
///
/// The scheme is matched case-insensitively.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// Protected handlers take an `AuthSession` argument; requests without a
/// valid, unrevoked bearer token are rejected with 401 before the handler runs.
#[async_trait]
impl<S> FromRequestParts<S> for AuthSession
where
    SharedIdentityProvider: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AuthError::MissingToken)?
            .to_str()
            .map_err(|_| AuthError::InvalidToken)?;

        let token = bearer_token(auth_header).ok_or(AuthError::InvalidToken)?;

        let provider = SharedIdentityProvider::from_ref(state);
        let session = provider.authenticate(token).await?;

        debug!(
            "Authenticated request: user_id={}, path={}",
            session.user_id,
            parts.uri.path()
        );
        Ok(session)
    }
}
