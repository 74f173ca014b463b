// HTTP handlers for authentication endpoints

use axum::{extract::State, http::StatusCode};

use crate::auth::{
    error::AuthError,
    models::{LoginRequest, TokenResponse, UserResponse},
    provider::{AuthSession, SharedIdentityProvider},
};
use crate::error::ValidatedJson;
use crate::response::{self, ApiResponse};

pub const LOGOUT_MESSAGE: &str = "Successfully logged out";

/// Log a user in
///
/// Checks username and password and returns a bearer token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = TokenResponse,
            example = json!({"success": true, "data": {"access_token": "eyJ0eXAiOiJKV1QiLCJhbGc...", "token_type": "bearer", "expires_in": 3600}})),
        (status = 401, description = "Invalid credentials",
            example = json!({"success": false, "message": "Invalid credentials"})),
        (status = 422, description = "Validation error",
            example = json!({"success": false, "message": "Validation error", "errors": {"username": ["The username field is required."]}}))
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(provider): State<SharedIdentityProvider>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<ApiResponse, AuthError> {
    let credentials = request.into_credentials();
    let token = provider.attempt(&credentials).await?;
    Ok(response::success_with_data(TokenResponse::from(token), None, StatusCode::OK))
}

/// Get the authenticated user
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or invalid token",
            example = json!({"success": false, "message": "Unauthenticated."}))
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me_handler(
    State(provider): State<SharedIdentityProvider>,
    session: AuthSession,
) -> Result<ApiResponse, AuthError> {
    let user = provider.user(&session).await?;
    Ok(response::success_with_data(UserResponse::from(user), None, StatusCode::OK))
}

/// Log the authenticated user out
///
/// Invalidates the token used for this request.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Token invalidated",
            example = json!({"success": true, "message": "Successfully logged out"})),
        (status = 401, description = "Missing or invalid token",
            example = json!({"success": false, "message": "Unauthenticated."}))
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn logout_handler(
    State(provider): State<SharedIdentityProvider>,
    session: AuthSession,
) -> Result<ApiResponse, AuthError> {
    provider.logout(&session).await?;
    Ok(response::success_with_message(LOGOUT_MESSAGE, StatusCode::OK))
}

/// Exchange the current token for a new one
///
/// The token used for this request is invalidated.
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    responses(
        (status = 200, description = "New token issued", body = TokenResponse),
        (status = 401, description = "Missing or invalid token",
            example = json!({"success": false, "message": "Unauthenticated."}))
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn refresh_handler(
    State(provider): State<SharedIdentityProvider>,
    session: AuthSession,
) -> Result<ApiResponse, AuthError> {
    let token = provider.refresh(&session).await?;
    Ok(response::success_with_data(TokenResponse::from(token), None, StatusCode::OK))
}
