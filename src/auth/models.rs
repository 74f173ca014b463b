// Authentication data models and DTOs

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Token type reported to clients
pub const TOKEN_TYPE: &str = "bearer";

/// User database model
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User response model (excludes password_hash)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub username: String,
    #[schema(example = "2025-11-01T12:00:00.000000Z")]
    pub created_at: String,
    #[schema(example = "2025-11-01T12:00:00.000000Z")]
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            username: user.username,
            created_at: format_timestamp(&user.created_at),
            updated_at: format_timestamp(&user.updated_at),
        }
    }
}

/// RFC 3339 in UTC with microsecond precision, e.g. `2025-11-01T12:00:00.000000Z`
fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Login request DTO
///
/// Fields are optional so a missing field surfaces as a validation error
/// keyed to that field instead of a deserialization failure.
#[derive(Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(
        required(message = "The username field is required."),
        custom(function = "non_blank", message = "The username field is required.")
    )]
    #[schema(example = "joao.silva")]
    pub username: Option<String>,
    #[validate(
        required(message = "The password field is required."),
        length(min = 6, message = "The password field must be at least 6 characters.")
    )]
    #[schema(example = "password123", min_length = 6)]
    pub password: Option<String>,
}

/// Reject values that are empty once surrounding whitespace is trimmed
fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

impl LoginRequest {
    /// Convert a validated request into credentials
    pub fn into_credentials(self) -> Credentials {
        Credentials {
            username: self.username.unwrap_or_default(),
            password: self.password.unwrap_or_default(),
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Username/password pair checked by the identity provider
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Bearer token issued by the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub ttl_seconds: i64,
}

impl AccessToken {
    pub fn token_type(&self) -> &'static str {
        TOKEN_TYPE
    }
}

/// Token payload returned by login and refresh
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    #[schema(example = "eyJ0eXAiOiJKV1QiLCJhbGc...")]
    pub access_token: String,
    #[schema(example = "bearer")]
    pub token_type: String,
    /// Seconds until the token expires
    #[schema(example = 3600)]
    pub expires_in: i64,
}

impl From<AccessToken> for TokenResponse {
    fn from(token: AccessToken) -> Self {
        Self {
            token_type: token.token_type().to_string(),
            access_token: token.value,
            expires_in: token.ttl_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn login(username: Option<&str>, password: Option<&str>) -> LoginRequest {
        LoginRequest {
            username: username.map(str::to_string),
            password: password.map(str::to_string),
        }
    }

    #[test]
    fn test_valid_login_request() {
        assert!(login(Some("testuser"), Some("password123")).validate().is_ok());
    }

    #[test]
    fn test_missing_fields_are_reported_per_field() {
        let errors = login(None, Some("password123")).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("username"));

        let errors = login(Some("testuser"), None).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
        assert!(!errors.field_errors().contains_key("username"));
    }

    #[test]
    fn test_empty_username_is_rejected() {
        let errors = login(Some(""), Some("password123")).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("username"));
    }

    #[test]
    fn test_blank_username_is_rejected() {
        let errors = login(Some("   "), Some("password123")).validate().unwrap_err();
        let field_errors = errors.field_errors();
        assert_eq!(
            field_errors["username"][0].message.as_deref(),
            Some("The username field is required.")
        );
        assert!(login(Some(" testuser "), Some("password123")).validate().is_ok());
    }

    #[test]
    fn test_short_password_is_rejected() {
        let errors = login(Some("testuser"), Some("12345")).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
        assert!(login(Some("testuser"), Some("123456")).validate().is_ok());
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let credentials = login(Some("testuser"), Some("password123")).into_credentials();
        let debug = format!("{:?}", credentials);
        assert!(debug.contains("testuser"));
        assert!(!debug.contains("password123"));
    }

    #[test]
    fn test_user_response_timestamp_format() {
        let at = Utc.with_ymd_and_hms(2025, 11, 1, 12, 0, 0).unwrap();
        let user = User {
            id: 1,
            name: "João Silva".to_string(),
            username: "joao.silva".to_string(),
            password_hash: "hash".to_string(),
            created_at: at,
            updated_at: at,
        };

        let response = UserResponse::from(user);
        assert_eq!(response.created_at, "2025-11-01T12:00:00.000000Z");
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn test_token_response_from_access_token() {
        let response = TokenResponse::from(AccessToken {
            value: "abc".to_string(),
            ttl_seconds: 3600,
        });
        assert_eq!(response.token_type, "bearer");
        assert_eq!(response.expires_in, 3600);
    }
}
