// Error handling for request extraction and validation
// Converts rejected or invalid request bodies into the standard response envelope

use std::collections::BTreeMap;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use validator::{Validate, ValidationErrors};

use crate::response;

/// Message for bodies that are not valid JSON
pub const MALFORMED_JSON_MESSAGE: &str = "The request body is not valid JSON.";

/// Errors raised before a handler's own logic runs
#[derive(Debug)]
pub enum ApiError {
    /// Field-level validation failures
    /// Maps to HTTP 422 Unprocessable Entity
    ValidationError(ValidationErrors),

    /// Body could not be read or deserialized as JSON
    /// Keeps the status chosen by axum (400, 415 or 422)
    InvalidJson(JsonRejection),
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidJson(rejection) => rejection.status(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::ValidationError(errors) => {
                debug!("Validation error: {:?}", errors);
                response::validation_error(field_errors(&errors), None).into_response()
            }
            ApiError::InvalidJson(rejection) => {
                debug!("Rejected request body: {}", rejection.body_text());
                match rejection {
                    JsonRejection::JsonDataError(error) => {
                        response::validation_error(type_errors(&error.body_text()), None).into_response()
                    }
                    JsonRejection::JsonSyntaxError(error) => {
                        response::error(MALFORMED_JSON_MESSAGE, error.status(), None).into_response()
                    }
                    other => response::error(&other.body_text(), other.status(), None).into_response(),
                }
            }
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::ValidationError(errors)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidJson(rejection)
    }
}

/// Flatten validator output into `{field: [message, ...]}`
///
/// Fields are sorted so the rendered JSON is stable.
pub fn field_errors(errors: &ValidationErrors) -> Value {
    let map: BTreeMap<String, Vec<String>> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            let messages = errors
                .iter()
                .map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("The {} field is invalid.", field),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect();

    serde_json::to_value(map).unwrap_or_else(|_| Value::Object(Default::default()))
}

/// Map a JSON type mismatch to `{field: [message]}`
///
/// axum reports these as `<prefix>: <path>: <serde message>`. Only the top-level
/// field name is kept; errors at the document root are keyed as `body`.
fn type_errors(body_text: &str) -> Value {
    let detail = body_text.splitn(2, ": ").nth(1).unwrap_or_default();
    let (path, reason) = detail.split_once(": ").unwrap_or(("", detail));

    let field = path
        .split(|c| c == '.' || c == '[')
        .next()
        .filter(|f| !f.is_empty() && !f.contains(' '));

    let (key, message) = match field {
        Some(field) if reason.contains("expected a string") => {
            (field.to_string(), format!("The {} field must be a string.", field))
        }
        Some(field) => (field.to_string(), format!("The {} field is invalid.", field)),
        None => ("body".to_string(), "The request body must be a JSON object.".to_string()),
    };

    let mut map = BTreeMap::new();
    map.insert(key, vec![message]);
    serde_json::to_value(map).unwrap_or_else(|_| Value::Object(Default::default()))
}

/// JSON extractor that also runs `validator` rules on the body
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use validator::ValidationError;

    fn errors_for(field: &'static str, message: Option<&'static str>) -> ValidationErrors {
        let mut error = ValidationError::new("required");
        if let Some(message) = message {
            error.message = Some(message.into());
        }
        let mut errors = ValidationErrors::new();
        errors.add(field, error);
        errors
    }

    #[test]
    fn test_field_errors_uses_custom_message() {
        let errors = errors_for("username", Some("The username field is required."));
        assert_eq!(
            field_errors(&errors),
            json!({"username": ["The username field is required."]})
        );
    }

    #[test]
    fn test_field_errors_falls_back_to_generic_message() {
        let errors = errors_for("password", None);
        assert_eq!(
            field_errors(&errors),
            json!({"password": ["The password field is invalid."]})
        );
    }

    #[test]
    fn test_type_errors_keyed_by_field() {
        let text = "Failed to deserialize the JSON body into the target type: \
                    username: invalid type: integer `12345`, expected a string at line 1 column 42";
        assert_eq!(
            type_errors(text),
            json!({"username": ["The username field must be a string."]})
        );
    }

    #[test]
    fn test_type_errors_at_root() {
        let text = "Failed to deserialize the JSON body into the target type: \
                    invalid type: sequence, expected struct LoginRequest at line 1 column 0";
        let errors = type_errors(text);
        assert_eq!(errors, json!({"body": ["The request body must be a JSON object."]}));
        assert!(!errors.to_string().contains("line 1"));
    }

    #[test]
    fn test_validation_error_status() {
        let error = ApiError::from(errors_for("username", None));
        assert_eq!(error.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
