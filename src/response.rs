// Response envelope used by every endpoint
// Success and error outcomes share one JSON wrapper: {success, message?, data?, errors?}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

/// Uniform top-level JSON wrapper.
///
/// Fields are private so an envelope can only be built through
/// [`ResponseEnvelope::success`] or [`ResponseEnvelope::error`]: a failed
/// envelope never carries `data` and a successful one never carries `errors`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Value>,
}

impl ResponseEnvelope {
    /// Build a success envelope. Empty messages and JSON `null` payloads are dropped.
    pub fn success(data: Option<Value>, message: Option<&str>) -> Self {
        Self {
            success: true,
            message: message.filter(|m| !m.is_empty()).map(str::to_string),
            data: data.filter(|d| !d.is_null()),
            errors: None,
        }
    }

    /// Build an error envelope. JSON `null` errors are dropped.
    pub fn error(message: &str, errors: Option<Value>) -> Self {
        Self {
            success: false,
            message: Some(message.to_string()),
            data: None,
            errors: errors.filter(|e| !e.is_null()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn errors(&self) -> Option<&Value> {
        self.errors.as_ref()
    }
}

/// An envelope paired with the HTTP status it is sent with.
///
/// `envelope` is `None` only for 204 responses, which have an empty body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    status: StatusCode,
    envelope: Option<ResponseEnvelope>,
}

impl ApiResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn envelope(&self) -> Option<&ResponseEnvelope> {
        self.envelope.as_ref()
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        match self.envelope {
            Some(envelope) => (self.status, Json(envelope)).into_response(),
            None => self.status.into_response(),
        }
    }
}

/// Success response with an optional payload and message
pub fn success<T: Serialize>(data: Option<T>, message: Option<&str>, status: StatusCode) -> ApiResponse {
    let data = match data.map(serde_json::to_value).transpose() {
        Ok(data) => data,
        Err(e) => {
            error!("Failed to serialize response payload: {}", e);
            return server_error(None);
        }
    };

    ApiResponse {
        status,
        envelope: Some(ResponseEnvelope::success(data, message)),
    }
}

/// Error response with a message and optional field-level details
pub fn error(message: &str, status: StatusCode, errors: Option<Value>) -> ApiResponse {
    ApiResponse {
        status,
        envelope: Some(ResponseEnvelope::error(message, errors)),
    }
}

pub fn success_with_data<T: Serialize>(data: T, message: Option<&str>, status: StatusCode) -> ApiResponse {
    success(Some(data), message, status)
}

pub fn success_with_message(message: &str, status: StatusCode) -> ApiResponse {
    success(None::<Value>, Some(message), status)
}

pub fn created<T: Serialize>(data: Option<T>, message: Option<&str>) -> ApiResponse {
    success(data, Some(message.unwrap_or("Resource created successfully")), StatusCode::CREATED)
}

pub fn updated<T: Serialize>(data: Option<T>, message: Option<&str>) -> ApiResponse {
    success(data, Some(message.unwrap_or("Resource updated successfully")), StatusCode::OK)
}

pub fn deleted(message: Option<&str>) -> ApiResponse {
    success_with_message(message.unwrap_or("Resource deleted successfully"), StatusCode::OK)
}

pub fn not_found(message: Option<&str>) -> ApiResponse {
    error(message.unwrap_or("Resource not found"), StatusCode::NOT_FOUND, None)
}

pub fn unauthorized(message: Option<&str>) -> ApiResponse {
    error(message.unwrap_or("Unauthorized"), StatusCode::UNAUTHORIZED, None)
}

pub fn forbidden(message: Option<&str>) -> ApiResponse {
    error(message.unwrap_or("Forbidden"), StatusCode::FORBIDDEN, None)
}

pub fn validation_error(errors: Value, message: Option<&str>) -> ApiResponse {
    error(
        message.unwrap_or("Validation error"),
        StatusCode::UNPROCESSABLE_ENTITY,
        Some(errors),
    )
}

pub fn server_error(message: Option<&str>) -> ApiResponse {
    error(
        message.unwrap_or("Internal server error"),
        StatusCode::INTERNAL_SERVER_ERROR,
        None,
    )
}

pub fn conflict(message: Option<&str>) -> ApiResponse {
    error(message.unwrap_or("Conflict detected"), StatusCode::CONFLICT, None)
}

pub fn no_content() -> ApiResponse {
    ApiResponse {
        status: StatusCode::NO_CONTENT,
        envelope: None,
    }
}
