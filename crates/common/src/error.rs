//! Error types for inkwell.

use std::collections::BTreeMap;
use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::flash::Flash;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Messages per rejected input field, keyed by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

fn summarize(fields: &FieldErrors) -> String {
    fields
        .iter()
        .map(|(field, messages)| format!("{field}: {}", messages.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Unique key that a write collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateField {
    /// `users.username`
    Username,
    /// `users.email`
    Email,
}

impl DuplicateField {
    /// Form field name the conflict is reported against.
    #[must_use]
    pub const fn field_name(&self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Email => "email",
        }
    }
}

impl fmt::Display for DuplicateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "That {} is taken. Please choose a different one.",
            self.field_name()
        )
    }
}

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Validation error: {}", summarize(.0))]
    InvalidInput(FieldErrors),

    #[error("{0}")]
    Duplicate(DuplicateField),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("That is an invalid or expired token")]
    ExpiredOrInvalid,

    // === Server Errors ===
    #[error("Dependency failure: {0}")]
    DependencyFailure(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// A single rejected field.
    #[must_use]
    pub fn field(name: &str, message: impl Into<String>) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert(name.to_string(), vec![message.into()]);
        Self::InvalidInput(fields)
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::Validation(_) | Self::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Duplicate(_) => StatusCode::CONFLICT,
            Self::InvalidCredentials | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ExpiredOrInvalid => StatusCode::BAD_REQUEST,

            // 5xx Server Errors
            Self::DependencyFailure(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::InvalidInput(_) => "VALIDATION_ERROR",
            Self::Duplicate(_) => "DUPLICATE",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::ExpiredOrInvalid => "EXPIRED_OR_INVALID_TOKEN",
            Self::DependencyFailure(_) => "DEPENDENCY_FAILURE",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Message shown to the caller. Server-side details stay in the logs.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::DependencyFailure(_) => {
                "An external service failed. Please try again later.".to_string()
            }
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Status message attached to the response, if this error carries one.
    #[must_use]
    pub fn flash(&self) -> Option<Flash> {
        match self {
            Self::InvalidCredentials => Some(Flash::danger(
                "Login Unsuccessful. Please check email and password",
            )),
            Self::Unauthenticated => Some(Flash::info("Please log in to access this page.")),
            Self::ExpiredOrInvalid => Some(Flash::warning("That is an invalid or expired token")),
            _ => None,
        }
    }

    /// JSON body sent to the caller.
    #[must_use]
    pub fn body(&self) -> serde_json::Value {
        let mut body = json!({
            "error": {
                "code": self.error_code(),
                "message": self.public_message(),
            }
        });
        match self {
            Self::InvalidInput(fields) => body["error"]["fields"] = json!(fields),
            Self::Duplicate(field) => body["error"]["field"] = json!(field.field_name()),
            _ => {}
        }
        if let Some(flash) = self.flash() {
            body["flash"] = json!(flash);
        }
        body
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::warn!(error = %self, code = code, "Client error occurred");
        }

        (status, Json(self.body())).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let fields: FieldErrors = err
            .field_errors()
            .into_iter()
            .map(|(field, errors)| {
                let messages = errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map_or_else(|| e.code.to_string(), ToString::to_string)
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();

        if fields.is_empty() {
            Self::Validation(err.to_string())
        } else {
            Self::InvalidInput(fields)
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_taxonomy() {
        assert_eq!(
            AppError::Validation("title".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Duplicate(DuplicateField::Email).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::NotFound("post".into()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_server_errors_hide_details() {
        let err = AppError::Database("connection refused on 10.0.0.3".into());
        assert!(err.is_server_error());
        assert!(!err.public_message().contains("10.0.0.3"));

        let err = AppError::DependencyFailure("smtp: 535 auth failed".into());
        assert!(!err.public_message().contains("smtp"));
    }

    #[test]
    fn test_duplicate_message_names_field() {
        let err = AppError::Duplicate(DuplicateField::Username);
        assert_eq!(
            err.to_string(),
            "That username is taken. Please choose a different one."
        );
    }

    #[test]
    fn test_validation_errors_keep_fields() {
        let mut errors = validator::ValidationErrors::new();
        errors.add(
            "title",
            validator::ValidationError::new("length").with_message("Too long".into()),
        );
        errors.add("body", validator::ValidationError::new("not_blank"));

        let err = AppError::from(errors);
        let body = err.body();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["fields"]["title"], json!(["Too long"]));
        assert_eq!(body["error"]["fields"]["body"], json!(["not_blank"]));
    }

    #[test]
    fn test_single_field_error() {
        let err = AppError::field("email", "There is no account with that email.");
        assert_eq!(
            err.to_string(),
            "Validation error: email: There is no account with that email."
        );
        assert_eq!(
            err.body()["error"]["fields"]["email"][0],
            "There is no account with that email."
        );
    }

    #[test]
    fn test_duplicate_body_names_field() {
        let body = AppError::Duplicate(DuplicateField::Email).body();
        assert_eq!(body["error"]["code"], "DUPLICATE");
        assert_eq!(body["error"]["field"], "email");
        assert!(body.get("flash").is_none());
    }

    #[test]
    fn test_flash_only_on_session_errors() {
        assert!(AppError::InvalidCredentials.flash().is_some());
        assert!(AppError::ExpiredOrInvalid.flash().is_some());
        assert!(AppError::Forbidden.flash().is_none());
    }
}
