//! Error types for the email drafter.

use std::time::Duration;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Configuration-related errors.
///
/// All of these are fatal at startup: they mean the deployment is missing or
/// carries a broken resource file, never that a request was bad.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: \"{file}\"")]
    NotFound { file: String },

    #[error("Invalid JSON in config file \"{file}\": {reason}")]
    InvalidJson { file: String, reason: String },

    #[error("Config validation failed for \"{file}\": {reason}")]
    Schema { file: String, reason: String },

    #[error("Invalid regex in \"{file}\" field {field}: {reason}")]
    InvalidRegex {
        file: String,
        field: String,
        reason: String,
    },

    #[error("Template not found for category: {category}")]
    MissingTemplate { category: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Classify a serde_json failure for `file` into syntax vs schema errors.
    pub fn from_json(file: &str, err: serde_json::Error) -> Self {
        use serde_json::error::Category;

        match err.classify() {
            Category::Data => Self::Schema {
                file: file.to_string(),
                reason: err.to_string(),
            },
            Category::Io => Self::Io(err.into()),
            Category::Syntax | Category::Eof => Self::InvalidJson {
                file: file.to_string(),
                reason: err.to_string(),
            },
        }
    }
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A single rejected request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Dotted path of the field, e.g. `tone.formality`.
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Errors surfaced at the HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Validation failed: {} field error(s)", .0.len())]
    Validation(Vec<FieldError>),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let Self::Validation(details) = self;
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "Validation failed",
                "details": details,
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_syntax_error_as_invalid_json() {
        let err = serde_json::from_str::<serde_json::Value>("{ not json").unwrap_err();
        let config_err = ConfigError::from_json("guardrails.json", err);
        assert!(matches!(config_err, ConfigError::InvalidJson { .. }));
        assert!(config_err.to_string().contains("guardrails.json"));
    }

    #[test]
    fn classifies_type_mismatch_as_schema_error() {
        #[derive(Debug, serde::Deserialize)]
        struct Shape {
            #[allow(dead_code)]
            slang_regex: String,
        }
        let err = serde_json::from_str::<Shape>(r#"{"slang_regex": 5}"#).unwrap_err();
        let config_err = ConfigError::from_json("guardrails.json", err);
        assert!(matches!(config_err, ConfigError::Schema { .. }));
    }

    #[test]
    fn missing_field_is_schema_error() {
        #[derive(Debug, serde::Deserialize)]
        struct Shape {
            #[allow(dead_code)]
            link_regex: String,
        }
        let err = serde_json::from_str::<Shape>("{}").unwrap_err();
        assert!(matches!(
            ConfigError::from_json("guardrails.json", err),
            ConfigError::Schema { .. }
        ));
    }

    #[test]
    fn validation_error_maps_to_bad_request() {
        let response =
            ApiError::Validation(vec![FieldError::new("text", "Text cannot be empty")])
                .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
