use std::collections::BTreeMap;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Field name to messages, rendered as the body of a 400 response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<&str> = self.0.keys().map(String::as_str).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

impl From<validator::ValidationErrors> for FieldErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, errs) in errors.field_errors() {
            for err in errs {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                fields.add(field.to_string(), message);
            }
        }
        fields
    }
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0}")]
    Validation(FieldErrors),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("email is required")]
    EmailRequired,
    #[error("not found")]
    NotFound,
    #[error("authentication credentials were not provided")]
    Unauthorized,
    #[error("token is invalid or expired")]
    InvalidToken,
    #[error("no active account found with the given credentials")]
    InvalidCredentials,
    #[error("storage error: {0}")]
    Storage(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn field(field: &str, message: &str) -> Self {
        DomainError::Validation(FieldErrors::single(field, message))
    }
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        DomainError::Validation(errors.into())
    }
}

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        match self {
            DomainError::Validation(_) | DomainError::BadRequest(_) | DomainError::EmailRequired => {
                StatusCode::BAD_REQUEST
            }
            DomainError::NotFound => StatusCode::NOT_FOUND,
            DomainError::Unauthorized
            | DomainError::InvalidToken
            | DomainError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            DomainError::Storage(_) | DomainError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            DomainError::Validation(fields) => json!(fields),
            DomainError::EmailRequired => json!({ "email": ["This field may not be blank."] }),
            DomainError::BadRequest(detail) => json!({ "detail": detail }),
            DomainError::NotFound => json!({ "detail": "Not found." }),
            DomainError::Unauthorized => {
                json!({ "detail": "Authentication credentials were not provided." })
            }
            DomainError::InvalidToken => {
                json!({ "detail": "Given token not valid for any token type" })
            }
            DomainError::InvalidCredentials => {
                json!({ "detail": "No active account found with the given credentials" })
            }
            // internal detail stays in the logs
            DomainError::Storage(_) | DomainError::Internal(_) => {
                json!({ "detail": "A server error occurred." })
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_render_as_field_map() {
        let mut fields = FieldErrors::new();
        fields.add("name", "This field may not be blank.");
        fields.add("name", "second");
        let body = serde_json::to_value(&fields).unwrap();
        assert_eq!(body, json!({ "name": ["This field may not be blank.", "second"] }));

        let err = DomainError::Validation(fields);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn ownership_misses_are_not_found() {
        assert_eq!(DomainError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            DomainError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }
}
