use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecipeClientError {
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Token file error: {0}")]
    TokenFile(#[from] std::io::Error),
    #[error("Token file is corrupt: {0}")]
    TokenFormat(#[from] serde_json::Error),
    #[error("Not logged in, run `login` first")]
    NotLoggedIn,
    #[error("Not found")]
    NotFound,
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Server responded with {status}: {message}")]
    StatusError { status: u16, message: String },
}

impl RecipeClientError {
    pub async fn from_http_response(resp: reqwest::Response) -> Self {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Self::from_status(status, &body)
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = describe(body);
        match status {
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized(message),
            StatusCode::BAD_REQUEST => Self::InvalidRequest(message),
            _ => Self::StatusError {
                status: status.as_u16(),
                message,
            },
        }
    }
}

/// Error bodies are either `{"detail": "..."}` or a map of field to messages.
fn describe(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => {
            if let Some(Value::String(detail)) = map.get("detail") {
                return detail.clone();
            }
            map.iter()
                .map(|(field, messages)| format!("{}: {}", field, flatten(messages)))
                .collect::<Vec<_>>()
                .join("; ")
        }
        _ => body.trim().to_string(),
    }
}

fn flatten(value: &Value) -> String {
    match value {
        Value::Array(items) => items.iter().map(flatten).collect::<Vec<_>>().join(" "),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn detail_body_becomes_message() {
        let err = RecipeClientError::from_status(
            StatusCode::UNAUTHORIZED,
            r#"{"detail": "No active account found with the given credentials"}"#,
        );
        assert!(matches!(
            err,
            RecipeClientError::Unauthorized(msg) if msg == "No active account found with the given credentials"
        ));
    }

    #[test]
    fn field_errors_are_joined_in_field_order() {
        let err = RecipeClientError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"title": ["This field may not be blank."], "price": ["Too many digits.", "Out of range."]}"#,
        );
        match err {
            RecipeClientError::InvalidRequest(msg) => assert_eq!(
                msg,
                "price: Too many digits. Out of range.; title: This field may not be blank."
            ),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[rstest]
    #[case(StatusCode::NOT_FOUND, "")]
    #[case(StatusCode::NOT_FOUND, r#"{"detail": "Not found."}"#)]
    fn not_found_ignores_body(#[case] status: StatusCode, #[case] body: &str) {
        assert!(matches!(
            RecipeClientError::from_status(status, body),
            RecipeClientError::NotFound
        ));
    }

    #[test]
    fn other_statuses_keep_code_and_raw_text() {
        let err = RecipeClientError::from_status(StatusCode::BAD_GATEWAY, "upstream down\n");
        match err {
            RecipeClientError::StatusError { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
