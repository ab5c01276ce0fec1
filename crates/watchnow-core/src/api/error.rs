use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid email or password.")]
    InvalidCredentials,

    #[error("Unauthorized - session may have expired")]
    Unauthorized,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Request rejected: {0}")]
    BadRequest(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            400 => ApiError::BadRequest(truncated),
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::ServerError(format!("Status {}: {}", status, truncated)),
        }
    }

    /// True when the backend rejected the credential on an authenticated call.
    pub fn is_session_rejection(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    /// True when no response arrived at all (connect failure, timeout).
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::NetworkError(_))
    }

    /// Short detail suitable for "<action> failed: <detail>" messages.
    ///
    /// The backend answers validation failures with a plain-text body, so
    /// that body is preferred over the variant prefix when present.
    pub fn detail(&self) -> String {
        match self {
            ApiError::BadRequest(body)
            | ApiError::AccessDenied(body)
            | ApiError::NotFound(body)
            | ApiError::ServerError(body)
                if !body.trim().is_empty() =>
            {
                message_from_body(body).unwrap_or_else(|| body.clone())
            }
            ApiError::NetworkError(_) => "No response from server.".to_string(),
            other => other.to_string(),
        }
    }
}

/// Extract a `message` field from a JSON error body, if there is one.
fn message_from_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, "no"),
            ApiError::AccessDenied(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, ""),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_REQUEST, "Email already exists"),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, ""),
            ApiError::ServerError(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::IM_A_TEAPOT, ""),
            ApiError::ServerError(_)
        ));
    }

    #[test]
    fn test_truncate_body() {
        let long = "x".repeat(600);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.starts_with(&"x".repeat(500)));
        assert!(truncated.contains("600 total bytes"));
        assert_eq!(ApiError::truncate_body("short"), "short");
    }

    #[test]
    fn test_truncate_body_respects_char_boundaries() {
        let long = "é".repeat(400);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.contains("800 total bytes"));
    }

    #[test]
    fn test_detail_prefers_body() {
        let err = ApiError::BadRequest("Email already exists".to_string());
        assert_eq!(err.detail(), "Email already exists");

        let err = ApiError::ServerError(r#"{"message":"boom"}"#.to_string());
        assert_eq!(err.detail(), "boom");

        let err = ApiError::NotFound(String::new());
        assert_eq!(err.detail(), "Resource not found: ");
    }

    #[test]
    fn test_invalid_credentials_message() {
        assert_eq!(
            ApiError::InvalidCredentials.to_string(),
            "Invalid email or password."
        );
    }
}
