// Copyright (c) 2024-2025 Jesse Morgan
// Licensed under the MIT License. See LICENSE file for details.

//! Errors of the API client and their rendering for the terminal.
//!
//! [`ApiError`] is what every backend call returns. The backend is not
//! consistent about the shape of its error bodies, so [`extract_message`]
//! tries each known shape in turn. [`ErrorBuilder`] turns any failure into the
//! `[✗] title / Possible causes / Try these fixes` block printed by the CLI.

use std::fmt;
use thiserror::Error;

/// Message shown when the backend gave nothing usable.
pub const GENERIC_ERROR: &str = "An unexpected error occurred. Please try again.";

/// Errors returned by [`crate::api::ApiClient`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connection refused, DNS, timeout).
    #[error("could not reach the server: {0}")]
    Network(String),

    /// The backend answered with a non-2xx status.
    #[error("server returned {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status { status: u16, message: Option<String> },

    /// 401: the stored token is missing, expired or rejected.
    #[error("not authorized, log in again")]
    Unauthorized,

    /// A 2xx body that did not match the expected shape.
    #[error("unexpected response from the server: {0}")]
    Decode(String),

    #[error("invalid API URL '{0}'")]
    InvalidUrl(String),

    /// Login succeeded but the token could not be written locally.
    #[error("could not store credentials: {0}")]
    Storage(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Network failures and 5xx responses are worth a second attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(_) => true,
            ApiError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Unauthorized => Some(401),
            _ => None,
        }
    }

    /// The text to show the user: the backend's own message when it sent one,
    /// otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Status { message: Some(m), .. } => m.clone(),
            _ => fallback.to_string(),
        }
    }

    /// Build the status error for a failed response body.
    pub fn from_response(status: u16, body: &str) -> Self {
        if status == 401 {
            return ApiError::Unauthorized;
        }
        ApiError::Status { status, message: extract_message(body) }
    }

    /// Terminal report with likely causes and fixes for this failure.
    pub fn report(&self, title: &str) -> ErrorBuilder {
        let builder = ErrorBuilder::new(title).detail(self.to_string());
        match self {
            ApiError::Network(_) => builder
                .cause("The backend is not running")
                .cause("The configured API URL is wrong")
                .fix("Check the URL: optrack config show")
                .fix("Point to the right server: optrack config set-api-url <url>"),
            ApiError::Unauthorized => builder
                .cause("Your session expired or was closed")
                .fix("Log in again: optrack login"),
            ApiError::Status { status, .. } if *status >= 500 => builder
                .cause("The backend failed while handling the request")
                .fix("Wait a moment and retry"),
            ApiError::Status { .. } => builder.cause("The server rejected the request"),
            ApiError::Decode(_) => builder
                .cause("The backend version does not match this client")
                .fix("Check the URL: optrack config show"),
            ApiError::InvalidUrl(_) => builder
                .fix("Set a full URL, e.g. optrack config set-api-url http://localhost:8080"),
            ApiError::Storage(_) => builder
                .cause("The ~/.optrack directory is not writable")
                .fix("Check permissions of ~/.optrack"),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            ApiError::Status { status: status.as_u16(), message: None }
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// Recognised shapes, in order: a JSON string, `{"message": ..}`,
/// `{"mensaje": ..}`, `{"errores": [..]}` (joined with ", "), and finally a
/// non-JSON plain-text body.
pub fn extract_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    let value = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => value,
        // Plain-text bodies are used as-is, but never an HTML error page.
        Err(_) if body.starts_with('<') => return None,
        Err(_) => return Some(body.to_string()),
    };

    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
        serde_json::Value::Object(map) => {
            for key in ["message", "mensaje"] {
                if let Some(serde_json::Value::String(s)) = map.get(key) {
                    if !s.trim().is_empty() {
                        return Some(s.clone());
                    }
                }
            }
            match map.get("errores") {
                Some(serde_json::Value::Array(items)) if !items.is_empty() => Some(
                    items
                        .iter()
                        .map(|item| match item {
                            serde_json::Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect::<Vec<_>>()
                        .join(", "),
                ),
                _ => None,
            }
        }
        _ => None,
    }
}

// ============================================================================
// TERMINAL RENDERING
// ============================================================================

/// Formats an error message with title, causes and fixes.
pub fn format_error(title: &str, causes: &[&str], fixes: &[&str]) -> String {
    let mut output = format!("[✗] {}\n", title);

    if !causes.is_empty() {
        output.push_str("\nPossible causes:\n");
        for cause in causes {
            output.push_str(&format!("  - {}\n", cause));
        }
    }

    if !fixes.is_empty() {
        output.push_str("\nTry these fixes:\n");
        for (i, fix) in fixes.iter().enumerate() {
            output.push_str(&format!("  {}. {}\n", i + 1, fix));
        }
    }

    output
}

/// Builder for constructing formatted error messages.
///
/// ```
/// use optrack::error::ErrorBuilder;
///
/// let error = ErrorBuilder::new("Could not load products")
///     .cause("The backend is not running")
///     .fix("Check the URL: optrack config show")
///     .build();
/// assert!(error.starts_with("[✗] Could not load products"));
/// ```
#[derive(Debug, Clone)]
pub struct ErrorBuilder {
    title: String,
    detail: Option<String>,
    causes: Vec<String>,
    fixes: Vec<String>,
}

impl ErrorBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            detail: None,
            causes: Vec::new(),
            fixes: Vec::new(),
        }
    }

    /// One line printed under the title (usually the underlying error).
    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn cause(mut self, cause: impl Into<String>) -> Self {
        self.causes.push(cause.into());
        self
    }

    pub fn fix(mut self, fix: impl Into<String>) -> Self {
        self.fixes.push(fix.into());
        self
    }

    pub fn build(&self) -> String {
        let title = match &self.detail {
            Some(detail) => format!("{}\n    {}", self.title, detail),
            None => self.title.clone(),
        };
        let causes: Vec<&str> = self.causes.iter().map(String::as_str).collect();
        let fixes: Vec<&str> = self.fixes.iter().map(String::as_str).collect();
        format_error(&title, &causes, &fixes)
    }
}

impl fmt::Display for ErrorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_message_shapes() {
        assert_eq!(extract_message(r#""OP already exists""#), Some("OP already exists".into()));
        assert_eq!(
            extract_message(r#"{"message":"Invalid credentials"}"#),
            Some("Invalid credentials".into())
        );
        assert_eq!(
            extract_message(r#"{"mensaje":"Equipo no encontrado"}"#),
            Some("Equipo no encontrado".into())
        );
        assert_eq!(
            extract_message(r#"{"errores":["name is required","email is invalid"]}"#),
            Some("name is required, email is invalid".into())
        );
        assert_eq!(extract_message("Bad credentials"), Some("Bad credentials".into()));
    }

    #[test]
    fn test_extract_message_falls_back() {
        assert_eq!(extract_message(""), None);
        assert_eq!(extract_message(r#"{"status":500}"#), None);
        assert_eq!(extract_message(r#"{"errores":[]}"#), None);
        assert_eq!(extract_message("<html><body>502</body></html>"), None);
        assert_eq!(extract_message("42"), None);

        let err = ApiError::from_response(500, r#"{"status":500}"#);
        assert_eq!(err.user_message("Could not save the product"), "Could not save the product");
    }

    #[test]
    fn test_message_key_precedence() {
        let body = r#"{"message":"first","mensaje":"second","errores":["third"]}"#;
        assert_eq!(extract_message(body), Some("first".into()));
        let body = r#"{"message":"","mensaje":"second"}"#;
        assert_eq!(extract_message(body), Some("second".into()));
    }

    #[test]
    fn test_from_response_maps_401() {
        assert!(matches!(ApiError::from_response(401, "nope"), ApiError::Unauthorized));
        let err = ApiError::from_response(409, r#"{"message":"duplicate"}"#);
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.user_message("fallback"), "duplicate");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ApiError::Network("refused".into()).is_retryable());
        assert!(ApiError::Status { status: 503, message: None }.is_retryable());
        assert!(!ApiError::Status { status: 404, message: None }.is_retryable());
        assert!(!ApiError::Unauthorized.is_retryable());
        assert!(!ApiError::Decode("eof".into()).is_retryable());
    }

    #[test]
    fn test_format_error() {
        let error = format_error("Test Error", &["Cause 1", "Cause 2"], &["Fix 1", "Fix 2"]);
        assert!(error.contains("[✗] Test Error"));
        assert!(error.contains("Possible causes:"));
        assert!(error.contains("  - Cause 2"));
        assert!(error.contains("Try these fixes:"));
        assert!(error.contains("  2. Fix 2"));
    }

    #[test]
    fn test_empty_causes_and_fixes() {
        let error = format_error("Empty test", &[], &[]);
        assert_eq!(error, "[✗] Empty test\n");
    }

    #[test]
    fn test_api_error_report() {
        let report = ApiError::Network("connection refused".into())
            .report("Could not load teams")
            .to_string();
        assert!(report.starts_with("[✗] Could not load teams\n    could not reach the server"));
        assert!(report.contains("optrack config set-api-url"));
    }
}
