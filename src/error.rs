//! Error types for thumbnail generation.

use std::time::Duration;

/// Errors that can occur while generating or editing a thumbnail.
#[derive(Debug, thiserror::Error)]
pub enum ThumbnailError {
    /// Required input missing; raised before any network call.
    #[error("{0}")]
    Validation(String),

    /// A request of the same kind is already in flight.
    #[error("request already in progress: {0}")]
    Busy(String),

    /// Referenced history entry does not exist.
    #[error("history entry not found: {0}")]
    NotFound(String),

    /// API key missing or invalid.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Billing or quota issue on the account.
    #[error("billing error: {0}")]
    Billing(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Sanitized error message from the response body.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Delay requested by the server, if any.
        retry_after: Option<Duration>,
    },

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Model answered with text instead of an image.
    #[error("the model returned a text explanation instead of an image: \"{0}\"")]
    TextResponse(String),

    /// Response was missing content or had an unexpected shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// Input image is not PNG, JPEG or WEBP.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// Transcoding to the download format failed.
    #[error("export failed: {0}")]
    Export(String),

    /// Invalid configuration value or file.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error (e.g., reading the subject image, saving a thumbnail).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ThumbnailError {
    /// Returns the message shown in the error region of the studio.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::ContentBlocked(msg) => msg.clone(),
            Self::RateLimited { .. } => {
                "The model is busy right now. Please wait a moment and try again.".into()
            }
            Self::Network(_) => {
                "Could not reach the generation service. Check your connection and try again."
                    .into()
            }
            other => other.to_string(),
        }
    }

    /// Returns true if the failure came from the model refusing the content.
    pub fn is_refusal(&self) -> bool {
        matches!(self, Self::ContentBlocked(_) | Self::TextResponse(_))
    }
}

/// Parses the `Retry-After` header as whole seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Maximum length of an API error body carried into an error message.
const MAX_ERROR_MESSAGE_LEN: usize = 300;

/// Strips an API error body down to a short, single-line message.
///
/// Gemini wraps errors as `{"error": {"message": ...}}`; the inner message is
/// preferred when present.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let extracted = serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| text.to_string());

    let single_line = extracted.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&single_line, MAX_ERROR_MESSAGE_LEN)
}

/// Truncates to `max` characters, appending an ellipsis when shortened.
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push_str("...");
    out
}

/// Result type alias for thumbnail operations.
pub type Result<T> = std::result::Result<T, ThumbnailError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_passes_through_validation() {
        let err = ThumbnailError::Validation("Please provide an image.".into());
        assert_eq!(err.user_message(), "Please provide an image.");
    }

    #[test]
    fn test_is_refusal() {
        assert!(ThumbnailError::ContentBlocked("safety".into()).is_refusal());
        assert!(ThumbnailError::TextResponse("I can't".into()).is_refusal());
        assert!(!ThumbnailError::Auth("bad key".into()).is_refusal());
        assert!(!ThumbnailError::RateLimited { retry_after: None }.is_refusal());
    }

    #[test]
    fn test_error_display() {
        let err = ThumbnailError::Api {
            status: 404,
            message: "Not found".into(),
        };
        assert_eq!(err.to_string(), "API error: 404 - Not found");

        let err = ThumbnailError::TextResponse("No faces allowed".into());
        assert_eq!(
            err.to_string(),
            "the model returned a text explanation instead of an image: \"No faces allowed\""
        );
    }

    #[test]
    fn test_sanitize_extracts_nested_message() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid.\n Please pass a valid key."}}"#;
        assert_eq!(
            sanitize_error_message(body),
            "API key not valid. Please pass a valid key."
        );
    }

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(1000);
        let out = sanitize_error_message(&body);
        assert_eq!(out.chars().count(), MAX_ERROR_MESSAGE_LEN + 3);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = reqwest::header::HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);
        headers.insert(reqwest::header::RETRY_AFTER, "30".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), Some(30));
    }
}
