//! Completion failures.

use thiserror::Error;

/// A chat completion that did not produce an assistant message.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport failure (connect, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx status from the API (rate limit, auth, invalid request).
    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The body was not a chat completion response.
    #[error("failed to parse completion response: {0}")]
    Parse(String),

    /// The API answered with zero choices.
    #[error("completion response contained no choices")]
    NoChoices,
}

impl ProviderError {
    /// Whether the API rejected the call for rate limiting.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ProviderError::Status { status: 429, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let err = ProviderError::Status {
            status: 401,
            body: "invalid api key".into(),
        };
        assert_eq!(err.to_string(), "API returned 401: invalid api key");
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn test_rate_limited() {
        let err = ProviderError::Status {
            status: 429,
            body: String::new(),
        };
        assert!(err.is_rate_limited());
        assert!(!ProviderError::NoChoices.is_rate_limited());
    }
}
