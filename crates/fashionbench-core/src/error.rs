//! Error types for scoring configuration and responders.
//!
//! `ResponderError` lives in `fashionbench-core` so the eval engine can
//! downcast and classify responder failures for retry decisions without
//! string matching.

use thiserror::Error;

/// Errors raised by the scoring layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    /// Weights sum to zero, are negative or non-finite, or name a component
    /// that was never scored.
    #[error("invalid weights: {reason}")]
    InvalidWeights { reason: String },

    /// An example lacks what its task category needs to be scored.
    #[error("malformed example {example_id}: {reason}")]
    MalformedExample { example_id: u64, reason: String },
}

impl ScoringError {
    pub(crate) fn invalid_weights(reason: impl Into<String>) -> Self {
        ScoringError::InvalidWeights {
            reason: reason.into(),
        }
    }
}

/// Errors that can occur while obtaining a model's output for an example.
#[derive(Debug, Error)]
pub enum ResponderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The model replied, but not in a shape we can score.
    #[error("unparseable response: {0}")]
    UnparseableResponse(String),

    /// A replayed transcript has no entry for this example.
    #[error("no recorded response for {task} example {example_id}")]
    MissingResponse { task: String, example_id: u64 },
}

impl ResponderError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ResponderError::AuthenticationFailed(_)
                | ResponderError::ModelNotFound(_)
                | ResponderError::UnparseableResponse(_)
                | ResponderError::MissingResponse { .. }
        )
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ResponderError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permanent_errors_are_not_retried() {
        assert!(ResponderError::AuthenticationFailed("bad key".into()).is_permanent());
        assert!(ResponderError::MissingResponse {
            task: "style_classification".into(),
            example_id: 3
        }
        .is_permanent());
        assert!(!ResponderError::Timeout(30).is_permanent());
        assert!(!ResponderError::RateLimited {
            retry_after_ms: 500
        }
        .is_permanent());
    }

    #[test]
    fn retry_after_only_for_rate_limits() {
        let err = ResponderError::RateLimited {
            retry_after_ms: 2000,
        };
        assert_eq!(err.retry_after_ms(), Some(2000));
        assert_eq!(ResponderError::NetworkError("reset".into()).retry_after_ms(), None);
    }

    #[test]
    fn messages_render() {
        let err = ScoringError::invalid_weights("weights sum to zero");
        assert_eq!(err.to_string(), "invalid weights: weights sum to zero");
        let err = ScoringError::MalformedExample {
            example_id: 7,
            reason: "missing expected".into(),
        };
        assert!(err.to_string().contains("example 7"));
    }
}
