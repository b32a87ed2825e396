//! Error types for function generation
//!
//! This module defines strongly-typed errors for generated-function invocation
//! and for generation strategies, using thiserror for the trait implementations.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Boxed error used for transform failures and wrapped causes
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A caller-declared failure bound to an error condition.
///
/// Raising a condition returns this value unchanged inside a [`FunctionError`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Failure {
    kind: String,
    message: String,
}

impl Failure {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self { kind: kind.into(), message: message.into() }
    }

    /// Failure category named by the caller, e.g. `IllegalArgument`
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Main error type for generated-function invocation
#[derive(Debug, Error)]
pub enum FunctionError {
    /// Malformed configuration or null input
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A local pre-execution check matched the input
    #[error("{0}")]
    LocalCondition(Failure),

    /// The backend reported an error matching a declared execution error
    #[error("{0}")]
    RemoteCondition(Failure),

    /// The backend reported an error no declared condition accounts for
    #[error("Error invoking function: {message}")]
    UnclassifiedRemote { message: String },

    /// The response was not valid JSON or did not decode into the output type
    #[error("Malformed response: {message}")]
    MalformedResponse {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The response decoded to nothing
    #[error("Function returned an empty result")]
    EmptyResult,

    /// The generation strategy failed
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// A composed pre- or post-processing transform failed
    #[error("Transform failed: {source}")]
    Transform {
        #[source]
        source: BoxError,
    },

    /// Any other unexpected failure during invocation
    #[error("Unexpected error invoking function: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl FunctionError {
    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument { message: message.into() }
    }

    /// Create an unclassified remote error
    pub fn unclassified(message: impl Into<String>) -> Self {
        Self::UnclassifiedRemote { message: message.into() }
    }

    /// Create a malformed response error without an underlying parse error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse { message: message.into(), source: None }
    }

    /// Create a malformed response error wrapping a JSON parse error
    pub fn malformed_json(message: impl Into<String>, source: serde_json::Error) -> Self {
        Self::MalformedResponse { message: message.into(), source: Some(source) }
    }

    /// Create a transform error
    pub fn transform(source: impl Into<BoxError>) -> Self {
        Self::Transform { source: source.into() }
    }

    /// Create an internal error wrapping its cause
    pub fn internal(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Internal { message: message.into(), source: Some(source.into()) }
    }

    /// The caller-declared failure, if this error came from an error condition
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::LocalCondition(failure) | Self::RemoteCondition(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Result type for generated-function invocation
pub type FunctionResult<T> = Result<T, FunctionError>;

/// Error type for generation strategies
#[derive(Debug, Error)]
pub enum GenerationError {
    /// API key is missing or invalid
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Rate limit has been exceeded
    #[error("Rate limit exceeded: {message}. Retry after {retry_after:?}")]
    RateLimitExceeded { message: String, retry_after: Option<Duration> },

    /// Request timed out
    #[error("Request timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Network error occurred
    #[error("Network error: {message}")]
    Network { message: String },

    /// API returned an error
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The backend answered but the reply carried no usable content
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl GenerationError {
    /// Create an authentication error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Authentication { message: message.into() }
    }

    /// Create a rate limit error
    pub fn rate_limit(message: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self::RateLimitExceeded { message: message.into(), retry_after }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into() }
    }

    /// Create an API error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api { status, message: message.into() }
    }

    /// Create an invalid response error
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse { message: message.into() }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Whether repeating the same request later might succeed.
    ///
    /// Informational only; nothing in this crate retries.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimitExceeded { .. } | Self::Timeout { .. } | Self::Network { .. } => true,
            Self::Api { status, message } => {
                let lower = message.to_lowercase();
                *status == 429
                    || (500..600).contains(status)
                    || lower.contains("timeout")
                    || lower.contains("temporar")
            }
            _ => false,
        }
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::api(status.as_u16(), err.to_string());
        }
        Self::Network { message: err.to_string() }
    }
}

impl From<serde_json::Error> for GenerationError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse { message: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FunctionError::invalid_argument("Input cannot be null");
        assert_eq!(err.to_string(), "Invalid argument: Input cannot be null");

        let err = FunctionError::LocalCondition(Failure::new("IllegalArgument", "empty input"));
        assert_eq!(err.to_string(), "IllegalArgument: empty input");

        let err = FunctionError::unclassified("Input is not a number");
        assert!(err.to_string().contains("Input is not a number"));

        let err = GenerationError::api(503, "Service Unavailable");
        assert_eq!(err.to_string(), "API error (status 503): Service Unavailable");
    }

    #[test]
    fn test_failure_accessor() {
        let failure = Failure::new("UnsupportedOperation", "Negative numbers are not supported");
        let err = FunctionError::RemoteCondition(failure.clone());
        assert_eq!(err.failure(), Some(&failure));
        assert_eq!(FunctionError::EmptyResult.failure(), None);
    }

    #[test]
    fn test_transient_classification() {
        assert!(GenerationError::api(429, "slow down").is_transient());
        assert!(GenerationError::api(502, "bad gateway").is_transient());
        assert!(GenerationError::api(400, "upstream timeout").is_transient());
        assert!(GenerationError::api(400, "Temporarily unavailable").is_transient());
        assert!(!GenerationError::api(400, "bad request").is_transient());
        assert!(GenerationError::rate_limit("quota", None).is_transient());
        assert!(GenerationError::network("connection reset").is_transient());
        assert!(!GenerationError::auth("bad key").is_transient());
    }

    #[test]
    fn test_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: GenerationError = json_err.into();
        assert!(matches!(err, GenerationError::InvalidResponse { .. }));

        let err: FunctionError = GenerationError::network("down").into();
        assert!(matches!(err, FunctionError::Generation(GenerationError::Network { .. })));
    }
}
