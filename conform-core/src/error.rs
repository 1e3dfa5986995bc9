//! Error types for Conform operations.

use uuid::Uuid;

/// The main error type for Conform operations.
#[derive(Debug, thiserror::Error)]
pub enum ConformError {
    /// Provider-specific errors
    #[error("Provider error: {0}")]
    Provider(String),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Rate limit errors
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// Timeout errors
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// A shape definition or application request is malformed
    #[error("Invalid definition: {}", .0.join("; "))]
    InvalidDefinition(Vec<String>),

    /// A completion payload does not satisfy the input shape
    #[error("Invalid input: {}", .0.join("; "))]
    InvalidInput(Vec<String>),

    /// No application is registered under this id
    #[error("Application not found: {0}")]
    NotFound(Uuid),

    /// The model never produced a conforming reply within the attempt ceiling
    #[error("Generation failed after {attempts} attempts: {last_error}")]
    GenerationFailed { attempts: u32, last_error: String },

    /// The caller aborted the completion
    #[error("Completion was cancelled")]
    Cancelled,

    /// Application store errors
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic errors
    #[error("Error: {0}")]
    Other(String),
}

impl ConformError {
    /// Create a provider error
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create an authentication error
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limit(msg: impl Into<String>) -> Self {
        Self::RateLimit(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Check if this is a retryable transport error
    ///
    /// Validation failures are never retryable here; those are fed back to
    /// the model by the orchestrator instead.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ConformError::Network(_) | ConformError::Timeout(_) | ConformError::RateLimit(_)
        )
    }

    /// Issue messages carried by definition or input errors
    pub fn issues(&self) -> Option<&[String]> {
        match self {
            ConformError::InvalidDefinition(issues) | ConformError::InvalidInput(issues) => {
                Some(issues)
            }
            _ => None,
        }
    }
}
