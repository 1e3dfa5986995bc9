//! # Conform Providers
//!
//! Model provider implementations for Conform.

pub mod blocking;
pub mod openai;

// Re-exports
pub use blocking::BlockingProvider;
pub use openai::{OpenAiBuilder, OpenAiProvider};

use conform_core::error::ConformError;

/// Create a DeepSeek provider (OpenAI-compatible)
///
/// DeepSeek uses the OpenAI API protocol but with a different endpoint.
///
/// # Example
///
/// ```ignore
/// use conform_provider::deepseek;
///
/// let provider = deepseek("your-api-key")?;
/// ```
pub fn deepseek(api_key: impl Into<String>) -> Result<OpenAiProvider, ConformError> {
    OpenAiProvider::builder()
        .api_key(api_key)
        .api_base("https://api.deepseek.com/v1")
        .build_with_id("deepseek", "DeepSeek")
}
