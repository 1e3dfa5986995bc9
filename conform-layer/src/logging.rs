//! Logging layer for provider operations.

use conform_core::error::ConformError;
use conform_core::layer::{Layer, LayeredProvider};
use conform_core::provider::Provider;
use conform_core::types::*;
use async_trait::async_trait;

/// Logging layer that logs every model call with its timing.
#[derive(Debug, Clone)]
pub struct LoggingLayer {
    prefix: String,
}

impl LoggingLayer {
    /// Create a new logging layer
    pub fn new() -> Self {
        Self {
            prefix: "[Conform]".to_string(),
        }
    }

    /// Create a logging layer with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LoggingLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Provider> Layer<P> for LoggingLayer {
    type LayeredProvider = LoggingProvider<P>;

    fn layer(&self, inner: P) -> Self::LayeredProvider {
        LoggingProvider {
            inner,
            prefix: self.prefix.clone(),
        }
    }
}

/// Provider wrapped with logging
#[derive(Debug)]
pub struct LoggingProvider<P> {
    inner: P,
    prefix: String,
}

impl<P> LoggingProvider<P> {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

#[async_trait]
impl<P: Provider> LayeredProvider for LoggingProvider<P> {
    type Inner = P;

    fn inner(&self) -> &Self::Inner {
        &self.inner
    }

    async fn layered_complete(
        &self,
        req: CompletionRequest,
    ) -> Result<CompletionResponse, ConformError> {
        tracing::debug!(
            "{} complete request: model={}, prompt_chars={}",
            self.prefix,
            req.model,
            req.prompt.len()
        );

        let start = std::time::Instant::now();
        let result = self.inner.complete(req).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::debug!(
                    "{} complete success: model={}, reply_chars={}, tokens={}, elapsed={:?}",
                    self.prefix,
                    response.model,
                    response.text.len(),
                    response.usage.total_tokens,
                    elapsed
                );
            }
            Err(e) => {
                tracing::error!(
                    "{} complete error: {:?}, elapsed={:?}",
                    self.prefix,
                    e,
                    elapsed
                );
            }
        }

        result
    }
}

conform_core::impl_layered_provider!(LoggingProvider);
