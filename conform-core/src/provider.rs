//! Provider trait for model transports.

use crate::error::ConformError;
use crate::types::*;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

/// Core provider trait for model services.
///
/// The contract is text in, text out. Implementations must not block the
/// async runtime; a synchronous client belongs behind an adapter that moves
/// the call onto a blocking thread.
#[async_trait]
pub trait Provider: Send + Sync + Debug + 'static {
    /// Get provider information
    fn info(&self) -> Arc<ProviderInfo>;

    /// Run one completion
    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse, ConformError>;
}

#[async_trait]
impl<P: Provider + ?Sized> Provider for Arc<P> {
    fn info(&self) -> Arc<ProviderInfo> {
        (**self).info()
    }

    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse, ConformError> {
        (**self).complete(req).await
    }
}
