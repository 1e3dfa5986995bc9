//! Adapter for synchronous model clients.
//!
//! Many vendor SDKs and local runtimes only expose a blocking call. The
//! wrapped function runs on tokio's blocking pool so the async executor is
//! never stalled while the model thinks.

use async_trait::async_trait;
use conform_core::error::ConformError;
use conform_core::provider::Provider;
use conform_core::types::*;
use std::sync::Arc;

type BlockingFn = dyn Fn(&str) -> anyhow::Result<String> + Send + Sync + 'static;

/// Provider backed by a blocking `prompt -> reply` function.
#[derive(Clone)]
pub struct BlockingProvider {
    call: Arc<BlockingFn>,
    info: Arc<ProviderInfo>,
}

impl std::fmt::Debug for BlockingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingProvider")
            .field("info", &self.info)
            .finish()
    }
}

impl BlockingProvider {
    pub fn new<F>(call: F) -> Self
    where
        F: Fn(&str) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        Self::with_id("blocking", "Blocking", call)
    }

    pub fn with_id<F>(id: impl Into<String>, name: impl Into<String>, call: F) -> Self
    where
        F: Fn(&str) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        Self {
            call: Arc::new(call),
            info: Arc::new(ProviderInfo {
                id: id.into(),
                name: name.into(),
            }),
        }
    }
}

#[async_trait]
impl Provider for BlockingProvider {
    fn info(&self) -> Arc<ProviderInfo> {
        self.info.clone()
    }

    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse, ConformError> {
        let call = self.call.clone();
        let prompt = req.prompt;

        let text = tokio::task::spawn_blocking(move || call(&prompt))
            .await
            .map_err(|e| {
                tracing::error!(provider = %self.info.id, error = %e, "blocking call did not finish");
                ConformError::other(format!("Blocking call did not finish: {}", e))
            })?
            .map_err(|e| {
                tracing::debug!(provider = %self.info.id, error = %format!("{:#}", e), "blocking call failed");
                ConformError::provider(format!("{:#}", e))
            })?;

        Ok(CompletionResponse::new(text, req.model))
    }
}
