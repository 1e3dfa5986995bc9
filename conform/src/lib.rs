//! # Conform
//!
//! Schema-bound LLM applications with validation-driven retries.
//!
//! An application pairs a prompt with an input shape and an output shape.
//! Each completion checks the caller's input, prompts the model and keeps
//! re-prompting with diagnostics until the reply matches the output shape
//! or the attempt ceiling is reached.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! conform = { version = "0.1", features = ["openai", "layers"] }
//! ```
//!
//! ```ignore
//! use conform::prelude::*;
//! use conform::provider::OpenAiBuilder;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<()> {
//! let provider = OpenAiBuilder::from_env().build()?;
//!
//! let orchestrator = Orchestrator::builder(provider)
//!     .layer(RetryLayer::new())
//!     .layer(LoggingLayer::new())
//!     .config(OrchestratorConfig::from_env()?)
//!     .finish();
//!
//! let service = ApplicationService::new(Arc::new(InMemoryStore::new()), orchestrator);
//! let id = service.create_application(&definition).await?;
//! let reply = service.complete(id, serde_json::json!({"review_text": "Great!"})).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Includes the `openai` provider and built-in layers
//! - `openai`: OpenAI (and OpenAI-compatible) provider support
//! - `providers`: All available providers
//! - `layers`: Built-in layers (logging, retry)
//! - `full`: All features enabled

// Re-export core types and traits
pub use conform_core::*;

// Re-export providers under `provider` module
#[cfg(feature = "conform-provider")]
pub mod provider {
    //! Model provider implementations.
    pub use conform_provider::*;
}

// Re-export layers under `layer` module
#[cfg(feature = "conform-layer")]
pub mod layers {
    //! Built-in provider layers.
    pub use conform_layer::*;
}

/// Prelude module for convenient imports
pub mod prelude {
    //! Prelude module containing the most commonly used types and traits.
    //!
    //! ```
    //! use conform::prelude::*;
    //! ```

    pub use crate::{
        ApplicationService, ApplicationStore, Completion, ConformError, ExhaustionPolicy,
        InMemoryStore, Layer, Orchestrator, OrchestratorConfig, Provider, Result, ShapeKind,
    };

    #[cfg(feature = "conform-provider")]
    pub use crate::provider::*;

    #[cfg(feature = "conform-layer")]
    pub use crate::layers::*;
}
