//! # Conform Layers
//!
//! Built-in provider layers for Conform.
//!
//! Currently implemented layers:
//! - `LoggingLayer`: Logs every model call with timing information
//! - `RetryLayer`: Automatic retry with exponential backoff for transport errors
//!
//! ## Usage
//!
//! ```ignore
//! use conform_core::Orchestrator;
//! use conform_layer::{LoggingLayer, RetryLayer};
//!
//! let orchestrator = Orchestrator::builder(provider)
//!     .layer(LoggingLayer::new())
//!     .layer(RetryLayer::new().with_max_retries(3))
//!     .finish();
//! ```

pub mod logging;
pub mod retry;

// Re-exports
pub use logging::LoggingLayer;
pub use retry::RetryLayer;
