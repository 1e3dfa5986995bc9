//! # Conform Core
//!
//! Schema-bound model applications: shape validation plus a bounded,
//! validation-driven retry loop around a text-completion provider.
//!
//! An application pairs a prompt with an input shape and an output shape.
//! Completion requests are validated against the input shape, the model is
//! prompted, and its reply is checked against the output shape; malformed
//! replies are fed back to the model with a diagnostic until one conforms
//! or the attempt ceiling is reached.

pub mod application;
pub mod error;
pub mod layer;
pub mod prompt;
pub mod provider;
pub mod runtime;
pub mod service;
pub mod shape;
pub mod store;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-exports
pub use application::{
    validate_application_request, ApplicationRecord, ApplicationSpec, Interaction, Sender,
};
pub use error::ConformError;
pub use layer::{Layer, LayeredProvider};
pub use provider::Provider;
pub use runtime::{
    Completion, Diagnostic, DiagnosticKind, ExhaustionPolicy, Orchestrator, OrchestratorConfig,
};
pub use service::ApplicationService;
pub use shape::{
    validate_shape_definition, validate_value_against_shape, PropertySpec, ShapeDefinition,
    ShapeKind, TypeTag,
};
pub use store::{ApplicationStore, InMemoryStore};
pub use types::*;

/// Result type alias for Conform operations
pub type Result<T> = std::result::Result<T, ConformError>;
