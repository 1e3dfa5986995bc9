//! Retry orchestrator.
//!
//! This module drives a model call through successive attempts until its
//! reply satisfies an application's output shape:
//! - `state`: phases, events, the transition table and reply validation
//! - `history`: the per-call attempt history and its diagnostics
//! - `config`: attempt ceiling, model settings and exhaustion policy
//! - `executor`: the [`Orchestrator`] that runs the loop

pub mod config;
pub mod executor;
pub mod history;
pub mod state;

pub use config::{ExhaustionPolicy, OrchestratorConfig};
pub use executor::{Completion, Orchestrator, OrchestratorBuilder};
pub use history::{AttemptHistory, Diagnostic, DiagnosticKind, HistoryEntry};
pub use state::{transition, validate_reply, Event, Phase, Verdict};
