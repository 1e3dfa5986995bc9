//! The generate/validate state machine.
//!
//! Phases and events are closed enums and [`transition`] is a pure table, so
//! the control flow of a completion call can be read (and tested) without
//! running a model.

use crate::runtime::history::Diagnostic;
use crate::shape::{ShapeDefinition, ShapeKind};
use serde_json::Value;

/// Where a completion call currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Build the prompt and call the model
    Generate,
    /// Check the latest reply against the output shape
    Validate,
    /// A reply conformed; terminal
    Done,
    /// The call ended without a conforming reply; terminal
    Failed,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Done | Phase::Failed)
    }
}

/// What happened in the current phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The model returned a reply
    Replied,
    /// The reply passed every check
    Accepted,
    /// The reply failed a check and attempts remain
    Rejected,
    /// The reply failed a check and the attempt ceiling is reached
    Exhausted,
    /// Cancellation, a transport failure, or a fatal verdict
    Aborted,
}

/// Transition table. `None` marks an event that cannot occur in `phase`.
pub fn transition(phase: Phase, event: Event) -> Option<Phase> {
    match (phase, event) {
        (Phase::Generate, Event::Replied) => Some(Phase::Validate),
        (Phase::Generate, Event::Aborted) => Some(Phase::Failed),
        (Phase::Validate, Event::Accepted) => Some(Phase::Done),
        (Phase::Validate, Event::Rejected) => Some(Phase::Generate),
        (Phase::Validate, Event::Exhausted) => Some(Phase::Failed),
        (Phase::Validate, Event::Aborted) => Some(Phase::Failed),
        _ => None,
    }
}

/// Outcome of validating one reply
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The reply conforms; carries the decoded object
    Valid(Value),
    /// The reply is malformed; the diagnostic goes back to the model
    Retry(Diagnostic),
    /// Retrying cannot help
    Fatal(String),
}

/// Validate a raw reply against an output shape.
///
/// Checks run in order: the trimmed reply must be wrapped in braces, must
/// decode as JSON, and must satisfy the shape.
pub fn validate_reply(reply: &str, shape: &ShapeDefinition) -> Verdict {
    if shape.kind() != ShapeKind::Output {
        return Verdict::Fatal("replies can only be validated against an output shape".to_string());
    }

    let trimmed = reply.trim();
    if !(trimmed.starts_with('{') && trimmed.ends_with('}')) {
        return Verdict::Retry(Diagnostic::not_json());
    }

    let value: Value = match serde_json::from_str(trimmed) {
        Ok(value) => value,
        Err(err) => return Verdict::Retry(Diagnostic::parse(&err)),
    };

    let Some(object) = value.as_object() else {
        return Verdict::Retry(Diagnostic::not_json());
    };

    match shape.check(object) {
        Some(issues) => Verdict::Retry(Diagnostic::schema(&issues)),
        None => Verdict::Valid(value),
    }
}
