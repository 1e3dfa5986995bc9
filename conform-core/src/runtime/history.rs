//! Per-call attempt history.
//!
//! An [`AttemptHistory`] lives for exactly one completion call. Entry 0 is
//! the user's message; every later entry is either a raw model reply or a
//! [`Diagnostic`] explaining why that reply was rejected.

use std::fmt;

/// Which check rejected a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// The reply was not a decodable JSON object
    Json,
    /// The reply decoded but did not conform to the output shape
    Schema,
}

impl DiagnosticKind {
    /// Tag rendered in front of the diagnostic detail
    pub fn tag(&self) -> &'static str {
        match self {
            DiagnosticKind::Json => "ERROR_JSON",
            DiagnosticKind::Schema => "ERROR_SCHEMA",
        }
    }
}

/// Why a reply was rejected; fed back to the model on the next attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub detail: String,
}

impl Diagnostic {
    /// The reply is not wrapped in `{` ... `}`
    pub fn not_json() -> Self {
        Self {
            kind: DiagnosticKind::Json,
            detail: "Invalid response format. Respond only in JSON starting with '{' and ending with '}'"
                .to_string(),
        }
    }

    /// The reply looked like JSON but failed to decode
    pub fn parse(err: &serde_json::Error) -> Self {
        Self {
            kind: DiagnosticKind::Json,
            detail: format!("converting string to JSON: {}", err),
        }
    }

    /// The decoded reply has schema issues
    pub fn schema(issues: &[String]) -> Self {
        Self {
            kind: DiagnosticKind::Schema,
            detail: issues.join(", "),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.kind.tag(), self.detail)
    }
}

/// One entry of an [`AttemptHistory`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEntry {
    UserMessage(String),
    Reply(String),
    Diagnostic(Diagnostic),
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryEntry::UserMessage(text) | HistoryEntry::Reply(text) => f.write_str(text),
            HistoryEntry::Diagnostic(diagnostic) => diagnostic.fmt(f),
        }
    }
}

/// Ordered, append-only record of one completion call
#[derive(Debug, Clone)]
pub struct AttemptHistory {
    entries: Vec<HistoryEntry>,
}

impl AttemptHistory {
    pub fn new(user_message: impl Into<String>) -> Self {
        Self {
            entries: vec![HistoryEntry::UserMessage(user_message.into())],
        }
    }

    /// The original user message
    pub fn user_message(&self) -> &str {
        match &self.entries[0] {
            HistoryEntry::UserMessage(text) => text,
            _ => unreachable!("attempt history always starts with the user message"),
        }
    }

    /// Everything after the user message: prior replies and diagnostics
    pub fn attempts(&self) -> &[HistoryEntry] {
        &self.entries[1..]
    }

    /// The most recent model reply, if any attempt has been made
    pub fn latest_reply(&self) -> Option<&str> {
        self.entries.iter().rev().find_map(|entry| match entry {
            HistoryEntry::Reply(text) => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn push_reply(&mut self, reply: impl Into<String>) {
        self.entries.push(HistoryEntry::Reply(reply.into()));
    }

    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.entries.push(HistoryEntry::Diagnostic(diagnostic));
    }

    /// Diagnostics recorded so far, oldest first
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.attempts()
            .iter()
            .filter_map(|entry| match entry {
                HistoryEntry::Diagnostic(d) => Some(d.clone()),
                _ => None,
            })
            .collect()
    }
}
