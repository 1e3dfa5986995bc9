//! Orchestrator implementation.
//!
//! The [`Orchestrator`] drives one completion call through the
//! generate/validate state machine: render a prompt, call the model, check
//! the reply, and on failure feed the diagnostic back into the next attempt
//! until a reply conforms or the attempt ceiling is reached.

use crate::application::ApplicationRecord;
use crate::error::ConformError;
use crate::layer::Layer;
use crate::prompt::render_prompt;
use crate::provider::Provider;
use crate::runtime::config::{ExhaustionPolicy, OrchestratorConfig};
use crate::runtime::history::{AttemptHistory, Diagnostic};
use crate::runtime::state::{transition, validate_reply, Event, Phase, Verdict};
use crate::types::*;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Type-erased provider that can be shared across threads
type BoxedProvider = Arc<dyn Provider>;

/// Builder for composing an orchestrator from a provider and layers.
///
/// # Example
///
/// ```ignore
/// let orchestrator = Orchestrator::builder(openai_provider)
///     .layer(LoggingLayer::new())
///     .layer(RetryLayer::new())
///     .config(OrchestratorConfig::default().with_max_attempts(3))
///     .finish();
/// ```
pub struct OrchestratorBuilder<P> {
    provider: P,
    config: OrchestratorConfig,
}

impl<P: Provider> OrchestratorBuilder<P> {
    /// Create a new builder with a provider
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            config: OrchestratorConfig::default(),
        }
    }

    /// Add a layer to wrap the provider
    pub fn layer<L>(self, layer: L) -> OrchestratorBuilder<L::LayeredProvider>
    where
        L: Layer<P>,
    {
        OrchestratorBuilder {
            provider: layer.layer(self.provider),
            config: self.config,
        }
    }

    /// Replace the configuration
    pub fn config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Finish building and create an Orchestrator
    pub fn finish(self) -> Orchestrator {
        Orchestrator {
            provider: Arc::new(self.provider),
            config: self.config,
        }
    }
}

/// Result of a completion call
#[derive(Debug, Clone)]
pub struct Completion {
    /// The decoded reply (or `{"message": raw}` for a pass-through of a
    /// non-JSON reply)
    pub value: Value,
    /// The raw text of the reply that was returned
    pub raw: String,
    /// Number of model calls made
    pub attempts: u32,
    /// Why earlier replies were rejected, oldest first
    pub diagnostics: Vec<Diagnostic>,
    /// True when the ceiling was hit and the reply was passed through
    /// unvalidated
    pub exhausted: bool,
}

/// Why a call reached `Phase::Failed`
enum Failure {
    Exhausted,
    Aborted(ConformError),
}

/// Retry orchestrator.
///
/// Holds no per-call state; any number of calls may run concurrently on one
/// instance.
#[derive(Clone)]
pub struct Orchestrator {
    provider: BoxedProvider,
    config: OrchestratorConfig,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("provider", &self.provider.info().id)
            .field("config", &self.config)
            .finish()
    }
}

impl Orchestrator {
    /// Create a new builder
    pub fn builder<P: Provider>(provider: P) -> OrchestratorBuilder<P> {
        OrchestratorBuilder::new(provider)
    }

    /// Get provider information
    pub fn info(&self) -> Arc<ProviderInfo> {
        self.provider.info()
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run a completion without a cancellation handle
    pub async fn run_completion(
        &self,
        user_message: &str,
        record: &ApplicationRecord,
    ) -> Result<Completion, ConformError> {
        self.run_completion_with_cancel(user_message, record, None)
            .await
    }

    /// Run a completion.
    ///
    /// `cancel` is checked immediately before and after every model call; a
    /// set flag ends the call with [`ConformError::Cancelled`]. Provider
    /// errors end the call unchanged. The attempt history is dropped when
    /// this returns.
    pub async fn run_completion_with_cancel(
        &self,
        user_message: &str,
        record: &ApplicationRecord,
        cancel: Option<&AtomicBool>,
    ) -> Result<Completion, ConformError> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut history = AttemptHistory::new(user_message);
        let mut phase = Phase::Generate;
        let mut attempts: u32 = 0;
        let mut accepted: Option<Value> = None;
        let mut failure: Option<Failure> = None;

        while !phase.is_terminal() {
            let event = match phase {
                Phase::Generate => match self.generate(record, &history, attempts + 1, cancel).await {
                    Ok(reply) => {
                        attempts += 1;
                        history.push_reply(reply);
                        Event::Replied
                    }
                    Err(err) => {
                        failure = Some(Failure::Aborted(err));
                        Event::Aborted
                    }
                },
                Phase::Validate => {
                    let reply = history.latest_reply().unwrap_or_default();
                    match validate_reply(reply, &record.output_shape) {
                        Verdict::Valid(value) => {
                            tracing::info!(app_id = %record.id, attempt = attempts, "response is valid");
                            accepted = Some(value);
                            Event::Accepted
                        }
                        Verdict::Retry(diagnostic) => {
                            tracing::warn!(
                                app_id = %record.id,
                                attempt = attempts,
                                max_attempts,
                                kind = diagnostic.kind.tag(),
                                detail = %diagnostic.detail,
                                "reply rejected"
                            );
                            history.push_diagnostic(diagnostic);
                            if attempts >= max_attempts {
                                failure = Some(Failure::Exhausted);
                                Event::Exhausted
                            } else {
                                Event::Rejected
                            }
                        }
                        Verdict::Fatal(reason) => {
                            failure = Some(Failure::Aborted(ConformError::other(reason)));
                            Event::Aborted
                        }
                    }
                }
                Phase::Done | Phase::Failed => break,
            };

            let next = transition(phase, event).ok_or_else(|| {
                ConformError::other(format!("illegal transition: {:?} on {:?}", phase, event))
            })?;
            phase = next;
        }

        if phase == Phase::Done {
            let raw = history.latest_reply().unwrap_or_default().to_string();
            let value = accepted.take().unwrap_or(Value::Null);
            return Ok(Completion {
                value,
                raw,
                attempts,
                diagnostics: history.diagnostics(),
                exhausted: false,
            });
        }

        match failure.take() {
            Some(Failure::Aborted(err)) => Err(err),
            Some(Failure::Exhausted) | None => self.exhausted(record, &history, attempts),
        }
    }

    /// The generate step: one model call
    async fn generate(
        &self,
        record: &ApplicationRecord,
        history: &AttemptHistory,
        attempt: u32,
        cancel: Option<&AtomicBool>,
    ) -> Result<String, ConformError> {
        check_cancelled(cancel)?;

        let prompt = render_prompt(record, history);
        tracing::debug!(
            app_id = %record.id,
            attempt,
            user_msg = history.user_message(),
            error_hist = ?history.attempts().iter().map(|e| e.to_string()).collect::<Vec<_>>(),
            app_prompt = %record.prompt,
            input_schema_properties = %record.input_shape.properties_json(),
            output_schema_properties = %record.output_shape.properties_json(),
            app_logs = record.interactions.len(),
            "calling model with formatted prompt"
        );
        tracing::info!(
            app_id = %record.id,
            attempt,
            max_attempts = self.config.max_attempts,
            prompt_len = prompt.len(),
            "calling model"
        );

        let mut req = CompletionRequest::new(self.config.model.clone(), prompt);
        req.temperature = self.config.temperature;
        req.max_tokens = self.config.max_tokens;

        let response = self.provider.complete(req).await?;
        check_cancelled(cancel)?;

        tracing::debug!(app_id = %record.id, attempt, reply = %response.text, "model response received");
        Ok(response.text)
    }

    fn exhausted(
        &self,
        record: &ApplicationRecord,
        history: &AttemptHistory,
        attempts: u32,
    ) -> Result<Completion, ConformError> {
        let last_error = history
            .diagnostics()
            .last()
            .map(|d| d.to_string())
            .unwrap_or_default();

        match self.config.on_exhaustion {
            ExhaustionPolicy::Fail => {
                tracing::error!(
                    app_id = %record.id,
                    attempts,
                    last_error = %last_error,
                    "generation failed"
                );
                Err(ConformError::GenerationFailed {
                    attempts,
                    last_error,
                })
            }
            ExhaustionPolicy::PassThrough => {
                tracing::warn!(
                    app_id = %record.id,
                    attempts,
                    last_error = %last_error,
                    "attempts exhausted, passing last reply through"
                );
                let raw = history.latest_reply().unwrap_or_default().to_string();
                let value = match serde_json::from_str::<Value>(raw.trim()) {
                    Ok(value) if value.is_object() => value,
                    _ => json!({ "message": raw }),
                };
                Ok(Completion {
                    value,
                    raw,
                    attempts,
                    diagnostics: history.diagnostics(),
                    exhausted: true,
                })
            }
        }
    }
}

fn check_cancelled(cancel: Option<&AtomicBool>) -> Result<(), ConformError> {
    match cancel {
        Some(flag) if flag.load(Ordering::SeqCst) => Err(ConformError::Cancelled),
        _ => Ok(()),
    }
}
