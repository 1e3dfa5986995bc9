//! Orchestrator configuration.

use crate::error::ConformError;
use std::str::FromStr;

/// What a completion call returns once the attempt ceiling is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExhaustionPolicy {
    /// Fail with [`ConformError::GenerationFailed`]
    #[default]
    Fail,
    /// Return the last reply as-is, wrapped as `{"message": raw}` when it is
    /// not a JSON object
    PassThrough,
}

impl FromStr for ExhaustionPolicy {
    type Err = ConformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(ExhaustionPolicy::Fail),
            "pass_through" | "passthrough" => Ok(ExhaustionPolicy::PassThrough),
            other => Err(ConformError::configuration(format!(
                "unknown exhaustion policy '{}', expected 'fail' or 'pass_through'",
                other
            ))),
        }
    }
}

/// Settings for the retry orchestrator
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    /// Model id sent with every request
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Total model calls allowed per completion (at least 1)
    pub max_attempts: u32,
    pub on_exhaustion: ExhaustionPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: Some(0.0),
            max_tokens: None,
            max_attempts: 5,
            on_exhaustion: ExhaustionPolicy::Fail,
        }
    }
}

impl OrchestratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the model id
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the attempt ceiling; values below 1 are raised to 1
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Set the exhaustion policy
    pub fn with_exhaustion_policy(mut self, policy: ExhaustionPolicy) -> Self {
        self.on_exhaustion = policy;
        self
    }

    /// Load overrides from the environment.
    ///
    /// Reads `CONFORM_MODEL`, `CONFORM_TEMPERATURE`, `CONFORM_MAX_ATTEMPTS`
    /// and `CONFORM_ON_EXHAUSTION`; unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConformError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConformError> {
        let mut config = Self::default();

        if let Some(model) = lookup("CONFORM_MODEL") {
            config.model = model;
        }
        if let Some(raw) = lookup("CONFORM_TEMPERATURE") {
            let temperature = raw.trim().parse::<f32>().map_err(|_| {
                ConformError::configuration(format!("CONFORM_TEMPERATURE is not a number: {}", raw))
            })?;
            config.temperature = Some(temperature);
        }
        if let Some(raw) = lookup("CONFORM_MAX_ATTEMPTS") {
            let attempts = raw.trim().parse::<u32>().map_err(|_| {
                ConformError::configuration(format!(
                    "CONFORM_MAX_ATTEMPTS is not a positive integer: {}",
                    raw
                ))
            })?;
            if attempts == 0 {
                return Err(ConformError::configuration(
                    "CONFORM_MAX_ATTEMPTS must be at least 1",
                ));
            }
            config.max_attempts = attempts;
        }
        if let Some(raw) = lookup("CONFORM_ON_EXHAUSTION") {
            config.on_exhaustion = raw.parse()?;
        }

        Ok(config)
    }
}
