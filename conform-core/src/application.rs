//! Application records and their construction validator.

use crate::shape::{validate_shape_definition, ShapeDefinition, ShapeKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Who produced an interaction log entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// One entry of an application's interaction log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    pub sender: Sender,
    pub message: Value,
    pub timestamp: DateTime<Utc>,
}

impl Interaction {
    /// Create a user entry stamped with the current time
    pub fn user(message: Value) -> Self {
        Self {
            sender: Sender::User,
            message,
            timestamp: Utc::now(),
        }
    }

    /// Create an assistant entry stamped with the current time
    pub fn assistant(message: Value) -> Self {
        Self {
            sender: Sender::Assistant,
            message,
            timestamp: Utc::now(),
        }
    }
}

/// A validated application definition, before it has an id
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationSpec {
    pub prompt: String,
    pub input_shape: ShapeDefinition,
    pub output_shape: ShapeDefinition,
}

/// A stored application: prompt, contracts and interaction history.
///
/// Everything except the interaction log is fixed at creation.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationRecord {
    pub id: Uuid,
    pub prompt: String,
    pub input_shape: ShapeDefinition,
    pub output_shape: ShapeDefinition,
    pub interactions: Vec<Interaction>,
}

impl ApplicationRecord {
    /// Create a record with a fresh v4 id and an empty log
    pub fn new(spec: ApplicationSpec) -> Self {
        Self::with_id(Uuid::new_v4(), spec)
    }

    pub fn with_id(id: Uuid, spec: ApplicationSpec) -> Self {
        Self {
            id,
            prompt: spec.prompt,
            input_shape: spec.input_shape,
            output_shape: spec.output_shape,
            interactions: Vec::new(),
        }
    }
}

/// Validate a prompt template: trimmed, and not blank
pub fn validate_prompt(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("Prompt configuration cannot be empty or just whitespace.".to_string());
    }
    Ok(trimmed.to_string())
}

/// Validate an application creation request.
///
/// Expects `{"prompt_config": str, "input_schema": {..}, "output_schema": {..}}`.
/// Issues from the prompt and both shapes are reported together.
pub fn validate_application_request(raw: &Value) -> Result<ApplicationSpec, Vec<String>> {
    let Some(obj) = raw.as_object() else {
        return Err(vec!["Application request must be a JSON object.".to_string()]);
    };

    let missing: Vec<String> = ["prompt_config", "input_schema", "output_schema"]
        .iter()
        .filter(|key| !obj.contains_key(**key))
        .map(|key| format!("Missing required field: '{}'", key))
        .collect();
    if !missing.is_empty() {
        return Err(missing);
    }

    let mut errors = Vec::new();

    let prompt = match obj["prompt_config"].as_str() {
        Some(text) => validate_prompt(text).map_err(|e| errors.push(e)).ok(),
        None => {
            errors.push("Prompt configuration must be a string.".to_string());
            None
        }
    };

    let input_shape = validate_shape_definition(&obj["input_schema"], ShapeKind::Input)
        .map_err(|e| errors.extend(e))
        .ok();
    let output_shape = validate_shape_definition(&obj["output_schema"], ShapeKind::Output)
        .map_err(|e| errors.extend(e))
        .ok();

    match (prompt, input_shape, output_shape) {
        (Some(prompt), Some(input_shape), Some(output_shape)) if errors.is_empty() => {
            Ok(ApplicationSpec {
                prompt,
                input_shape,
                output_shape,
            })
        }
        _ => Err(errors),
    }
}
