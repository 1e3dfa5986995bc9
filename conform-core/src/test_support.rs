//! Scripted providers and fixtures shared by unit tests.

use crate::application::{validate_application_request, ApplicationRecord};
use crate::error::ConformError;
use crate::provider::Provider;
use crate::types::*;
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// Replays a fixed list of outcomes, then repeats the fallback forever.
#[derive(Debug)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String, ConformError>>>,
    fallback: Option<String>,
    calls: AtomicU32,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(replies: &[&str]) -> Self {
        Self::from_results(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn from_results(script: Vec<Result<String, ConformError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: None,
            calls: AtomicU32::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A provider that always returns `reply`
    pub fn always(reply: &str) -> Self {
        let mut provider = Self::from_results(Vec::new());
        provider.fallback = Some(reply.to_string());
        provider
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn info(&self) -> Arc<ProviderInfo> {
        Arc::new(ProviderInfo {
            id: "scripted".to_string(),
            name: "Scripted".to_string(),
        })
    }

    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse, ConformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(req.prompt.clone());

        let next = self.script.lock().unwrap().pop_front();
        let text = match (next, &self.fallback) {
            (Some(result), _) => result?,
            (None, Some(fallback)) => fallback.clone(),
            (None, None) => return Err(ConformError::provider("script exhausted")),
        };
        Ok(CompletionResponse::new(text, req.model))
    }
}

/// Returns a conforming reply but raises `flag` while the call is in flight,
/// as if the caller gave up mid-request.
#[derive(Debug)]
pub struct CancelDuringCall {
    flag: Arc<AtomicBool>,
    calls: AtomicU32,
}

impl CancelDuringCall {
    pub fn new(flag: Arc<AtomicBool>) -> Self {
        Self {
            flag,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for CancelDuringCall {
    fn info(&self) -> Arc<ProviderInfo> {
        Arc::new(ProviderInfo {
            id: "cancel-during-call".to_string(),
            name: "CancelDuringCall".to_string(),
        })
    }

    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse, ConformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.flag.store(true, Ordering::SeqCst);
        Ok(CompletionResponse::new(
            r#"{"sentiment": "positive", "score": 0.9}"#,
            req.model,
        ))
    }
}

/// Raw creation request for a review-sentiment application
pub fn review_request() -> serde_json::Value {
    json!({
        "prompt_config": "Classify the sentiment of the review.",
        "input_schema": {
            "type": "object",
            "properties": {"review_text": {"type": "string"}},
            "required": ["review_text"]
        },
        "output_schema": {
            "type": "object",
            "properties": {
                "sentiment": {"type": "string"},
                "score": {"type": "number"}
            }
        }
    })
}

pub fn review_record() -> ApplicationRecord {
    ApplicationRecord::new(validate_application_request(&review_request()).unwrap())
}
