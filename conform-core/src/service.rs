//! Application service: the operations an outer surface (HTTP, CLI) calls.
//!
//! Composes the construction validator, an [`ApplicationStore`] and an
//! [`Orchestrator`]. Completions for the same application are serialized;
//! completions for different applications run independently.

use crate::application::{validate_application_request, ApplicationRecord, Interaction};
use crate::error::ConformError;
use crate::runtime::Orchestrator;
use crate::store::ApplicationStore;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Application lifecycle and completion entry point
#[derive(Debug)]
pub struct ApplicationService {
    store: Arc<dyn ApplicationStore>,
    orchestrator: Orchestrator,
    in_flight: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl ApplicationService {
    pub fn new(store: Arc<dyn ApplicationStore>, orchestrator: Orchestrator) -> Self {
        Self {
            store,
            orchestrator,
            in_flight: DashMap::new(),
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Validate a creation request and store the new application
    pub async fn create_application(&self, raw: &Value) -> Result<Uuid, ConformError> {
        let spec = validate_application_request(raw).map_err(ConformError::InvalidDefinition)?;
        let record = ApplicationRecord::new(spec);
        let id = self.store.create_application(record.id, record).await?;
        tracing::info!(app_id = %id, "application created");
        Ok(id)
    }

    pub async fn get_application(&self, id: Uuid) -> Result<ApplicationRecord, ConformError> {
        self.store
            .get_application(id)
            .await?
            .ok_or(ConformError::NotFound(id))
    }

    pub async fn delete_application(&self, id: Uuid) -> Result<(), ConformError> {
        if !self.store.delete_application(id).await? {
            return Err(ConformError::NotFound(id));
        }
        self.in_flight.remove(&id);
        tracing::info!(app_id = %id, "application deleted");
        Ok(())
    }

    /// Interaction log of an application
    pub async fn interactions(&self, id: Uuid) -> Result<Vec<Interaction>, ConformError> {
        self.store
            .get_interactions(id)
            .await?
            .ok_or(ConformError::NotFound(id))
    }

    /// Run a completion for an application
    pub async fn complete(&self, id: Uuid, input: Value) -> Result<Value, ConformError> {
        self.complete_with_cancel(id, input, None).await
    }

    /// Run a completion, abortable through `cancel`.
    ///
    /// The input is checked against the input shape before the model is
    /// involved. The user and assistant entries are appended to the log only
    /// after the orchestrator succeeds, so failed or cancelled calls leave
    /// the log untouched.
    pub async fn complete_with_cancel(
        &self,
        id: Uuid,
        input: Value,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<Value, ConformError> {
        let lock = self
            .in_flight
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock().await;

        let Some(record) = self.store.get_application(id).await? else {
            // Unknown or deleted ids must not leave a lock behind
            drop(guard);
            self.in_flight.remove(&id);
            return Err(ConformError::NotFound(id));
        };

        let Some(fields) = input.as_object() else {
            return Err(ConformError::InvalidInput(vec![
                "Input data must be a JSON object.".to_string(),
            ]));
        };
        if let Some(issues) = record.input_shape.check(fields) {
            tracing::warn!(app_id = %id, issues = ?issues, "input rejected");
            return Err(ConformError::InvalidInput(issues));
        }

        let user_message = serde_json::to_string(&input)?;
        let completion = self
            .orchestrator
            .run_completion_with_cancel(&user_message, &record, cancel.as_deref())
            .await?;

        tracing::info!(
            app_id = %id,
            attempts = completion.attempts,
            exhausted = completion.exhausted,
            "completion finished"
        );

        if !self.store.append_interaction(id, Interaction::user(input)).await?
            || !self
                .store
                .append_interaction(id, Interaction::assistant(completion.value.clone()))
                .await?
        {
            return Err(ConformError::NotFound(id));
        }

        Ok(completion.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::Sender;
    use crate::runtime::OrchestratorConfig;
    use crate::store::InMemoryStore;
    use crate::test_support::{review_request, CancelDuringCall, ScriptedProvider};
    use serde_json::json;

    fn service(provider: Arc<ScriptedProvider>, max_attempts: u32) -> ApplicationService {
        let orchestrator = Orchestrator::builder(provider)
            .config(OrchestratorConfig::default().with_max_attempts(max_attempts))
            .finish();
        ApplicationService::new(Arc::new(InMemoryStore::new()), orchestrator)
    }

    #[tokio::test]
    async fn test_create_and_delete() {
        let svc = service(Arc::new(ScriptedProvider::new(&[])), 3);
        let id = svc.create_application(&review_request()).await.unwrap();

        let record = svc.get_application(id).await.unwrap();
        assert_eq!(record.prompt, "Classify the sentiment of the review.");
        assert!(svc.interactions(id).await.unwrap().is_empty());

        svc.delete_application(id).await.unwrap();
        assert!(matches!(
            svc.get_application(id).await,
            Err(ConformError::NotFound(_))
        ));
        assert!(matches!(
            svc.delete_application(id).await,
            Err(ConformError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_definition_creates_nothing() {
        let svc = service(Arc::new(ScriptedProvider::new(&[])), 3);
        let mut raw = review_request();
        raw["output_schema"]["type"] = json!("array");

        let err = svc.create_application(&raw).await.unwrap_err();
        assert_eq!(
            err.issues().unwrap(),
            &["The schema 'type' must be 'object'. Found: array".to_string()]
        );
    }

    #[tokio::test]
    async fn test_invalid_input_never_calls_model() {
        let provider = Arc::new(ScriptedProvider::always(r#"{"sentiment": "positive"}"#));
        let svc = service(provider.clone(), 3);
        let id = svc.create_application(&review_request()).await.unwrap();

        let err = svc.complete(id, json!({})).await.unwrap_err();
        assert_eq!(
            err.issues().unwrap(),
            &["Missing required field: 'review_text'".to_string()]
        );

        let err = svc
            .complete(id, json!({"review_text": "ok", "extra": 1}))
            .await
            .unwrap_err();
        assert_eq!(
            err.issues().unwrap(),
            &["Unexpected field 'extra' in input data.".to_string()]
        );

        let err = svc.complete(id, json!(["review_text"])).await.unwrap_err();
        assert!(matches!(err, ConformError::InvalidInput(_)));

        assert_eq!(provider.calls(), 0);
        assert!(svc.interactions(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_completion_appends_both_entries() {
        let provider = Arc::new(ScriptedProvider::new(&[
            "nope",
            r#"{"sentiment": "positive", "score": 1}"#,
        ]));
        let svc = service(provider, 3);
        let id = svc.create_application(&review_request()).await.unwrap();

        let value = svc
            .complete(id, json!({"review_text": "Loved it"}))
            .await
            .unwrap();
        assert_eq!(value, json!({"sentiment": "positive", "score": 1}));

        let log = svc.interactions(id).await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].sender, Sender::User);
        assert_eq!(log[0].message, json!({"review_text": "Loved it"}));
        assert_eq!(log[1].sender, Sender::Assistant);
        assert_eq!(log[1].message, value);
    }

    #[tokio::test]
    async fn test_failed_completion_leaves_log_untouched() {
        let provider = Arc::new(ScriptedProvider::always("no json here"));
        let svc = service(provider.clone(), 2);
        let id = svc.create_application(&review_request()).await.unwrap();

        let err = svc
            .complete(id, json!({"review_text": "hmm"}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ConformError::GenerationFailed { attempts: 2, .. }
        ));
        assert!(svc.interactions(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_completion_leaves_log_untouched() {
        let provider = Arc::new(ScriptedProvider::always(r#"{"sentiment": "positive"}"#));
        let svc = service(provider.clone(), 3);
        let id = svc.create_application(&review_request()).await.unwrap();

        let cancel = Arc::new(AtomicBool::new(true));
        let err = svc
            .complete_with_cancel(id, json!({"review_text": "x"}), Some(cancel))
            .await
            .unwrap_err();
        assert!(matches!(err, ConformError::Cancelled));
        assert_eq!(provider.calls(), 0);
        assert!(svc.interactions(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_mid_call_leaves_log_untouched() {
        let cancel = Arc::new(AtomicBool::new(false));
        let provider = Arc::new(CancelDuringCall::new(cancel.clone()));
        let orchestrator = Orchestrator::builder(provider.clone()).finish();
        let svc = ApplicationService::new(Arc::new(InMemoryStore::new()), orchestrator);
        let id = svc.create_application(&review_request()).await.unwrap();

        let err = svc
            .complete_with_cancel(id, json!({"review_text": "x"}), Some(cancel))
            .await
            .unwrap_err();
        assert!(matches!(err, ConformError::Cancelled));
        assert_eq!(provider.calls(), 1);
        assert!(svc.interactions(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_application() {
        let svc = service(Arc::new(ScriptedProvider::new(&[])), 3);
        let id = Uuid::new_v4();
        assert!(matches!(
            svc.complete(id, json!({"review_text": "x"})).await,
            Err(ConformError::NotFound(missing)) if missing == id
        ));
        assert!(matches!(
            svc.interactions(id).await,
            Err(ConformError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_ids_leave_no_locks() {
        let svc = service(Arc::new(ScriptedProvider::new(&[])), 3);
        for _ in 0..100 {
            let err = svc
                .complete(Uuid::new_v4(), json!({"review_text": "x"}))
                .await
                .unwrap_err();
            assert!(matches!(err, ConformError::NotFound(_)));
        }
        assert!(svc.in_flight.is_empty());

        let id = svc.create_application(&review_request()).await.unwrap();
        svc.delete_application(id).await.unwrap();
        assert!(svc.complete(id, json!({"review_text": "x"})).await.is_err());
        assert!(svc.in_flight.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_completions() {
        let provider = Arc::new(ScriptedProvider::always(r#"{"sentiment": "neutral"}"#));
        let svc = service(provider.clone(), 3);
        let a = svc.create_application(&review_request()).await.unwrap();
        let b = svc.create_application(&review_request()).await.unwrap();

        let results = futures::future::join_all(vec![
            svc.complete(a, json!({"review_text": "one"})),
            svc.complete(a, json!({"review_text": "two"})),
            svc.complete(b, json!({"review_text": "three"})),
        ])
        .await;
        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(provider.calls(), 3);

        // Same-application calls are serialized, so entries pair up
        let log = svc.interactions(a).await.unwrap();
        let senders: Vec<Sender> = log.iter().map(|i| i.sender).collect();
        assert_eq!(
            senders,
            vec![Sender::User, Sender::Assistant, Sender::User, Sender::Assistant]
        );
        assert_eq!(svc.interactions(b).await.unwrap().len(), 2);
    }
}
