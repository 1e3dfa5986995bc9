//! End-to-end example: register a sentiment classifier and run it.
//!
//! Reads `OPENAI_API_KEY` (and optionally `OPENAI_API_BASE`) plus the
//! `CONFORM_*` settings from the environment.
//!
//! ```bash
//! OPENAI_API_KEY=sk-... cargo run --example review_sentiment
//! ```

use conform::prelude::*;
use serde_json::json;
use std::sync::Arc;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let provider = OpenAiBuilder::from_env().build()?;

    let orchestrator = Orchestrator::builder(provider)
        .layer(RetryLayer::new().with_max_retries(3))
        .layer(LoggingLayer::new())
        .config(OrchestratorConfig::from_env()?)
        .finish();

    println!("Using provider: {}", orchestrator.info().name);

    let service = ApplicationService::new(Arc::new(InMemoryStore::new()), orchestrator);

    let id = service
        .create_application(&json!({
            "prompt_config": "Classify the sentiment of the review.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "review_text": {
                        "type": "string",
                        "description": "Free-form product review"
                    }
                },
                "required": ["review_text"]
            },
            "output_schema": {
                "type": "object",
                "properties": {
                    "sentiment": {"type": "string"},
                    "score": {"type": "number"}
                }
            }
        }))
        .await?;
    println!("Registered application {}", id);

    // Rejected before any model call
    match service.complete(id, json!({"text": "wrong field"})).await {
        Err(ConformError::InvalidInput(issues)) => println!("Input rejected: {:?}", issues),
        other => println!("Unexpected result: {:?}", other),
    }

    for review in [
        "Arrived quickly and works perfectly.",
        "Broke after two days, very disappointed.",
    ] {
        match service.complete(id, json!({ "review_text": review })).await {
            Ok(reply) => println!("{} -> {}", review, serde_json::to_string_pretty(&reply)?),
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    println!("\n=== Interaction log ===");
    for interaction in service.interactions(id).await? {
        println!(
            "[{}] {:?}: {}",
            interaction.timestamp.to_rfc3339(),
            interaction.sender,
            interaction.message
        );
    }

    service.delete_application(id).await?;
    Ok(())
}
