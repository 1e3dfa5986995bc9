//! Prompt rendering for generation attempts.
//!
//! Every attempt sends one self-contained prompt: the application's
//! instructions, its interaction log, the user's message, both shape
//! contracts, and whatever went wrong in earlier attempts of the same call.

use crate::application::{ApplicationRecord, Interaction, Sender};
use crate::runtime::history::AttemptHistory;
use serde_json::Value;

/// Render the prompt for the next attempt.
pub fn render_prompt(record: &ApplicationRecord, history: &AttemptHistory) -> String {
    let mut prompt = String::new();

    prompt.push_str(
        "You do NOT have access to tools or functions. Never call tools or functions.\n\n",
    );
    prompt.push_str("You are an application. Your objective is below:\n\n");
    prompt.push_str(&record.prompt);
    prompt.push_str("\n\n");

    prompt.push_str("The message history between the application and the user so far is:\n");
    prompt.push_str(&render_interactions(&record.interactions));
    prompt.push_str("\n\n");

    prompt.push_str(&format!(
        "The user's message is:\n{}\nIt follows this input schema:\n{}\n\n",
        history.user_message(),
        pretty(&record.input_shape.properties_json()),
    ));

    prompt.push_str(&format!(
        "The output must follow this JSON schema:\n{}\n\n",
        pretty(&record.output_shape.properties_json()),
    ));

    prompt.push_str("Respond in JSON format only. Do not add any preamble.\n");

    let attempts: Vec<String> = history.attempts().iter().map(|e| e.to_string()).collect();
    if !attempts.is_empty() {
        prompt.push_str("\nYour previous attempts are below and caused these malformation errors:\n");
        prompt.push_str(&numbered_list(&attempts));
        prompt.push('\n');
    }

    prompt
}

fn render_interactions(interactions: &[Interaction]) -> String {
    if interactions.is_empty() {
        return "(no messages yet)".to_string();
    }
    interactions
        .iter()
        .map(|entry| {
            let sender = match entry.sender {
                Sender::User => "user",
                Sender::Assistant => "assistant",
            };
            format!(
                "[{}] {}: {}",
                entry.timestamp.to_rfc3339(),
                sender,
                entry.message
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Create a numbered list from items (1-indexed).
fn numbered_list(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}
