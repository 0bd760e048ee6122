//! Interactive chat command
//!
//! A terminal front-end for the intake pipeline: reads user lines, hands
//! them to the orchestrator and prints every agent turn that comes back.

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::agents::Orchestrator;
use crate::config::AegisConfig;
use crate::types::{AppError, Result, Turn};

use super::output::Output;

/// Run the chat loop until EOF or an exit command.
pub async fn run(cfg: &AegisConfig, conversation: Option<String>, output: &Output) -> Result<()> {
    let orchestrator = Orchestrator::from_config(cfg).await?;
    let conversation_id =
        conversation.unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());

    output.banner();
    output.info(&format!("conversation {}", conversation_id));
    output.info("Describe what you need, e.g. 'I want to apply for health insurance'.");
    output.hint("Type 'quit' to leave.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        output.prompt();
        let line = lines
            .next_line()
            .await
            .map_err(|e| AppError::Internal(format!("failed to read input: {}", e)))?;
        let Some(line) = line else { break };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "quit" | "exit" | ":q") {
            break;
        }

        match orchestrator
            .handle_user_turn(&conversation_id, Turn::user(line))
            .await
        {
            Ok(turns) => {
                for turn in &turns {
                    print_turn(output, turn);
                }
            }
            Err(err) => output.error(&err.to_string()),
        }

        if let Some(stage) = orchestrator.stage(&conversation_id).await {
            debug!(?stage, "pipeline stage");
        }
    }

    output.newline();
    output.success("Goodbye!");
    Ok(())
}

fn print_turn(output: &Output, turn: &Turn) {
    let author = turn.author.as_deref().unwrap_or("agent");
    let text = turn.joined_text();

    if let Some(pretty) = form_payload_pretty(&text) {
        output.agent_reply(author, &pretty);
        output.hint("Fill the form and reply with {\"form_data\": {\"age\": \"40\", ...}}");
        return;
    }

    output.agent_reply(author, &text);
}

/// Pretty-print `text` when it is a structured form payload.
fn form_payload_pretty(text: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    value.get("form")?;
    serde_json::to_string_pretty(&value).ok()
}
