use async_trait::async_trait;
use inquire::{InquireError, Text};
use meteo_core::{ElicitationOutcome, ElicitationRequest, Elicitor};
use serde_json::json;
use tracing::warn;

/// Asks the user on the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalElicitor;

#[async_trait]
impl Elicitor for TerminalElicitor {
    async fn elicit(&self, request: ElicitationRequest) -> meteo_core::Result<ElicitationOutcome> {
        // inquire blocks on stdin.
        let answer = tokio::task::spawn_blocking(move || {
            eprintln!("{}", request.message);
            Text::new("Location number:")
                .with_help_message("leave empty to decline, Esc to cancel")
                .prompt()
        })
        .await;

        match answer {
            Ok(answer) => Ok(interpret(answer)),
            Err(e) => {
                warn!(error = %e, "prompt task failed");
                Ok(ElicitationOutcome::Cancel)
            }
        }
    }
}

fn interpret(answer: Result<String, InquireError>) -> ElicitationOutcome {
    match answer {
        Ok(text) if text.trim().is_empty() => ElicitationOutcome::Decline,
        Ok(text) => match text.trim().parse::<i64>() {
            Ok(n) => ElicitationOutcome::Accept(Some(json!({ "selected_location_id": n }))),
            Err(_) => ElicitationOutcome::Accept(None),
        },
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
            ElicitationOutcome::Cancel
        }
        Err(e) => {
            warn!(error = %e, "could not read selection");
            ElicitationOutcome::Cancel
        }
    }
}
