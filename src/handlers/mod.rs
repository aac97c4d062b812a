//! Terminal front end: prompts, command parsing and one driver per screen.

pub mod commands;
pub mod consultation;
pub mod entry;
pub mod network;
pub mod operation;
pub mod prompt;

use tracing::warn;

use crate::api::PalletApi;
use crate::error::WorkflowError;

pub use prompt::{say, Prompt};

/// How a screen driver ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    SessionExpired,
}

/// Operator-facing text for a workflow error
pub fn error_message(error: &WorkflowError) -> String {
    match error {
        WorkflowError::Validation { status, body } if body.trim().is_empty() => {
            format!("❌ Server rejected the request ({status})")
        }
        WorkflowError::Network(_) | WorkflowError::Validation { .. } | WorkflowError::Decode(_) => {
            format!("❌ {error}")
        }
        WorkflowError::AuthExpired | WorkflowError::Offline => format!("🔒 {error}"),
        _ => format!("⚠️ {error}"),
    }
}

/// Ask for credentials until a login succeeds. `Ok(false)` when input ends.
pub async fn login(api: &PalletApi, prompt: &mut Prompt) -> anyhow::Result<bool> {
    loop {
        let Some(username) = prompt.ask("Username: ").await? else {
            return Ok(false);
        };
        let Some(password) = prompt.ask("Password: ").await? else {
            return Ok(false);
        };

        match api.login(&username, &password).await {
            Ok(()) => {
                say(format!("✅ Logged in as {username}"));
                return Ok(true);
            }
            Err(e) => match e.status() {
                Some(status @ (400 | 401)) => {
                    warn!(status, "Login refused");
                    say("❌ Wrong username or password");
                }
                _ => say(error_message(&e)),
            },
        }
    }
}
