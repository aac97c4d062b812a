use std::sync::Arc;

use tracing::info;

use crate::api::PalletApi;
use crate::error::WorkflowError;
use crate::models::{Operation, PendingTransaction};
use crate::utils::clock_label;
use crate::workflow::{OperationScreen, ScreenState};

use super::commands::{BatchCommand, BATCH_HELP};
use super::{error_message, login, say, Outcome, Prompt};

enum Flow {
    Continue,
    Leave,
    /// Leaving would drop this many unsent pallets
    ConfirmLeave(usize),
}

/// Run a batch operation screen. A session expiry suspends the screen,
/// asks for a new login and resumes with the same batch.
pub async fn run_operation(
    api: &Arc<PalletApi>,
    prompt: &mut Prompt,
    operation: Operation,
) -> anyhow::Result<()> {
    let mut screen = OperationScreen::new(Arc::clone(api), operation);
    loop {
        match drive(&mut screen, prompt).await? {
            Outcome::Done => {
                screen.close();
                return Ok(());
            }
            Outcome::SessionExpired => {
                let saved = screen.suspend();
                say(format!(
                    "🔒 {} ({} pallet(s) kept)",
                    WorkflowError::AuthExpired,
                    saved.pending()
                ));
                if !login(api, prompt).await? {
                    return Ok(());
                }
                screen = OperationScreen::resume(Arc::clone(api), saved);
            }
        }
    }
}

async fn drive(screen: &mut OperationScreen, prompt: &mut Prompt) -> anyhow::Result<Outcome> {
    say(format!("== {} ==", screen.operation()));
    if let Err(e) = load(screen).await {
        if matches!(e, WorkflowError::AuthExpired) {
            return Ok(Outcome::SessionExpired);
        }
        say(error_message(&e));
    }

    loop {
        let label = format!("{} [{} pending]> ", screen.operation(), screen.batch().len());
        let Some(line) = prompt.ask(&label).await? else {
            return Ok(Outcome::Done);
        };
        if line.is_empty() {
            continue;
        }

        let result = match BatchCommand::parse(&line) {
            Ok(command) => execute(screen, command).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(Flow::Continue) => {}
            Ok(Flow::Leave) => return Ok(Outcome::Done),
            Ok(Flow::ConfirmLeave(pending)) => {
                let question = format!("Discard {pending} unsent pallet(s)? [y/N] ");
                let Some(answer) = prompt.ask(&question).await? else {
                    return Ok(Outcome::Done);
                };
                if confirms(&answer) {
                    info!(operation = %screen.operation(), pending, "Unsent batch discarded");
                    return Ok(Outcome::Done);
                }
                say("Batch kept");
            }
            Err(WorkflowError::AuthExpired) => return Ok(Outcome::SessionExpired),
            Err(e) => say(error_message(&e)),
        }

        if screen.state() == ScreenState::LoggedOut {
            return Ok(Outcome::SessionExpired);
        }
    }
}

async fn load(screen: &mut OperationScreen) -> Result<(), WorkflowError> {
    let count = screen.activate().await?;
    say(format!("📦 {count} pallet(s) eligible"));
    if screen.operation().requires_location() {
        let slots = screen.load_slots().await?;
        say(format!("🗄️ {slots} location(s) loaded"));
    }
    Ok(())
}

async fn execute(screen: &mut OperationScreen, command: BatchCommand) -> Result<Flow, WorkflowError> {
    match command {
        BatchCommand::Scan { id, overrides } => {
            let transaction = screen.scan(&id, overrides)?;
            say(format!("➕ {}", describe(transaction)));
        }
        BatchCommand::List => {
            for item in screen.candidates().items() {
                say(format!("  {}", item.summary()));
            }
            say(format!("{} candidate(s)", screen.candidates().len()));
        }
        BatchCommand::Clients(None) => {
            for client in screen.candidates().clients() {
                say(format!("  {client}"));
            }
        }
        BatchCommand::Clients(Some(client)) => {
            let items = screen.candidates().filtered(Some(client.as_str()));
            for item in &items {
                say(format!("  {}", item.summary()));
            }
            say(format!("{} candidate(s) for {client}", items.len()));
        }
        BatchCommand::Remove(index) => {
            let removed = screen.remove(index)?;
            say(format!("➖ {} back in the list", removed.pallet_id));
        }
        BatchCommand::Edit { index, overrides } => {
            let transaction = screen.edit(index, overrides)?;
            say(format!("✏️ {}", describe(transaction)));
        }
        BatchCommand::Review => {
            for (n, transaction) in screen.review()?.iter().enumerate() {
                say(format!("  {}. {}", n + 1, describe(transaction)));
            }
            say("'submit' to send, 'rm <n>' or 'edit <n>' to change, 'back' to keep scanning");
        }
        BatchCommand::Submit => {
            let ack = screen.submit().await?;
            info!(operation = %screen.operation(), submitted = ack.submitted, "Batch done");
            say(format!("✅ {} pallet(s) submitted", ack.submitted));
            if let Some(message) = ack.message {
                say(message);
            }
            return Ok(Flow::Leave);
        }
        BatchCommand::Refresh => {
            let count = screen.activate().await?;
            say(format!("📦 {count} pallet(s) eligible"));
        }
        BatchCommand::Back if screen.state() == ScreenState::Reviewing => {
            screen.back_to_scanning()?;
        }
        BatchCommand::Back if !screen.batch().is_empty() => {
            return Ok(Flow::ConfirmLeave(screen.batch().len()));
        }
        BatchCommand::Back => return Ok(Flow::Leave),
        BatchCommand::Help => say(BATCH_HELP),
    }
    Ok(Flow::Continue)
}

fn describe(transaction: &PendingTransaction) -> String {
    format!(
        "{} | qty {} | {} | {} | {}",
        transaction.pallet_id,
        transaction.quantity,
        transaction.location.as_deref().unwrap_or("-"),
        transaction.status,
        clock_label(&transaction.confirmed_at),
    )
}

/// Only an explicit yes confirms; anything else keeps the batch.
fn confirms(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes" | "o" | "oui"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_yes_confirms_discard() {
        assert!(confirms("y"));
        assert!(confirms(" Yes "));
        assert!(confirms("oui"));
        assert!(!confirms(""));
        assert!(!confirms("n"));
        assert!(!confirms("back"));
    }
}
