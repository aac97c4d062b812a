use std::sync::Arc;

use crate::api::PalletApi;
use crate::error::WorkflowError;
use crate::workflow::EntryScreen;

use super::commands::{EntryCommand, ENTRY_HELP};
use super::{error_message, login, say, Outcome, Prompt};

/// Run the put-away screen until `back` or end of input.
pub async fn run_entry(api: &Arc<PalletApi>, prompt: &mut Prompt) -> anyhow::Result<()> {
    loop {
        let mut screen = EntryScreen::new(Arc::clone(api));
        match drive(&mut screen, prompt).await? {
            Outcome::Done => return Ok(()),
            Outcome::SessionExpired => {
                say(error_message(&WorkflowError::AuthExpired));
                if !login(api, prompt).await? {
                    return Ok(());
                }
            }
        }
    }
}

async fn drive(screen: &mut EntryScreen, prompt: &mut Prompt) -> anyhow::Result<Outcome> {
    say("== entry ==");
    match screen.load_slots().await {
        Ok(count) => say(format!("🗄️ {count} location(s) loaded")),
        Err(WorkflowError::AuthExpired) => return Ok(Outcome::SessionExpired),
        Err(e) => say(error_message(&e)),
    }

    loop {
        let label = match screen.pallet() {
            Some(pallet) => format!("entry [{}]> ", pallet.id),
            None => "entry> ".to_string(),
        };
        let Some(line) = prompt.ask(&label).await? else {
            return Ok(Outcome::Done);
        };
        if line.is_empty() {
            continue;
        }

        let result = match EntryCommand::parse(&line) {
            Ok(EntryCommand::Back) => return Ok(Outcome::Done),
            Ok(command) => execute(screen, command).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => {}
            Err(WorkflowError::AuthExpired) => return Ok(Outcome::SessionExpired),
            Err(e) => say(error_message(&e)),
        }
    }
}

async fn execute(screen: &mut EntryScreen, command: EntryCommand) -> Result<(), WorkflowError> {
    match command {
        EntryCommand::Scan(id) => {
            let pallet = screen.lookup(&id).await?;
            say(format!("  {}", pallet.summary()));
            say("'racks', 'slots <rack>' then 'put <location>'");
        }
        EntryCommand::Racks => {
            let current = screen
                .pallet()
                .and_then(|p| p.location.as_deref())
                .and_then(|location| screen.slots().rack_index_of(location));
            say(format!("  {}", rack_line(&screen.racks(), current)));
        }
        EntryCommand::Slots(rack) => {
            for slot in screen.slots_in_rack(&rack) {
                let mark = if slot.is_free() { "🟢" } else { "🔴" };
                say(format!("  {mark} {} ({})", slot.location, slot.state));
            }
        }
        EntryCommand::Put(location) => {
            let location = screen.record(&location).await?;
            say(format!("📥 Entry recorded at {location}"));
        }
        EntryCommand::Back => {}
        EntryCommand::Help => say(ENTRY_HELP),
    }
    Ok(())
}

/// Move one pallet: ask the pallet and the new location, then patch it.
pub async fn run_relocation(api: &Arc<PalletApi>, prompt: &mut Prompt) -> anyhow::Result<()> {
    let mut screen = EntryScreen::new(Arc::clone(api));
    let outcome = relocate_once(&mut screen, prompt).await?;
    if outcome == Outcome::SessionExpired {
        say(error_message(&WorkflowError::AuthExpired));
        login(api, prompt).await?;
    }
    Ok(())
}

async fn relocate_once(screen: &mut EntryScreen, prompt: &mut Prompt) -> anyhow::Result<Outcome> {
    if let Err(e) = screen.load_slots().await {
        if matches!(e, WorkflowError::AuthExpired) {
            return Ok(Outcome::SessionExpired);
        }
        say(error_message(&e));
        return Ok(Outcome::Done);
    }

    let Some(pallet_id) = prompt.ask("Pallet to move: ").await? else {
        return Ok(Outcome::Done);
    };
    say(format!("Racks: {}", rack_line(&screen.racks(), None)));
    let Some(location) = prompt.ask("New location: ").await? else {
        return Ok(Outcome::Done);
    };

    match screen.relocate(&pallet_id, &location).await {
        Ok(location) => say(format!("🚚 {} moved to {location}", pallet_id.trim())),
        Err(WorkflowError::AuthExpired) => return Ok(Outcome::SessionExpired),
        Err(e) => say(error_message(&e)),
    }
    Ok(Outcome::Done)
}

/// Racks on one line, the pallet's current rack in brackets
fn rack_line(racks: &[String], current: Option<usize>) -> String {
    racks
        .iter()
        .enumerate()
        .map(|(i, rack)| {
            if Some(i) == current {
                format!("[{rack}]")
            } else {
                rack.clone()
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}
