use crate::error::WorkflowError;
use crate::models::{Operation, Overrides};

/// Top-level menu entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Entry,
    Batch(Operation),
    Relocate,
    Consultation,
    Logout,
    Quit,
}

impl MenuChoice {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_lowercase().as_str() {
            "entree" | "entrée" => Some(MenuChoice::Entry),
            "deplacer" | "déplacer" => Some(MenuChoice::Relocate),
            "consultation" => Some(MenuChoice::Consultation),
            "logout" => Some(MenuChoice::Logout),
            "quit" | "exit" => Some(MenuChoice::Quit),
            other => Operation::parse(other).map(MenuChoice::Batch),
        }
    }
}

pub const MENU: &str = "entree | inventaire | destruction | renvoi | production | deplacer | consultation | logout | quit";

/// Commands of a batch operation screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchCommand {
    Scan { id: String, overrides: Overrides },
    List,
    Clients(Option<String>),
    Remove(usize),
    Edit { index: usize, overrides: Overrides },
    Review,
    Submit,
    Refresh,
    Back,
    Help,
}

pub const BATCH_HELP: &str = "\
scan <pallet> [qty|-] [location]   add a pallet to the batch
list                               show candidates
clients [name]                     list clients, or candidates of one client
rm <n>                             remove batch entry n
edit <n> [qty|-] [location]        change quantity/location of entry n
review                             show the batch
submit                             send the batch
refresh                            reload candidates
back                               leave the screen";

impl BatchCommand {
    pub fn parse(line: &str) -> Result<Self, WorkflowError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&verb, args)) = tokens.split_first() else {
            return Err(WorkflowError::input("Type a command, 'help' for the list"));
        };

        match verb.to_lowercase().as_str() {
            "scan" => {
                let (id, rest) = args
                    .split_first()
                    .ok_or_else(|| WorkflowError::input("Usage: scan <pallet> [qty] [location]"))?;
                Ok(BatchCommand::Scan {
                    id: id.to_string(),
                    overrides: parse_overrides(rest)?,
                })
            }
            "list" | "ls" => Ok(BatchCommand::List),
            "clients" => Ok(BatchCommand::Clients(
                (!args.is_empty()).then(|| args.join(" ")),
            )),
            "rm" | "remove" => {
                let index = args
                    .first()
                    .ok_or_else(|| WorkflowError::input("Usage: rm <n>"))?;
                Ok(BatchCommand::Remove(parse_position(index)?))
            }
            "edit" => {
                let (index, rest) = args
                    .split_first()
                    .ok_or_else(|| WorkflowError::input("Usage: edit <n> [qty] [location]"))?;
                Ok(BatchCommand::Edit {
                    index: parse_position(index)?,
                    overrides: parse_overrides(rest)?,
                })
            }
            "review" => Ok(BatchCommand::Review),
            "submit" | "valider" => Ok(BatchCommand::Submit),
            "refresh" => Ok(BatchCommand::Refresh),
            "back" | "retour" => Ok(BatchCommand::Back),
            "help" | "?" => Ok(BatchCommand::Help),
            other => Err(WorkflowError::input(format!("Unknown command '{other}'"))),
        }
    }
}

/// Commands of the entry screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryCommand {
    Scan(String),
    Racks,
    Slots(String),
    Put(String),
    Back,
    Help,
}

pub const ENTRY_HELP: &str = "\
scan <pallet>       look a pallet up
racks               list racks
slots <rack>        list slots of a rack, free first
put <location>      store the pallet at location
back                leave the screen";

impl EntryCommand {
    pub fn parse(line: &str) -> Result<Self, WorkflowError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&verb, args)) = tokens.split_first() else {
            return Err(WorkflowError::input("Type a command, 'help' for the list"));
        };
        let rest = args.join(" ");

        match verb.to_lowercase().as_str() {
            "scan" if !rest.is_empty() => Ok(EntryCommand::Scan(rest)),
            "racks" => Ok(EntryCommand::Racks),
            "slots" if !rest.is_empty() => Ok(EntryCommand::Slots(rest)),
            "put" if !rest.is_empty() => Ok(EntryCommand::Put(rest)),
            "back" | "retour" => Ok(EntryCommand::Back),
            "help" | "?" => Ok(EntryCommand::Help),
            "scan" | "slots" | "put" => Err(WorkflowError::input(format!(
                "'{verb}' needs an argument"
            ))),
            other => Err(WorkflowError::input(format!("Unknown command '{other}'"))),
        }
    }
}

/// Positions are shown and typed from 1.
fn parse_position(raw: &str) -> Result<usize, WorkflowError> {
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(WorkflowError::input(format!("'{raw}' is not a batch position"))),
    }
}

/// `[qty|-] [location words...]`
fn parse_overrides(args: &[&str]) -> Result<Overrides, WorkflowError> {
    let Some((&quantity, location)) = args.split_first() else {
        return Ok(Overrides::none());
    };

    let mut overrides = Overrides::none();
    if quantity != "-" {
        overrides.quantity = Overrides::parse_quantity(quantity)?;
    }
    Ok(overrides.location(&location.join(" ")))
}
