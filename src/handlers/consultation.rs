use std::sync::Arc;

use crate::api::{ConsultationFilter, PalletApi};
use crate::constants::FILTER_ALL;
use crate::error::WorkflowError;
use crate::workflow::Consultation;

use super::{error_message, login, say, Prompt};

/// One filtered search. Blank answers leave a filter out.
pub async fn run_consultation(api: &Arc<PalletApi>, prompt: &mut Prompt) -> anyhow::Result<()> {
    let mut filter = ConsultationFilter::default();
    let fields: [(&str, fn(ConsultationFilter, &str) -> ConsultationFilter); 4] = [
        ("Pallet: ", ConsultationFilter::pallet),
        ("Client: ", ConsultationFilter::client),
        ("Article: ", ConsultationFilter::article),
        ("Location: ", ConsultationFilter::location),
    ];
    for (label, apply) in fields {
        let Some(answer) = prompt.ask(label).await? else {
            return Ok(());
        };
        filter = apply(filter, &answer);
    }

    let statuses = Consultation::statuses();
    for (n, status) in statuses.iter().enumerate() {
        say(format!("  {n}. {status}"));
    }
    let Some(answer) = prompt.ask("Status [0]: ").await? else {
        return Ok(());
    };
    let status = answer
        .parse::<usize>()
        .ok()
        .and_then(|n| statuses.get(n).copied())
        .unwrap_or(FILTER_ALL);
    filter = filter.status(status);

    let mut consultation = Consultation::new(Arc::clone(api));
    match consultation.search(&filter).await {
        Ok(results) => {
            for item in results {
                say(format!(
                    "  {} | {}",
                    item.summary(),
                    item.status.as_deref().unwrap_or("-")
                ));
            }
            say(format!("{} pallet(s) found", results.len()));
        }
        Err(WorkflowError::AuthExpired) => {
            say(error_message(&WorkflowError::AuthExpired));
            login(api, prompt).await?;
        }
        Err(e) => say(error_message(&e)),
    }
    Ok(())
}
