use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use pallet_terminal::config::ClientConfig;
use pallet_terminal::connectivity::ConnectivityMonitor;
use pallet_terminal::credentials::FileCredentialStore;
use pallet_terminal::handlers::commands::{MenuChoice, MENU};
use pallet_terminal::handlers::network::{spawn_link_banner, spawn_link_check};
use pallet_terminal::handlers::{self, say, Prompt};
use pallet_terminal::session::SessionContext;
use pallet_terminal::transport::HttpTransport;
use pallet_terminal::utils::{clock_label, warehouse_now};
use pallet_terminal::{logging, PalletApi, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();
    logging::init();

    info!("🚀 Starting pallet terminal v{}", VERSION);

    let config = ClientConfig::from_env();
    let store = Arc::new(
        FileCredentialStore::open(&config.credentials_path)
            .context("Failed to open the credential store")?,
    );
    let session = Arc::new(SessionContext::new(
        store.clone(),
        ConnectivityMonitor::default(),
    ));
    let transport = Arc::new(
        HttpTransport::new(config.clone(), store).context("Failed to build the HTTP client")?,
    );
    let api = Arc::new(PalletApi::new(transport, session));

    let background = CancellationToken::new();
    let banner = spawn_link_banner(api.session().connectivity(), background.clone());
    let link_check = spawn_link_check(
        api.clone(),
        config.link_check_interval,
        background.clone(),
    );

    let mut prompt = Prompt::stdin();
    let result = run(&api, &mut prompt).await;

    background.cancel();
    let _ = tokio::join!(banner, link_check);
    info!("👋 Pallet terminal stopped");
    result
}

async fn run(api: &Arc<PalletApi>, prompt: &mut Prompt) -> anyhow::Result<()> {
    if !api.session().is_logged_in() && !handlers::login(api, prompt).await? {
        return Ok(());
    }

    loop {
        say(format!("\n[{}] {}", clock_label(&warehouse_now()), MENU));
        let Some(line) = prompt.ask("> ").await? else {
            break;
        };
        if line.is_empty() {
            continue;
        }

        let Some(choice) = MenuChoice::parse(&line) else {
            say(format!("⚠️ Unknown choice '{line}'"));
            continue;
        };

        let result = match choice {
            MenuChoice::Entry => handlers::entry::run_entry(api, prompt).await,
            MenuChoice::Batch(operation) => {
                handlers::operation::run_operation(api, prompt, operation).await
            }
            MenuChoice::Relocate => handlers::entry::run_relocation(api, prompt).await,
            MenuChoice::Consultation => {
                handlers::consultation::run_consultation(api, prompt).await
            }
            MenuChoice::Logout => {
                api.session().logout();
                if handlers::login(api, prompt).await? {
                    Ok(())
                } else {
                    break;
                }
            }
            MenuChoice::Quit => break,
        };

        if let Err(e) = result {
            warn!("⚠️ Screen ended with an error: {e:#}");
            say(format!("❌ {e:#}"));
        }

        if !api.session().is_logged_in() && !handlers::login(api, prompt).await? {
            break;
        }
    }

    Ok(())
}
