//! Warehouse pallet terminal: scan pallets, check them against the
//! server's candidate lists, batch them and submit each batch in one
//! request.

pub mod api;
pub mod config;
pub mod connectivity;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod session;
pub mod transport;
pub mod utils;
pub mod workflow;

pub use api::{ConsultationFilter, PalletApi};
pub use config::ClientConfig;
pub use error::WorkflowError;
pub use session::SessionContext;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
