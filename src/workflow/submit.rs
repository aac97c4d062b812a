use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::api::PalletApi;
use crate::error::WorkflowError;
use crate::models::Operation;

use super::Batch;

/// Outcome of a committed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitAck {
    pub submitted: usize,
    pub message: Option<String>,
}

/// Sends a whole batch in one request and reconciles the batch with the
/// outcome.
pub struct SubmitCoordinator;

impl SubmitCoordinator {
    /// The batch is cleared only on a 2xx. Every failure leaves it intact,
    /// and the local preconditions (non-empty batch, then connectivity)
    /// fail without a request.
    pub async fn submit(
        api: &PalletApi,
        operation: Operation,
        batch: &mut Batch,
        cancel: &CancellationToken,
    ) -> Result<SubmitAck, WorkflowError> {
        if batch.is_empty() {
            return Err(WorkflowError::EmptyBatch);
        }
        if !api.session().is_online() {
            warn!(%operation, pending = batch.len(), "📵 Offline, batch kept");
            return Err(WorkflowError::Offline);
        }

        let transactions = batch.list();
        info!(%operation, count = transactions.len(), "📤 Submitting batch");

        match api.submit(operation, &transactions, cancel).await {
            Ok(ack) => {
                batch.clear();
                info!(%operation, count = transactions.len(), "✅ Batch committed");
                Ok(SubmitAck {
                    submitted: transactions.len(),
                    message: ack.message,
                })
            }
            Err(e) => {
                match &e {
                    WorkflowError::Network(_) => {
                        error!(%operation, pending = batch.len(), "❌ Submit failed: {e}")
                    }
                    _ => warn!(%operation, pending = batch.len(), "⚠️ Submit not committed: {e}"),
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::connectivity::{Connectivity, ConnectivityMonitor};
    use crate::constants::TOKEN_KEY;
    use crate::credentials::{CredentialStore, MemoryCredentialStore};
    use crate::models::{CandidateItem, Overrides};
    use crate::session::SessionContext;
    use crate::transport::scripted::ScriptedTransport;
    use crate::transport::RequestBody;
    use crate::workflow::CandidateSet;
    use serde_json::json;

    struct Fixture {
        api: PalletApi,
        transport: Arc<ScriptedTransport>,
        store: Arc<MemoryCredentialStore>,
        monitor: ConnectivityMonitor,
    }

    fn fixture() -> Fixture {
        let transport = Arc::new(ScriptedTransport::new());
        let store = Arc::new(MemoryCredentialStore::with_entry(TOKEN_KEY, "jwt"));
        let monitor = ConnectivityMonitor::new(Connectivity::Wifi);
        let session = Arc::new(SessionContext::new(store.clone(), monitor.clone()));
        Fixture {
            api: PalletApi::new(transport.clone(), session),
            transport,
            store,
            monitor,
        }
    }

    fn batch_of(operation: Operation, ids: &[&str]) -> Batch {
        let mut set = CandidateSet::new(
            ids.iter()
                .map(|id| CandidateItem::new(*id, 4, Some("A1 01")))
                .collect(),
        );
        let mut batch = Batch::new();
        for _ in ids {
            batch
                .confirm(&mut set, 0, operation, Overrides::none())
                .unwrap();
        }
        batch
    }

    #[tokio::test]
    async fn test_empty_batch_issues_no_request() {
        let f = fixture();
        let mut batch = Batch::new();

        let result =
            SubmitCoordinator::submit(&f.api, Operation::Return, &mut batch, &CancellationToken::new())
                .await;
        assert!(matches!(result, Err(WorkflowError::EmptyBatch)));
        assert_eq!(f.transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_offline_keeps_batch() {
        let f = fixture();
        f.monitor.set(Connectivity::Offline);
        let mut batch = batch_of(Operation::Return, &["P1"]);

        let result =
            SubmitCoordinator::submit(&f.api, Operation::Return, &mut batch, &CancellationToken::new())
                .await;
        assert!(matches!(result, Err(WorkflowError::Offline)));
        assert_eq!(batch.len(), 1);
        assert_eq!(f.transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_success_clears_batch_and_sends_one_array() {
        let f = fixture();
        f.transport.reply_json(json!({"message": "2 palettes détruites"}));
        let mut batch = batch_of(Operation::Destruction, &["P1", "P2"]);

        let ack = SubmitCoordinator::submit(
            &f.api,
            Operation::Destruction,
            &mut batch,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(ack.submitted, 2);
        assert_eq!(ack.message.as_deref(), Some("2 palettes détruites"));
        assert!(batch.is_empty());

        let requests = f.transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "/sorties/valider_destruction");
        match &requests[0].body {
            RequestBody::Json(body) => assert_eq!(
                body,
                &json!([
                    {"num_palette": "P1", "statut": "Détruite"},
                    {"num_palette": "P2", "statut": "Détruite"}
                ])
            ),
            other => panic!("expected JSON body, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejection_and_network_failure_keep_batch() {
        let f = fixture();
        f.transport.reply(500, "conflict").fail("connection reset");
        let mut batch = batch_of(Operation::ProductionOutput, &["P1", "P2"]);
        let cancel = CancellationToken::new();

        let first =
            SubmitCoordinator::submit(&f.api, Operation::ProductionOutput, &mut batch, &cancel).await;
        match first {
            Err(WorkflowError::Validation { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "conflict");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(batch.len(), 2);

        let second =
            SubmitCoordinator::submit(&f.api, Operation::ProductionOutput, &mut batch, &cancel).await;
        assert!(matches!(second, Err(WorkflowError::Network(_))));
        assert_eq!(batch.len(), 2);
    }

    #[tokio::test]
    async fn test_lost_link_rejects_next_submit_without_a_request() {
        let f = fixture();
        f.transport
            .fail("connection refused")
            .reply(404, "")
            .reply_json(json!({"message": "ok"}));
        let mut batch = batch_of(Operation::Return, &["P1"]);
        let cancel = CancellationToken::new();

        let first = SubmitCoordinator::submit(&f.api, Operation::Return, &mut batch, &cancel).await;
        assert!(matches!(first, Err(WorkflowError::Network(_))));
        assert_eq!(f.monitor.current(), Connectivity::Offline);

        let second = SubmitCoordinator::submit(&f.api, Operation::Return, &mut batch, &cancel).await;
        assert!(matches!(second, Err(WorkflowError::Offline)));
        assert_eq!(f.transport.request_count(), 1);
        assert_eq!(batch.len(), 1);

        assert!(f.api.check_link().await);
        SubmitCoordinator::submit(&f.api, Operation::Return, &mut batch, &cancel)
            .await
            .unwrap();
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn test_unauthorized_purges_token_and_keeps_batch() {
        let f = fixture();
        f.transport.reply(401, "");
        let mut batch = batch_of(Operation::Inventory, &["P1"]);

        let result = SubmitCoordinator::submit(
            &f.api,
            Operation::Inventory,
            &mut batch,
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(result, Err(WorkflowError::AuthExpired)));
        assert!(f.store.get(TOKEN_KEY).is_none());
        assert!(!f.api.session().is_logged_in());
        assert_eq!(batch.len(), 1);
    }
}
