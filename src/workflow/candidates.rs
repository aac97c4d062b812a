use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::api::PalletApi;
use crate::error::WorkflowError;
use crate::models::{CandidateItem, Operation};

/// Pallets eligible for the current operation, in server order.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    items: Vec<CandidateItem>,
}

impl CandidateSet {
    pub fn new(items: Vec<CandidateItem>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[CandidateItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&CandidateItem> {
        self.items.get(index)
    }

    pub fn contains(&self, pallet_id: &str) -> bool {
        self.items.iter().any(|item| item.matches(pallet_id))
    }

    /// Replace the whole collection; no incremental merge.
    pub fn replace(&mut self, items: Vec<CandidateItem>) {
        self.items = items;
    }

    pub(crate) fn take(&mut self, index: usize) -> Option<CandidateItem> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    pub(crate) fn restore(&mut self, item: CandidateItem) {
        self.items.push(item);
    }

    /// Fetch the operation's candidates and replace the collection,
    /// skipping pallets for which `keep_out` is true.
    ///
    /// On any failure the previous collection stays in place.
    pub async fn refresh(
        &mut self,
        api: &PalletApi,
        operation: Operation,
        keep_out: impl Fn(&str) -> bool,
        cancel: &CancellationToken,
    ) -> Result<usize, WorkflowError> {
        if !api.session().is_online() {
            warn!(%operation, "📵 Offline, candidates not loaded");
            return Err(WorkflowError::Offline);
        }

        match api.candidates(operation, cancel).await {
            Ok(items) => {
                let fetched = items.len();
                self.replace(items.into_iter().filter(|i| !keep_out(i.id.as_str())).collect());
                info!(
                    %operation,
                    fetched,
                    eligible = self.items.len(),
                    "📦 Candidates loaded"
                );
                Ok(self.items.len())
            }
            Err(e) => {
                warn!(%operation, kept = self.items.len(), "⚠️ Candidate load failed: {e}");
                Err(e)
            }
        }
    }

    /// Distinct non-empty client names, sorted
    pub fn clients(&self) -> Vec<String> {
        let mut clients: Vec<String> = self
            .items
            .iter()
            .filter_map(|item| item.client_name.as_deref())
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string)
            .collect();
        clients.sort();
        clients.dedup();
        clients
    }

    /// Candidates of one client (case-insensitive); `None` keeps everything
    pub fn filtered(&self, client: Option<&str>) -> Vec<&CandidateItem> {
        match client {
            None => self.items.iter().collect(),
            Some(client) => {
                let wanted = client.to_lowercase();
                self.items
                    .iter()
                    .filter(|item| {
                        item.client_name
                            .as_deref()
                            .is_some_and(|name| name.to_lowercase() == wanted)
                    })
                    .collect()
            }
        }
    }
}
