use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::{ConsultationFilter, PalletApi};
use crate::constants::{CONSULTATION_STATUSES, FILTER_ALL};
use crate::error::WorkflowError;
use crate::models::CandidateItem;

/// Read-only pallet search.
pub struct Consultation {
    api: Arc<PalletApi>,
    results: Vec<CandidateItem>,
    cancel: CancellationToken,
}

impl Consultation {
    pub fn new(api: Arc<PalletApi>) -> Self {
        let cancel = api.session().cancellation_token();
        Self {
            api,
            results: Vec::new(),
            cancel,
        }
    }

    /// Status picker entries, "all" first
    pub fn statuses() -> Vec<&'static str> {
        std::iter::once(FILTER_ALL)
            .chain(CONSULTATION_STATUSES)
            .collect()
    }

    pub fn results(&self) -> &[CandidateItem] {
        &self.results
    }

    pub async fn search(
        &mut self,
        filter: &ConsultationFilter,
    ) -> Result<&[CandidateItem], WorkflowError> {
        if !self.api.session().is_online() {
            return Err(WorkflowError::Offline);
        }
        self.results = self.api.consult(filter, &self.cancel).await?;
        info!(found = self.results.len(), "🔎 Consultation done");
        Ok(self.results.as_slice())
    }
}

impl Drop for Consultation {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
