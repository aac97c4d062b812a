use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::PalletApi;
use crate::error::WorkflowError;
use crate::models::{Operation, Overrides, PendingTransaction, SlotDirectory};

use super::{
    Batch, BatchEntry, CandidateSet, ScanMatcher, ScreenState, SubmitAck, SubmitCoordinator,
};

/// What a screen hands back to its caller when the session ends under it,
/// so scanned work survives a re-login.
#[derive(Debug, Clone)]
pub struct ReturnState {
    pub operation: Operation,
    pub entries: Vec<BatchEntry>,
}

impl ReturnState {
    pub fn pending(&self) -> usize {
        self.entries.len()
    }
}

/// Controller of one batch operation screen.
///
/// Owns the candidate set, the batch and a cancellation token derived from
/// the session. Dropping the screen cancels whatever it still has in flight.
pub struct OperationScreen {
    operation: Operation,
    api: Arc<PalletApi>,
    state: ScreenState,
    candidates: CandidateSet,
    batch: Batch,
    slots: Option<SlotDirectory>,
    cancel: CancellationToken,
}

impl OperationScreen {
    pub fn new(api: Arc<PalletApi>, operation: Operation) -> Self {
        let cancel = api.session().cancellation_token();
        Self {
            operation,
            api,
            state: ScreenState::Idle,
            candidates: CandidateSet::default(),
            batch: Batch::new(),
            slots: None,
            cancel,
        }
    }

    /// Rebuild a screen from a [`ReturnState`]. Call [`activate`] next; the
    /// preserved pallets are kept out of the fresh candidate list.
    ///
    /// [`activate`]: OperationScreen::activate
    pub fn resume(api: Arc<PalletApi>, saved: ReturnState) -> Self {
        info!(operation = %saved.operation, pending = saved.pending(), "↩️ Resuming screen");
        let mut screen = Self::new(api, saved.operation);
        screen.batch = Batch::from_entries(saved.entries);
        screen
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn state(&self) -> ScreenState {
        self.state
    }

    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    pub fn slots(&self) -> Option<&SlotDirectory> {
        self.slots.as_ref()
    }

    /// Fetch the candidate list. Also serves as a manual refresh from
    /// `Ready`; a failed load keeps whatever was shown before.
    pub async fn activate(&mut self) -> Result<usize, WorkflowError> {
        self.expect_state("load candidates", &[ScreenState::Idle, ScreenState::Ready])?;
        self.ensure_session()?;

        let previous = self.state;
        self.transition(ScreenState::Loading);
        let batch = &self.batch;
        let result = self
            .candidates
            .refresh(&self.api, self.operation, |id| batch.contains(id), &self.cancel)
            .await;

        match &result {
            Ok(_) => self.transition(ScreenState::Ready),
            Err(e) => self.settle_after_failure(e, previous),
        }
        result
    }

    /// Load warehouse slots so typed locations can be checked. Only
    /// meaningful for operations that place pallets.
    pub async fn load_slots(&mut self) -> Result<usize, WorkflowError> {
        if self.state.is_terminal() {
            return Err(self.invalid("load locations"));
        }
        self.ensure_session()?;

        match self.api.locations(&self.cancel).await {
            Ok(slots) => {
                let directory = SlotDirectory::new(slots);
                let count = directory.len();
                self.slots = Some(directory);
                Ok(count)
            }
            Err(e) => {
                if matches!(e, WorkflowError::AuthExpired) {
                    self.transition(ScreenState::LoggedOut);
                }
                Err(e)
            }
        }
    }

    pub fn scan(
        &mut self,
        scanned: &str,
        overrides: Overrides,
    ) -> Result<&PendingTransaction, WorkflowError> {
        self.expect_state("scan", &[ScreenState::Ready])?;
        let index = ScanMatcher::find(&self.candidates, scanned)?;
        let overrides = self.resolve_location(overrides)?;
        self.batch
            .confirm(&mut self.candidates, index, self.operation, overrides)
    }

    /// Take an entry out of the batch and give its pallet back to the
    /// candidate list.
    pub fn remove(&mut self, index: usize) -> Result<PendingTransaction, WorkflowError> {
        self.expect_state("remove", &[ScreenState::Ready, ScreenState::Reviewing])?;
        let entry = self.batch.remove(index)?;
        self.candidates.restore(entry.origin);
        Ok(entry.transaction)
    }

    pub fn edit(
        &mut self,
        index: usize,
        overrides: Overrides,
    ) -> Result<&PendingTransaction, WorkflowError> {
        self.expect_state("edit", &[ScreenState::Ready, ScreenState::Reviewing])?;
        let overrides = self.resolve_location(overrides)?;
        self.batch.edit(index, self.operation, overrides)
    }

    pub fn review(&mut self) -> Result<Vec<PendingTransaction>, WorkflowError> {
        self.expect_state("review", &[ScreenState::Ready, ScreenState::Reviewing])?;
        if self.batch.is_empty() {
            return Err(WorkflowError::EmptyBatch);
        }
        self.transition(ScreenState::Reviewing);
        Ok(self.batch.list())
    }

    pub fn back_to_scanning(&mut self) -> Result<(), WorkflowError> {
        self.expect_state("go back to scanning", &[ScreenState::Reviewing])?;
        self.transition(ScreenState::Ready);
        Ok(())
    }

    pub async fn submit(&mut self) -> Result<SubmitAck, WorkflowError> {
        self.expect_state("submit", &[ScreenState::Ready, ScreenState::Reviewing])?;
        self.ensure_session()?;

        let previous = self.state;
        self.transition(ScreenState::Submitting);
        let result =
            SubmitCoordinator::submit(&self.api, self.operation, &mut self.batch, &self.cancel)
                .await;

        match &result {
            Ok(_) => self.transition(ScreenState::Committed),
            Err(e) => self.settle_after_failure(e, previous),
        }
        result
    }

    /// Hand the batch back to the caller, typically after the session
    /// expired. The screen is consumed.
    pub fn suspend(mut self) -> ReturnState {
        self.cancel.cancel();
        let entries = std::mem::take(&mut self.batch).into_entries();
        info!(operation = %self.operation, pending = entries.len(), "💾 Screen suspended");
        ReturnState {
            operation: self.operation,
            entries,
        }
    }

    /// Leave the screen, cancelling in-flight requests.
    pub fn close(&mut self) {
        if !self.cancel.is_cancelled() {
            debug!(operation = %self.operation, "Screen closed");
            self.cancel.cancel();
        }
    }

    /// Typed locations must name a known slot once slots are loaded; the
    /// directory's spelling is kept.
    fn resolve_location(&self, mut overrides: Overrides) -> Result<Overrides, WorkflowError> {
        let (Some(typed), Some(slots)) = (overrides.location.as_deref(), &self.slots) else {
            return Ok(overrides);
        };
        let slot = slots
            .find(typed)
            .ok_or_else(|| WorkflowError::input(format!("Unknown location '{typed}'")))?;
        overrides.location = Some(slot.location.clone());
        Ok(overrides)
    }

    fn ensure_session(&mut self) -> Result<(), WorkflowError> {
        if self.api.session().is_logged_in() {
            return Ok(());
        }
        self.transition(ScreenState::LoggedOut);
        Err(WorkflowError::AuthExpired)
    }

    fn settle_after_failure(&mut self, error: &WorkflowError, previous: ScreenState) {
        let next = match error {
            WorkflowError::AuthExpired => ScreenState::LoggedOut,
            e if e.is_local() => previous,
            WorkflowError::Cancelled => previous,
            _ => ScreenState::Ready,
        };
        self.transition(next);
    }

    fn expect_state(
        &self,
        action: &'static str,
        allowed: &[ScreenState],
    ) -> Result<(), WorkflowError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> WorkflowError {
        WorkflowError::InvalidState {
            action,
            state: self.state,
        }
    }

    fn transition(&mut self, next: ScreenState) {
        if self.state == next {
            return;
        }
        match next {
            ScreenState::LoggedOut => {
                warn!(operation = %self.operation, from = %self.state, "🔒 Screen logged out")
            }
            _ => debug!(operation = %self.operation, from = %self.state, to = %next, "Screen state"),
        }
        self.state = next;
    }
}

impl Drop for OperationScreen {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
