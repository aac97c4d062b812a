use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::api::PalletApi;
use crate::error::WorkflowError;
use crate::models::{CandidateItem, LocationSlot, SlotDirectory};

/// Single-pallet put-away: look a pallet up, pick a rack then a slot,
/// record the entry. Also moves an already stored pallet.
pub struct EntryScreen {
    api: Arc<PalletApi>,
    slots: SlotDirectory,
    pallet: Option<CandidateItem>,
    cancel: CancellationToken,
}

impl EntryScreen {
    pub fn new(api: Arc<PalletApi>) -> Self {
        let cancel = api.session().cancellation_token();
        Self {
            api,
            slots: SlotDirectory::default(),
            pallet: None,
            cancel,
        }
    }

    pub fn pallet(&self) -> Option<&CandidateItem> {
        self.pallet.as_ref()
    }

    pub fn slots(&self) -> &SlotDirectory {
        &self.slots
    }

    pub fn racks(&self) -> Vec<String> {
        self.slots.racks()
    }

    pub fn slots_in_rack(&self, rack: &str) -> Vec<&LocationSlot> {
        self.slots.slots_in_rack(rack)
    }

    /// Reload the slot directory; a failure keeps the previous one.
    pub async fn load_slots(&mut self) -> Result<usize, WorkflowError> {
        self.ensure_online()?;
        let slots = self.api.locations(&self.cancel).await?;
        self.slots = SlotDirectory::new(slots);
        info!(slots = self.slots.len(), "🗄️ Locations loaded");
        Ok(self.slots.len())
    }

    pub async fn lookup(&mut self, pallet_id: &str) -> Result<&CandidateItem, WorkflowError> {
        let pallet_id = pallet_id.trim();
        if pallet_id.is_empty() {
            return Err(WorkflowError::input("Scan or type a pallet number"));
        }
        self.ensure_online()?;

        let pallet = match self.api.pallet_info(pallet_id, &self.cancel).await {
            Ok(pallet) => pallet,
            Err(WorkflowError::Validation { status: 404, .. }) => {
                self.pallet = None;
                return Err(WorkflowError::NotFound {
                    id: pallet_id.to_string(),
                });
            }
            Err(e) => {
                self.pallet = None;
                return Err(e);
            }
        };
        info!(pallet = %pallet.id, "🔍 Pallet found");
        Ok(self.pallet.insert(pallet))
    }

    /// Put the looked-up pallet at `location`. On success the screen is
    /// cleared for the next pallet and the slots are reloaded.
    pub async fn record(&mut self, location: &str) -> Result<String, WorkflowError> {
        self.ensure_online()?;
        let Some(pallet) = self.pallet.as_ref() else {
            return Err(WorkflowError::input("Look up a pallet first"));
        };
        let slot = self.known_slot(location)?;
        if !slot.is_free() {
            warn!(location = %slot.location, state = %slot.state, "Slot is not free");
        }

        let pallet_id = pallet.id.clone();
        let location = slot.location.clone();
        self.api
            .record_entry(&pallet_id, &location, &self.cancel)
            .await?;
        info!(pallet = %pallet_id, location = %location, "📥 Entry recorded");

        self.pallet = None;
        if let Err(e) = self.load_slots().await {
            warn!("⚠️ Locations not refreshed after entry: {e}");
        }
        Ok(location)
    }

    /// Move a stored pallet to another slot.
    pub async fn relocate(&mut self, pallet_id: &str, location: &str) -> Result<String, WorkflowError> {
        let pallet_id = pallet_id.trim();
        if pallet_id.is_empty() {
            return Err(WorkflowError::input("Scan or type a pallet number"));
        }
        self.ensure_online()?;
        let location = self.known_slot(location)?.location.clone();

        self.api.relocate(pallet_id, &location, &self.cancel).await?;
        info!(pallet = %pallet_id, location = %location, "🚚 Pallet moved");

        if let Err(e) = self.load_slots().await {
            warn!("⚠️ Locations not refreshed after move: {e}");
        }
        Ok(location)
    }

    pub fn close(&mut self) {
        self.cancel.cancel();
    }

    fn known_slot(&self, location: &str) -> Result<&LocationSlot, WorkflowError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(WorkflowError::input("Pick a location"));
        }
        self.slots
            .find(location)
            .ok_or_else(|| WorkflowError::input(format!("Unknown location '{location}'")))
    }

    fn ensure_online(&self) -> Result<(), WorkflowError> {
        if self.api.session().is_online() {
            Ok(())
        } else {
            Err(WorkflowError::Offline)
        }
    }
}

impl Drop for EntryScreen {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
