use tracing::{debug, info};

use crate::error::WorkflowError;
use crate::models::{CandidateItem, Operation, Overrides, PendingTransaction};
use crate::utils::warehouse_now;

use super::CandidateSet;

/// A pending transaction together with the candidate it consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    pub transaction: PendingTransaction,
    pub origin: CandidateItem,
}

/// Ordered pending transactions for one operation. Insertion order is
/// display order.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    entries: Vec<BatchEntry>,
}

fn check_overrides(operation: Operation, overrides: &Overrides) -> Result<(), WorkflowError> {
    if !overrides.is_empty() && !operation.accepts_overrides() {
        return Err(WorkflowError::input(format!(
            "Quantity and location cannot be changed for {operation}"
        )));
    }
    Ok(())
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_entries(entries: Vec<BatchEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    pub fn contains(&self, pallet_id: &str) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.origin.matches(pallet_id))
    }

    /// Snapshot of the pending transactions in display order
    pub fn list(&self) -> Vec<PendingTransaction> {
        self.transactions().cloned().collect()
    }

    pub fn transactions(&self) -> impl Iterator<Item = &PendingTransaction> {
        self.entries.iter().map(|entry| &entry.transaction)
    }

    /// Turn the candidate at `index` into a pending transaction and move it
    /// out of `set`.
    ///
    /// Nothing is mutated when a check fails: duplicate pallet, overrides on
    /// a status-only operation, or an inventory count without a location.
    pub fn confirm(
        &mut self,
        set: &mut CandidateSet,
        index: usize,
        operation: Operation,
        overrides: Overrides,
    ) -> Result<&PendingTransaction, WorkflowError> {
        let candidate = set
            .get(index)
            .ok_or_else(|| WorkflowError::input(format!("No candidate at position {index}")))?;

        if self.contains(&candidate.id) {
            return Err(WorkflowError::Duplicate {
                id: candidate.id.clone(),
            });
        }
        check_overrides(operation, &overrides)?;

        let location = overrides
            .location
            .clone()
            .or_else(|| candidate.location.clone());
        if operation.requires_location() && location.is_none() {
            return Err(WorkflowError::input(format!(
                "Pallet '{}' needs a location",
                candidate.id
            )));
        }

        let transaction = PendingTransaction {
            pallet_id: candidate.id.clone(),
            quantity: overrides.quantity.unwrap_or(candidate.quantity),
            status: operation.target_status(),
            location,
            confirmed_at: warehouse_now(),
        };

        let Some(origin) = set.take(index) else {
            return Err(WorkflowError::input(format!("No candidate at position {index}")));
        };
        info!(
            pallet = %transaction.pallet_id,
            quantity = transaction.quantity,
            status = %transaction.status,
            "➕ Pallet added to batch"
        );
        self.entries.push(BatchEntry { transaction, origin });

        let last = self.entries.len() - 1;
        Ok(&self.entries[last].transaction)
    }

    /// Drop the entry at `index` and hand back its transaction and the
    /// candidate it came from.
    pub fn remove(&mut self, index: usize) -> Result<BatchEntry, WorkflowError> {
        if index >= self.entries.len() {
            return Err(self.out_of_range(index));
        }
        let entry = self.entries.remove(index);
        info!(pallet = %entry.transaction.pallet_id, "➖ Pallet removed from batch");
        Ok(entry)
    }

    pub fn edit(
        &mut self,
        index: usize,
        operation: Operation,
        overrides: Overrides,
    ) -> Result<&PendingTransaction, WorkflowError> {
        check_overrides(operation, &overrides)?;
        let len = self.entries.len();
        let Some(entry) = self.entries.get_mut(index) else {
            return Err(WorkflowError::input(format!(
                "No batch entry at position {index} ({len} pending)"
            )));
        };

        if let Some(quantity) = overrides.quantity {
            entry.transaction.quantity = quantity;
        }
        if let Some(location) = overrides.location {
            entry.transaction.location = Some(location);
        }
        debug!(
            pallet = %entry.transaction.pallet_id,
            quantity = entry.transaction.quantity,
            location = ?entry.transaction.location,
            "✏️ Batch entry edited"
        );
        Ok(&entry.transaction)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn into_entries(self) -> Vec<BatchEntry> {
        self.entries
    }

    fn out_of_range(&self, index: usize) -> WorkflowError {
        WorkflowError::input(format!(
            "No batch entry at position {index} ({} pending)",
            self.entries.len()
        ))
    }
}
