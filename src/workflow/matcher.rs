use crate::error::WorkflowError;

use super::CandidateSet;

/// Looks a scanned or typed identifier up in a [`CandidateSet`].
pub struct ScanMatcher;

impl ScanMatcher {
    /// Position of the first candidate whose identifier equals `scanned`,
    /// ignoring case and surrounding whitespace.
    pub fn find(set: &CandidateSet, scanned: &str) -> Result<usize, WorkflowError> {
        let scanned = scanned.trim();
        if scanned.is_empty() {
            return Err(WorkflowError::input("Scan or type a pallet number"));
        }

        set.items()
            .iter()
            .position(|item| item.matches(scanned))
            .ok_or_else(|| WorkflowError::NotFound {
                id: scanned.to_string(),
            })
    }
}
