//! Scan → validate → batch → submit workflow shared by the inventory,
//! destruction, return and production-output screens, plus the entry and
//! consultation screens built on the same pieces.

mod batch;
mod candidates;
mod consultation;
mod entry;
mod matcher;
mod screen;
mod submit;

use std::fmt;

pub use batch::{Batch, BatchEntry};
pub use candidates::CandidateSet;
pub use consultation::Consultation;
pub use entry::EntryScreen;
pub use matcher::ScanMatcher;
pub use screen::{OperationScreen, ReturnState};
pub use submit::{SubmitAck, SubmitCoordinator};

/// Lifecycle of an operation screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    Idle,
    Loading,
    Ready,
    Reviewing,
    Submitting,
    Committed,
    LoggedOut,
}

impl ScreenState {
    /// No further action is possible once committed or logged out.
    pub fn is_terminal(self) -> bool {
        matches!(self, ScreenState::Committed | ScreenState::LoggedOut)
    }
}

impl fmt::Display for ScreenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScreenState::Idle => "idle",
            ScreenState::Loading => "loading",
            ScreenState::Ready => "scanning",
            ScreenState::Reviewing => "reviewing",
            ScreenState::Submitting => "submitting",
            ScreenState::Committed => "committed",
            ScreenState::LoggedOut => "logged out",
        };
        f.write_str(label)
    }
}
