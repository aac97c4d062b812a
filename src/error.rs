use thiserror::Error;

use crate::constants::{MSG_OFFLINE, MSG_SESSION_EXPIRED};
use crate::transport::TransportError;
use crate::workflow::ScreenState;

/// Errors surfaced by the pallet workflow.
///
/// `Network`, `AuthExpired` and `Validation` come back from the server side;
/// the rest are detected locally and never change screen state.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("{}", MSG_SESSION_EXPIRED)]
    AuthExpired,

    #[error("Server rejected the request ({status}): {body}")]
    Validation { status: u16, body: String },

    #[error("Pallet '{id}' is not eligible for this operation")]
    NotFound { id: String },

    #[error("{0}")]
    Input(String),

    #[error("Pallet '{id}' is already in the batch")]
    Duplicate { id: String },

    #[error("Nothing to submit")]
    EmptyBatch,

    #[error("{}", MSG_OFFLINE)]
    Offline,

    #[error("Cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: ScreenState,
    },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Unexpected response body: {0}")]
    Decode(String),
}

impl WorkflowError {
    pub fn input(message: impl Into<String>) -> Self {
        WorkflowError::Input(message.into())
    }

    /// True for errors resolved on the device without a server round-trip.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            WorkflowError::NotFound { .. }
                | WorkflowError::Input(_)
                | WorkflowError::Duplicate { .. }
                | WorkflowError::EmptyBatch
                | WorkflowError::Offline
                | WorkflowError::InvalidState { .. }
        )
    }

    /// HTTP status attached to a server rejection.
    pub fn status(&self) -> Option<u16> {
        match self {
            WorkflowError::Validation { status, .. } => Some(*status),
            WorkflowError::AuthExpired => Some(401),
            _ => None,
        }
    }
}

impl From<TransportError> for WorkflowError {
    fn from(error: TransportError) -> Self {
        WorkflowError::Network(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_errors_are_flagged() {
        assert!(WorkflowError::NotFound { id: "P9".into() }.is_local());
        assert!(WorkflowError::input("bad quantity").is_local());
        assert!(WorkflowError::EmptyBatch.is_local());
        assert!(!WorkflowError::AuthExpired.is_local());
        assert!(!WorkflowError::Network("reset".into()).is_local());
    }

    #[test]
    fn test_validation_message_carries_status_and_body() {
        let error = WorkflowError::Validation {
            status: 500,
            body: "conflict".into(),
        };
        assert_eq!(error.status(), Some(500));
        assert_eq!(
            error.to_string(),
            "Server rejected the request (500): conflict"
        );
    }
}
