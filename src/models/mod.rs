pub mod location;
pub mod pallet;
pub mod transaction;

pub use location::{rack_of, LocationSlot, SlotDirectory};
pub use pallet::{
    CandidateItem, EntryRequest, LoginResponse, RelocationRequest, ServerMessage,
};
pub use transaction::{
    Operation, Overrides, PayloadShape, PendingTransaction, TargetStatus, WirePayload,
};
