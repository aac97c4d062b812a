use serde::{Deserialize, Serialize};

use crate::constants::SLOT_FREE;

/// A warehouse slot from `GET /emplacement`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSlot {
    #[serde(rename = "emplacement")]
    pub location: String,
    #[serde(rename = "etat")]
    pub state: String,
}

impl LocationSlot {
    pub fn new(location: &str, state: &str) -> Self {
        Self {
            location: location.to_string(),
            state: state.to_string(),
        }
    }

    pub fn is_free(&self) -> bool {
        self.state.eq_ignore_ascii_case(SLOT_FREE)
    }

    pub fn rack(&self) -> &str {
        rack_of(&self.location)
    }
}

/// Rack prefix of a slot string: its first whitespace-separated token.
pub fn rack_of(location: &str) -> &str {
    location.split_whitespace().next().unwrap_or("")
}

/// Slots of the warehouse, free ones first, driving the rack → slot pickers.
#[derive(Debug, Clone, Default)]
pub struct SlotDirectory {
    slots: Vec<LocationSlot>,
}

impl SlotDirectory {
    pub fn new(mut slots: Vec<LocationSlot>) -> Self {
        // Stable: server order is kept within each group
        slots.sort_by_key(|slot| !slot.is_free());
        Self { slots }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[LocationSlot] {
        &self.slots
    }

    /// Distinct racks, sorted
    pub fn racks(&self) -> Vec<String> {
        let mut racks: Vec<String> = self
            .slots
            .iter()
            .map(|slot| slot.rack().to_string())
            .filter(|rack| !rack.is_empty())
            .collect();
        racks.sort();
        racks.dedup();
        racks
    }

    /// Slots of one rack, free first
    pub fn slots_in_rack(&self, rack: &str) -> Vec<&LocationSlot> {
        let prefix = format!("{rack} ");
        self.slots
            .iter()
            .filter(|slot| slot.location.starts_with(&prefix))
            .collect()
    }

    pub fn find(&self, location: &str) -> Option<&LocationSlot> {
        let wanted = location.trim().to_lowercase();
        self.slots
            .iter()
            .find(|slot| slot.location.to_lowercase() == wanted)
    }

    /// Index in `racks()` of the rack holding `location`, for preselection
    pub fn rack_index_of(&self, location: &str) -> Option<usize> {
        let rack = rack_of(location).to_lowercase();
        self.racks().iter().position(|r| r.to_lowercase() == rack)
    }
}
