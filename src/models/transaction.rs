use std::fmt;

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;

use crate::error::WorkflowError;

/// Batch operations sharing the scan → batch → submit workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Inventory,
    Destruction,
    Return,
    ProductionOutput,
}

/// Fields each operation sends for a pending pallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// `{num_palette, statut}`
    StatusOnly,
    /// `{num_palette, quantite, statut, emplacement}`
    Full,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Inventory,
        Operation::Destruction,
        Operation::Return,
        Operation::ProductionOutput,
    ];

    pub fn candidates_path(self) -> &'static str {
        match self {
            Operation::Inventory => "/inventaire",
            Operation::Destruction => "/sorties/destruction",
            Operation::Return => "/sorties/renvoie",
            Operation::ProductionOutput => "/sorties/production",
        }
    }

    pub fn submit_path(self) -> &'static str {
        match self {
            Operation::Inventory => "/inventaire/valider_inventaire",
            Operation::Destruction => "/sorties/valider_destruction",
            Operation::Return => "/sorties/valider_renvoie",
            Operation::ProductionOutput => "/sorties/valider_production",
        }
    }

    pub fn target_status(self) -> TargetStatus {
        match self {
            Operation::Inventory => TargetStatus::InStock,
            Operation::Destruction => TargetStatus::Destroyed,
            Operation::Return => TargetStatus::ToBeReturned,
            Operation::ProductionOutput => TargetStatus::InProduction,
        }
    }

    pub fn payload_shape(self) -> PayloadShape {
        match self {
            Operation::Destruction | Operation::Return => PayloadShape::StatusOnly,
            Operation::Inventory | Operation::ProductionOutput => PayloadShape::Full,
        }
    }

    /// Quantity and location are only meaningful when they reach the wire.
    pub fn accepts_overrides(self) -> bool {
        self.payload_shape() == PayloadShape::Full
    }

    /// An inventory count must place the pallet somewhere.
    pub fn requires_location(self) -> bool {
        matches!(self, Operation::Inventory)
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "inventaire" | "inventory" => Some(Operation::Inventory),
            "destruction" => Some(Operation::Destruction),
            "renvoi" | "renvoie" | "return" => Some(Operation::Return),
            "production" | "sortie" => Some(Operation::ProductionOutput),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Operation::Inventory => "inventory",
            Operation::Destruction => "destruction",
            Operation::Return => "return",
            Operation::ProductionOutput => "production output",
        };
        f.write_str(label)
    }
}

/// Status a pallet takes once its operation is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TargetStatus {
    #[serde(rename = "En stock")]
    InStock,
    #[serde(rename = "Détruite")]
    Destroyed,
    #[serde(rename = "A Renvoyer")]
    ToBeReturned,
    #[serde(rename = "En Prod")]
    InProduction,
}

impl TargetStatus {
    pub fn wire_value(self) -> &'static str {
        match self {
            TargetStatus::InStock => "En stock",
            TargetStatus::Destroyed => "Détruite",
            TargetStatus::ToBeReturned => "A Renvoyer",
            TargetStatus::InProduction => "En Prod",
        }
    }
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_value())
    }
}

/// Quantity/location entered by the operator instead of the candidate's.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub quantity: Option<u32>,
    pub location: Option<String>,
}

impl Overrides {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.quantity.is_none() && self.location.is_none()
    }

    pub fn quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn location(mut self, location: &str) -> Self {
        let location = location.trim();
        self.location = (!location.is_empty()).then(|| location.to_string());
        self
    }

    /// Parse a typed quantity; blank means "keep the default".
    pub fn parse_quantity(raw: &str) -> Result<Option<u32>, WorkflowError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse::<u32>()
            .map(Some)
            .map_err(|_| WorkflowError::input(format!("'{raw}' is not a valid quantity")))
    }
}

/// A confirmed, not yet submitted operation on one pallet.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTransaction {
    pub pallet_id: String,
    pub quantity: u32,
    pub status: TargetStatus,
    pub location: Option<String>,
    pub confirmed_at: DateTime<Tz>,
}

impl PendingTransaction {
    pub fn payload(&self, shape: PayloadShape) -> WirePayload<'_> {
        match shape {
            PayloadShape::StatusOnly => WirePayload::StatusOnly {
                num_palette: &self.pallet_id,
                statut: self.status,
            },
            PayloadShape::Full => WirePayload::Full {
                num_palette: &self.pallet_id,
                quantite: self.quantity,
                statut: self.status,
                emplacement: self.location.as_deref(),
            },
        }
    }
}

/// One element of a submit request body.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum WirePayload<'a> {
    StatusOnly {
        num_palette: &'a str,
        statut: TargetStatus,
    },
    Full {
        num_palette: &'a str,
        quantite: u32,
        statut: TargetStatus,
        emplacement: Option<&'a str>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::warehouse_now;
    use serde_json::json;

    fn pending(status: TargetStatus) -> PendingTransaction {
        PendingTransaction {
            pallet_id: "P1".to_string(),
            quantity: 5,
            status,
            location: Some("A1 01".to_string()),
            confirmed_at: warehouse_now(),
        }
    }

    #[test]
    fn test_destruction_omits_quantity_and_location() {
        let t = pending(Operation::Destruction.target_status());
        let body = serde_json::to_value(t.payload(Operation::Destruction.payload_shape())).unwrap();
        assert_eq!(body, json!({"num_palette": "P1", "statut": "Détruite"}));
    }

    #[test]
    fn test_inventory_sends_every_field() {
        let t = pending(Operation::Inventory.target_status());
        let body = serde_json::to_value(t.payload(Operation::Inventory.payload_shape())).unwrap();
        assert_eq!(
            body,
            json!({"num_palette": "P1", "quantite": 5, "statut": "En stock", "emplacement": "A1 01"})
        );
    }

    #[test]
    fn test_operation_table() {
        assert_eq!(Operation::Return.target_status().wire_value(), "A Renvoyer");
        assert_eq!(Operation::ProductionOutput.submit_path(), "/sorties/valider_production");
        assert!(!Operation::Return.accepts_overrides());
        assert!(Operation::ProductionOutput.accepts_overrides());
        assert!(Operation::Inventory.requires_location());
        assert_eq!(Operation::parse("Renvoi"), Some(Operation::Return));
        assert_eq!(Operation::parse("entree"), None);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(Overrides::parse_quantity(" 12 ").unwrap(), Some(12));
        assert_eq!(Overrides::parse_quantity("").unwrap(), None);
        assert!(matches!(
            Overrides::parse_quantity("-3"),
            Err(WorkflowError::Input(_))
        ));
        assert!(Overrides::parse_quantity("douze").is_err());
    }
}
