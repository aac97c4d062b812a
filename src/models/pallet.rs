use serde::{Deserialize, Serialize};

/// A pallet as returned by the candidate, lookup and consultation
/// endpoints. Field names follow the server contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateItem {
    #[serde(rename = "num_palette")]
    pub id: String,
    #[serde(rename = "nom_client", default)]
    pub client_name: Option<String>,
    #[serde(rename = "statut", default)]
    pub status: Option<String>,
    #[serde(default)]
    pub article: Option<String>,
    #[serde(rename = "quantite", default)]
    pub quantity: u32,
    #[serde(rename = "emplacement", default)]
    pub location: Option<String>,
}

impl CandidateItem {
    pub fn new(id: impl Into<String>, quantity: u32, location: Option<&str>) -> Self {
        Self {
            id: id.into(),
            client_name: None,
            status: None,
            article: None,
            quantity,
            location: location.map(str::to_string),
        }
    }

    pub fn with_client(mut self, client: &str) -> Self {
        self.client_name = Some(client.to_string());
        self
    }

    /// Case-insensitive identifier comparison used for scans
    pub fn matches(&self, scanned: &str) -> bool {
        self.id.to_lowercase() == scanned.to_lowercase()
    }

    /// One-line summary for lists
    pub fn summary(&self) -> String {
        format!(
            "{} | {} | {} | qty {} | {}",
            self.id,
            self.client_name.as_deref().unwrap_or("-"),
            self.article.as_deref().unwrap_or("-"),
            self.quantity,
            self.location.as_deref().unwrap_or("-"),
        )
    }
}

/// Body of `POST /entree`
#[derive(Debug, Clone, Serialize)]
pub struct EntryRequest<'a> {
    pub num_palette: &'a str,
    pub emplacement: &'a str,
}

/// Body of `PATCH /emplacement/palette`
#[derive(Debug, Clone, Serialize)]
pub struct RelocationRequest<'a> {
    pub num_palette: &'a str,
    pub nouvel_emplacement: &'a str,
}

/// `POST /auth/login` response
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Optional `{"message": ...}` acknowledgement returned by submits
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerMessage {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decodes_server_row_with_missing_fields() {
        // Destruction candidates come without a status column
        let item: CandidateItem = serde_json::from_value(json!({
            "num_palette": "P1",
            "article": "ART-7",
            "nom_client": "Dupont",
            "quantite": 5,
            "emplacement": null
        }))
        .unwrap();

        assert_eq!(item.id, "P1");
        assert_eq!(item.client_name.as_deref(), Some("Dupont"));
        assert_eq!(item.quantity, 5);
        assert!(item.location.is_none());
        assert!(item.status.is_none());
    }

    #[test]
    fn test_matches_ignores_case() {
        let item = CandidateItem::new("PAL-0042", 1, None);
        assert!(item.matches("pal-0042"));
        assert!(!item.matches("PAL-004"));
    }

    #[test]
    fn test_entry_request_shape() {
        let body = serde_json::to_value(EntryRequest {
            num_palette: "P1",
            emplacement: "R1 03",
        })
        .unwrap();
        assert_eq!(body, json!({"num_palette": "P1", "emplacement": "R1 03"}));
    }
}
