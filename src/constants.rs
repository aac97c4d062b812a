// Application Constants
// Centralized constants to avoid magic strings

/// Default API configuration
pub const DEFAULT_API_URL: &str = "https://apimdo.fr/";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CREDENTIALS_PATH: &str = ".pallet-credentials.json";
/// How often the server is contacted while the link is down
pub const DEFAULT_LINK_CHECK_SECS: u64 = 10;

/// Credential store key holding the bearer token
pub const TOKEN_KEY: &str = "token";

/// Slot state reported by the server for an empty location
pub const SLOT_FREE: &str = "Libre";

/// Filter value meaning "no filter" in client and status pickers
pub const FILTER_ALL: &str = "Tous";

/// Statuses offered by the consultation search
pub const CONSULTATION_STATUSES: [&str; 7] = [
    "En stock",
    "À Détruire",
    "Détruite",
    "En Prod",
    "A Renvoyer",
    "Renvoyé",
    "A Inventorier",
];

/// Header carrying a per-request correlation id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// API response messages
pub const MSG_SESSION_EXPIRED: &str = "Session expired, please log in again";
pub const MSG_OFFLINE: &str = "No network connection";
