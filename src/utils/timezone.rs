use chrono::{DateTime, Utc};
use chrono_tz::{Europe::Paris, Tz};

/// Warehouse timezone
pub const WAREHOUSE_TZ: Tz = Paris;

/// Get current time in the warehouse timezone
pub fn warehouse_now() -> DateTime<Tz> {
    Utc::now().with_timezone(&WAREHOUSE_TZ)
}

/// Short wall-clock label used when listing pending pallets
pub fn clock_label(at: &DateTime<Tz>) -> String {
    at.format("%H:%M:%S").to_string()
}
