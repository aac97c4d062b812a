pub mod timezone;

pub use timezone::{clock_label, warehouse_now};
