pub mod availability;

pub use availability::{parse_slot, AvailabilityService};
