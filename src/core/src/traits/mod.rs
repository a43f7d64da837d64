//! Collaborator traits shared across the CareLink crates

pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock};
