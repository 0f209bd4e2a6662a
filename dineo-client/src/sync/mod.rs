//! Order status synchronizer
//!
//! Three channels report status for the active order: an initial fetch, a
//! periodic poll and a push subscription. They arrive in any order and may
//! repeat. All of them go through one [`StatusRegister::apply`], which only
//! ever moves forward, so the merge needs no channel ordering.

mod register;
mod tracker;

pub use register::StatusRegister;
pub use tracker::{StatusSource, StatusTracker, TrackerOptions};
