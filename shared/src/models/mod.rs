//! Data models
//!
//! Read-only catalog data and device-local identity.

pub mod dining_table;
pub mod menu_item;

// Re-exports
pub use dining_table::*;
pub use menu_item::*;
