//! Order types
//!
//! - [`CartLine`]: one menu item plus quantity, before submission
//! - [`OrderHeader`] / [`OrderLineRecord`]: remote write shapes
//! - [`OrderSnapshot`]: device-local copy of a submitted order
//! - [`OrderStatus`]: forward-only fulfillment lifecycle
//! - [`StatusEvent`]: push notification payload

pub mod event;
pub mod money;
pub mod snapshot;
pub mod types;

// Re-exports
pub use event::StatusEvent;
pub use snapshot::{OrderSnapshot, OrderStatus, StatusVariant, UnknownStatus};
pub use types::{CartLine, OrderHeader, OrderLineRecord};
