//! Shared types for the Dineo table-side ordering client
//!
//! Domain types that are persisted on the device or exchanged with the
//! order backend: menu items, table identity, cart lines, order snapshots,
//! status events, money helpers and the unified error code system.

pub mod error;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ErrorCategory, ErrorCode};
pub use models::{MenuItem, TableNumber};
pub use order::{CartLine, OrderHeader, OrderLineRecord, OrderSnapshot, OrderStatus, StatusEvent};
