//! Dineo Client - table-side ordering session engine
//!
//! Keeps table identity and cart durable across restarts, submits orders to
//! the order backend, and tracks the active order's status through a
//! push + poll status synchronizer.
//!
//! ```no_run
//! use std::sync::Arc;
//! use dineo_client::{ClientConfig, DineoSession, MemoryBackend, MemoryStore};
//!
//! # async fn demo() -> Result<(), dineo_client::SessionError> {
//! let config = ClientConfig::default();
//! let backend = Arc::new(MemoryBackend::new());
//! let store = Arc::new(MemoryStore::new());
//!
//! let mut session = DineoSession::restore(store, backend, config)?;
//! session.enter_table("12")?;
//! let menu = session.fetch_menu().await?;
//! if let Some(item) = menu.first() {
//!     session.add_item(item)?;
//! }
//! let order = session.submit_order().await?;
//! println!("placed {}", order.order_id);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod lifecycle;
pub mod logger;
pub mod store;
pub mod submission;
pub mod sync;
pub mod task;

pub use backend::{
    MemoryBackend, OrderBackend, RestBackend, SimulatedKitchen, StatusSubscription,
};
pub use cart::{Cart, CartTotals};
pub use catalog::demo_catalog;
pub use config::ClientConfig;
pub use connectivity::{Connectivity, ConnectivityMonitor};
pub use error::{
    BackendError, BackendResult, SessionError, SessionResult, StoreError, StoreResult,
    SubmitError,
};
pub use lifecycle::{DineoSession, SessionPhase};
pub use store::{KeyValueStore, MemoryStore, RedbStore, SessionStore};
pub use submission::OrderSubmitter;
pub use sync::{StatusRegister, StatusTracker, TrackerOptions};
pub use task::TaskHandle;

// Re-export shared types for convenience
pub use shared::models::{MenuItem, TableNumber};
pub use shared::order::{CartLine, OrderSnapshot, OrderStatus, StatusEvent, StatusVariant};
