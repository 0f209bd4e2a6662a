//! Durable key-value storage
//!
//! [`KeyValueStore`] is the device-scoped persistence seam. Every call is
//! atomic for its key; there are no multi-key transactions.
//!
//! - [`RedbStore`]: on-disk, survives restarts and crashes
//! - [`MemoryStore`]: process-local, for tests and kiosk sessions
//! - [`SessionStore`]: typed accessors for table, cart and active order

mod memory;
mod redb_store;
mod session;

pub use redb_store::RedbStore;
pub use memory::MemoryStore;
pub use session::{ACTIVE_ORDER_KEY, CART_KEY, SessionStore, TABLE_KEY};

use crate::error::StoreResult;

/// Device-scoped byte store
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Removing an absent key is not an error
    fn remove(&self, key: &str) -> StoreResult<()>;
}
