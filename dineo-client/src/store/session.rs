//! Typed session records
//!
//! Three logical records live in the key-value store as JSON:
//!
//! | Key | Value |
//! |-----|-------|
//! | `dineo_table_number` | table number (integer) |
//! | `dineo_cart` | sequence of cart lines |
//! | `dineo_active_order` | order snapshot |
//!
//! A value that cannot be decoded is logged, removed and reported as absent.

use super::KeyValueStore;
use crate::cart::Cart;
use crate::error::StoreResult;
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::models::TableNumber;
use shared::order::{CartLine, OrderSnapshot, OrderStatus};
use std::sync::{Arc, Mutex, MutexGuard};

pub const TABLE_KEY: &str = "dineo_table_number";
pub const CART_KEY: &str = "dineo_cart";
pub const ACTIVE_ORDER_KEY: &str = "dineo_active_order";

/// Typed accessors over a [`KeyValueStore`]
///
/// Clones share one lock around active-order writes, so a status advance
/// never lands on a snapshot that was replaced in between.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<dyn KeyValueStore>,
    active_lock: Arc<Mutex<()>>,
}

impl SessionStore {
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        Self {
            inner,
            active_lock: Arc::new(Mutex::new(())),
        }
    }

    // ========== Table ==========

    pub fn table(&self) -> StoreResult<Option<TableNumber>> {
        self.load(TABLE_KEY)
    }

    pub fn set_table(&self, table: TableNumber) -> StoreResult<()> {
        self.save(TABLE_KEY, &table)
    }

    pub fn clear_table(&self) -> StoreResult<()> {
        self.inner.remove(TABLE_KEY)
    }

    // ========== Cart ==========

    /// Stored cart, or an empty cart when absent or corrupted
    pub fn cart(&self) -> StoreResult<Cart> {
        let lines: Option<Vec<CartLine>> = self.load(CART_KEY)?;
        Ok(lines.map(Cart::from_lines).unwrap_or_default())
    }

    pub fn save_cart(&self, cart: &Cart) -> StoreResult<()> {
        self.save(CART_KEY, cart)
    }

    pub fn clear_cart(&self) -> StoreResult<()> {
        self.inner.remove(CART_KEY)
    }

    // ========== Active order ==========

    pub fn active_order(&self) -> StoreResult<Option<OrderSnapshot>> {
        self.load(ACTIVE_ORDER_KEY)
    }

    pub fn save_active_order(&self, snapshot: &OrderSnapshot) -> StoreResult<()> {
        let _guard = self.lock_active();
        self.save(ACTIVE_ORDER_KEY, snapshot)
    }

    pub fn clear_active_order(&self) -> StoreResult<()> {
        let _guard = self.lock_active();
        self.inner.remove(ACTIVE_ORDER_KEY)
    }

    /// Persist a status advance for the stored active order
    ///
    /// Writes only when the stored snapshot is for `order_id` and `status`
    /// is later than the stored one. Returns whether a write happened.
    pub fn advance_active_status(&self, order_id: &str, status: OrderStatus) -> StoreResult<bool> {
        let _guard = self.lock_active();
        let Some(mut snapshot) = self.load::<OrderSnapshot>(ACTIVE_ORDER_KEY)? else {
            return Ok(false);
        };
        if snapshot.order_id != order_id || status <= snapshot.status {
            return Ok(false);
        }
        snapshot.status = status;
        self.save(ACTIVE_ORDER_KEY, &snapshot)?;
        Ok(true)
    }

    /// Remove table, cart and active order
    pub fn clear_all(&self) -> StoreResult<()> {
        let _guard = self.lock_active();
        self.inner.remove(ACTIVE_ORDER_KEY)?;
        self.inner.remove(CART_KEY)?;
        self.inner.remove(TABLE_KEY)?;
        Ok(())
    }

    fn lock_active(&self) -> MutexGuard<'_, ()> {
        self.active_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let Some(bytes) = self.inner.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding corrupted session value");
                self.inner.remove(key)?;
                Ok(None)
            }
        }
    }

    fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StoreResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.inner.set(key, &bytes)
    }
}
