//! Order submission transaction
//!
//! Turns a cart and table into a remote order (header, then lines) and a
//! local active-order snapshot. There is no distributed transaction, so
//! each failure point has a fixed outcome:
//!
//! | Failure | Remote state | Cart | Snapshot | Error |
//! |---------|--------------|------|----------|-------|
//! | guard (in flight, offline, no table, empty) | untouched | kept | none | guard variant |
//! | header write | nothing | kept | none | `HeaderFailed` |
//! | line write | header cancelled if possible | kept | none | `IncompleteOrder` |
//!
//! The header is never retried automatically.

use crate::backend::OrderBackend;
use crate::cart::Cart;
use crate::connectivity::Connectivity;
use crate::error::SubmitError;
use crate::store::SessionStore;
use shared::models::TableNumber;
use shared::order::{OrderHeader, OrderLineRecord, OrderSnapshot, OrderStatus, money};
use shared::util::now_millis;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Clears the in-flight flag on every exit path
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct OrderSubmitter {
    backend: Arc<dyn OrderBackend>,
    session: SessionStore,
    connectivity: Connectivity,
    in_flight: AtomicBool,
}

impl OrderSubmitter {
    pub fn new(
        backend: Arc<dyn OrderBackend>,
        session: SessionStore,
        connectivity: Connectivity,
    ) -> Self {
        Self {
            backend,
            session,
            connectivity,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Whether a submission is currently awaiting the backend
    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Submit `cart` for `table`
    ///
    /// On success the snapshot is persisted as the active order, the stored
    /// cart is removed and `cart` is emptied. On any error `cart` is left
    /// exactly as it was.
    pub async fn submit(
        &self,
        table: Option<TableNumber>,
        cart: &mut Cart,
    ) -> Result<OrderSnapshot, SubmitError> {
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(SubmitError::InFlight)?;

        if !self.connectivity.is_online() {
            return Err(SubmitError::Offline);
        }
        let table = table.ok_or(SubmitError::NoTable)?;
        if cart.is_empty() {
            return Err(SubmitError::EmptyCart);
        }

        let subtotal = cart.totals().subtotal;
        let total = money::total_with_tax(subtotal);
        let header = OrderHeader::received(table, total);

        let order_id = match self.backend.create_order(&header).await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(table = %table, error = %e, "Order header write failed");
                return Err(SubmitError::HeaderFailed(e));
            }
        };

        let lines = OrderLineRecord::from_cart(&order_id, cart.lines());
        if let Err(source) = self.backend.create_order_lines(&lines).await {
            tracing::error!(order_id = %order_id, error = %source, "Order lines write failed after header was created");
            let compensated = match self.backend.cancel_order(&order_id).await {
                Ok(()) => {
                    tracing::info!(order_id = %order_id, "Incomplete order cancelled");
                    true
                }
                Err(e) => {
                    tracing::error!(order_id = %order_id, error = %e, "Failed to cancel incomplete order");
                    false
                }
            };
            return Err(SubmitError::IncompleteOrder {
                order_id,
                compensated,
                source,
            });
        }

        let snapshot = OrderSnapshot {
            order_id,
            table_number: table,
            items: cart.lines().to_vec(),
            subtotal,
            total,
            status: OrderStatus::Received,
            submitted_at: now_millis(),
        };

        // The order exists remotely from here on; local write failures are
        // logged but do not fail the submission.
        if let Err(e) = self.session.save_active_order(&snapshot) {
            tracing::error!(order_id = %snapshot.order_id, error = %e, "Failed to persist active order");
        }
        if let Err(e) = self.session.clear_cart() {
            tracing::error!(order_id = %snapshot.order_id, error = %e, "Failed to clear stored cart");
        }
        cart.clear();

        tracing::info!(
            order_id = %snapshot.order_id,
            table = %table,
            items = snapshot.item_count(),
            total = %total,
            "Order placed"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::store::MemoryStore;
    use rust_decimal::Decimal;
    use shared::models::MenuItem;

    fn submitter(backend: Arc<MemoryBackend>) -> (OrderSubmitter, SessionStore, Connectivity) {
        let session = SessionStore::new(Arc::new(MemoryStore::new()));
        let connectivity = Connectivity::default();
        let submitter = OrderSubmitter::new(backend, session.clone(), connectivity.clone());
        (submitter, session, connectivity)
    }

    fn reference_cart() -> Cart {
        let mut cart = Cart::new();
        let bread = MenuItem::new("1", "Garlic Bread", Decimal::from(425), "Starters");
        cart.add_item(&bread);
        cart.add_item(&bread);
        cart.add_item(&MenuItem::new("8", "Iced Coffee", Decimal::from(340), "Beverages"));
        cart
    }

    fn table() -> Option<TableNumber> {
        TableNumber::new(12).ok()
    }

    #[tokio::test]
    async fn test_guards_make_no_remote_calls() {
        let backend = Arc::new(MemoryBackend::new());
        let (submitter, _session, connectivity) = submitter(backend.clone());

        let mut empty = Cart::new();
        assert!(matches!(
            submitter.submit(table(), &mut empty).await,
            Err(SubmitError::EmptyCart)
        ));

        let mut cart = reference_cart();
        assert!(matches!(
            submitter.submit(None, &mut cart).await,
            Err(SubmitError::NoTable)
        ));

        connectivity.set_online(false);
        assert!(matches!(
            submitter.submit(table(), &mut cart).await,
            Err(SubmitError::Offline)
        ));

        assert_eq!(backend.create_order_calls(), 0);
        assert_eq!(cart, reference_cart());
        assert!(!submitter.is_submitting());
    }

    #[tokio::test]
    async fn test_success_writes_header_lines_and_snapshot() {
        let backend = Arc::new(MemoryBackend::new());
        let (submitter, session, _) = submitter(backend.clone());
        let mut cart = reference_cart();
        session.save_cart(&cart).unwrap();

        let snapshot = submitter.submit(table(), &mut cart).await.unwrap();

        assert_eq!(snapshot.subtotal, Decimal::from(1190));
        assert_eq!(snapshot.total, Decimal::new(130900, 2));
        assert_eq!(snapshot.status, OrderStatus::Received);
        assert_eq!(snapshot.item_count(), 3);

        let header = backend.header_of(&snapshot.order_id).unwrap();
        assert_eq!(header.total_amount, Decimal::new(130900, 2));
        assert_eq!(header.status, OrderStatus::Received);
        assert_eq!(backend.lines_of(&snapshot.order_id).len(), 2);

        assert!(cart.is_empty());
        assert!(session.cart().unwrap().is_empty());
        assert_eq!(session.active_order().unwrap(), Some(snapshot));
    }

    #[tokio::test]
    async fn test_header_failure_keeps_cart() {
        let backend = Arc::new(MemoryBackend::new());
        backend.fail_create_order(true);
        let (submitter, session, _) = submitter(backend.clone());
        let mut cart = reference_cart();

        let err = submitter.submit(table(), &mut cart).await.unwrap_err();
        assert!(matches!(err, SubmitError::HeaderFailed(_)));
        assert_eq!(backend.create_lines_calls(), 0);
        assert_eq!(cart, reference_cart());
        assert!(session.active_order().unwrap().is_none());
        assert!(!submitter.is_submitting());
    }
}
