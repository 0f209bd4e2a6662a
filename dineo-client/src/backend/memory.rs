//! In-process order backend
//!
//! Holds orders in memory and fans status changes out over a broadcast
//! channel. Staff-side actions (`set_status`, `push_event`) and fault
//! switches make it the backend of choice for tests and demos.

use super::{OrderBackend, StatusSubscription};
use crate::error::{BackendError, BackendResult};
use async_trait::async_trait;
use shared::models::MenuItem;
use shared::order::{OrderHeader, OrderLineRecord, OrderStatus, StatusEvent};
use shared::util::now_millis;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Semaphore, broadcast};
use tokio_util::sync::CancellationToken;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
struct StoredOrder {
    header: OrderHeader,
    lines: Vec<OrderLineRecord>,
    status: OrderStatus,
}

#[derive(Debug, Default)]
struct State {
    menu: Vec<MenuItem>,
    orders: HashMap<String, StoredOrder>,
    last_id_millis: i64,
}

#[derive(Debug, Default)]
struct Faults {
    create_order: AtomicBool,
    create_lines: AtomicBool,
    fetch_status: AtomicBool,
    subscribe: AtomicBool,
    stall_subscribe: AtomicBool,
    cancel: AtomicBool,
    unreachable: AtomicBool,
}

#[derive(Debug, Default)]
struct Calls {
    create_order: AtomicUsize,
    create_lines: AtomicUsize,
    fetch_status: AtomicUsize,
    subscribe: AtomicUsize,
    cancel: AtomicUsize,
}

/// In-memory [`OrderBackend`]
#[derive(Debug)]
pub struct MemoryBackend {
    state: Mutex<State>,
    events: broadcast::Sender<StatusEvent>,
    created: broadcast::Sender<String>,
    /// Cancelling this closes every open push subscription
    subscriptions: Mutex<CancellationToken>,
    live_subscriptions: Arc<AtomicUsize>,
    /// When set, `create_order` waits for a permit
    create_gate: Mutex<Option<Arc<Semaphore>>>,
    faults: Faults,
    calls: Calls,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (created, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Mutex::new(State::default()),
            events,
            created,
            subscriptions: Mutex::new(CancellationToken::new()),
            live_subscriptions: Arc::new(AtomicUsize::new(0)),
            create_gate: Mutex::new(None),
            faults: Faults::default(),
            calls: Calls::default(),
        }
    }

    pub fn with_menu(self, menu: Vec<MenuItem>) -> Self {
        self.state().menu = menu;
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock only happens in a failing test
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ========== Staff side ==========

    /// Change an order's status and notify subscribers
    ///
    /// Like a kitchen terminal, this writes whatever it is told, including
    /// regressions. Returns `false` for unknown orders.
    pub fn set_status(&self, order_id: &str, status: OrderStatus) -> bool {
        {
            let mut state = self.state();
            let Some(order) = state.orders.get_mut(order_id) else {
                return false;
            };
            order.status = status;
        }
        self.push_event(StatusEvent::new(order_id, status));
        true
    }

    /// Deliver a push event without touching stored status
    pub fn push_event(&self, event: StatusEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    /// Close every open push subscription
    pub fn drop_subscriptions(&self) {
        let mut token = self
            .subscriptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        token.cancel();
        *token = CancellationToken::new();
    }

    /// Ids of newly created orders
    pub fn subscribe_created(&self) -> broadcast::Receiver<String> {
        self.created.subscribe()
    }

    // ========== Inspection ==========

    pub fn status_of(&self, order_id: &str) -> Option<OrderStatus> {
        self.state().orders.get(order_id).map(|o| o.status)
    }

    pub fn header_of(&self, order_id: &str) -> Option<OrderHeader> {
        self.state().orders.get(order_id).map(|o| o.header.clone())
    }

    pub fn lines_of(&self, order_id: &str) -> Vec<OrderLineRecord> {
        self.state()
            .orders
            .get(order_id)
            .map(|o| o.lines.clone())
            .unwrap_or_default()
    }

    pub fn order_count(&self) -> usize {
        self.state().orders.len()
    }

    pub fn live_subscriptions(&self) -> usize {
        self.live_subscriptions.load(Ordering::SeqCst)
    }

    pub fn create_order_calls(&self) -> usize {
        self.calls.create_order.load(Ordering::SeqCst)
    }

    pub fn create_lines_calls(&self) -> usize {
        self.calls.create_lines.load(Ordering::SeqCst)
    }

    pub fn fetch_status_calls(&self) -> usize {
        self.calls.fetch_status.load(Ordering::SeqCst)
    }

    pub fn subscribe_calls(&self) -> usize {
        self.calls.subscribe.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> usize {
        self.calls.cancel.load(Ordering::SeqCst)
    }

    // ========== Fault injection ==========

    pub fn fail_create_order(&self, fail: bool) {
        self.faults.create_order.store(fail, Ordering::SeqCst);
    }

    pub fn fail_create_lines(&self, fail: bool) {
        self.faults.create_lines.store(fail, Ordering::SeqCst);
    }

    pub fn fail_fetch_status(&self, fail: bool) {
        self.faults.fetch_status.store(fail, Ordering::SeqCst);
    }

    pub fn fail_subscribe(&self, fail: bool) {
        self.faults.subscribe.store(fail, Ordering::SeqCst);
    }

    /// Make `subscribe_status` hang without ever answering
    pub fn stall_subscribe(&self, stall: bool) {
        self.faults.stall_subscribe.store(stall, Ordering::SeqCst);
    }

    pub fn fail_cancel(&self, fail: bool) {
        self.faults.cancel.store(fail, Ordering::SeqCst);
    }

    /// Make every call, including `ping`, fail as if the network were down
    pub fn set_unreachable(&self, unreachable: bool) {
        self.faults.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Hold `create_order` until the returned semaphore gets a permit
    pub fn gate_create_order(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self
            .create_gate
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(gate.clone());
        gate
    }

    fn check(&self, fault: &AtomicBool, what: &str) -> BackendResult<()> {
        if self.faults.unreachable.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("backend unreachable".to_string()));
        }
        if fault.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable(format!("{what} rejected")));
        }
        Ok(())
    }

    /// `ORD-<millis>`, bumped by one when two orders share a millisecond
    fn next_order_id(state: &mut State) -> String {
        let millis = now_millis().max(state.last_id_millis + 1);
        state.last_id_millis = millis;
        format!("ORD-{millis}")
    }
}

#[async_trait]
impl OrderBackend for MemoryBackend {
    async fn fetch_menu(&self) -> BackendResult<Vec<MenuItem>> {
        self.check(&self.faults.unreachable, "menu")?;
        Ok(self.state().menu.clone())
    }

    async fn create_order(&self, header: &OrderHeader) -> BackendResult<String> {
        self.calls.create_order.fetch_add(1, Ordering::SeqCst);

        let gate = self
            .create_gate
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        if let Some(gate) = gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|_| BackendError::Unavailable("gate closed".to_string()))?;
            permit.forget();
        }

        self.check(&self.faults.create_order, "order header")?;

        let order_id = {
            let mut state = self.state();
            let order_id = Self::next_order_id(&mut state);
            state.orders.insert(
                order_id.clone(),
                StoredOrder {
                    header: header.clone(),
                    lines: Vec::new(),
                    status: header.status,
                },
            );
            order_id
        };

        tracing::debug!(order_id = %order_id, table = %header.table_number, "Order header stored");
        let _ = self.created.send(order_id.clone());
        Ok(order_id)
    }

    async fn create_order_lines(&self, lines: &[OrderLineRecord]) -> BackendResult<()> {
        self.calls.create_lines.fetch_add(1, Ordering::SeqCst);
        self.check(&self.faults.create_lines, "order lines")?;

        let mut state = self.state();
        // Validate every reference before writing any line
        for line in lines {
            if !state.orders.contains_key(&line.order_id) {
                return Err(BackendError::NotFound(line.order_id.clone()));
            }
        }
        for line in lines {
            if let Some(order) = state.orders.get_mut(&line.order_id) {
                order.lines.push(line.clone());
            }
        }
        Ok(())
    }

    async fn fetch_status(&self, order_id: &str) -> BackendResult<OrderStatus> {
        self.calls.fetch_status.fetch_add(1, Ordering::SeqCst);
        self.check(&self.faults.fetch_status, "status read")?;

        self.status_of(order_id)
            .ok_or_else(|| BackendError::NotFound(order_id.to_string()))
    }

    async fn subscribe_status(&self, order_id: &str) -> BackendResult<StatusSubscription> {
        self.calls.subscribe.fetch_add(1, Ordering::SeqCst);
        if self.faults.stall_subscribe.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.check(&self.faults.subscribe, "subscription")?;

        let cancel = CancellationToken::new();
        let backend_closed = self
            .subscriptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        let (tx, subscription) = StatusSubscription::channel(cancel.clone());
        let mut rx = self.events.subscribe();
        let order_id = order_id.to_string();
        let live = self.live_subscriptions.clone();

        live.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = backend_closed.cancelled() => {
                        tracing::debug!(order_id = %order_id, "Subscription closed by backend");
                        break;
                    }
                    result = rx.recv() => match result {
                        Ok(event) if event.order_id == order_id => {
                            if tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!(order_id = %order_id, "Status subscription lagged {} events", n);
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
            live.fetch_sub(1, Ordering::SeqCst);
        });

        Ok(subscription)
    }

    async fn cancel_order(&self, order_id: &str) -> BackendResult<()> {
        self.calls.cancel.fetch_add(1, Ordering::SeqCst);
        self.check(&self.faults.cancel, "cancel")?;

        self.state().orders.remove(order_id);
        tracing::debug!(order_id = %order_id, "Order removed");
        Ok(())
    }

    async fn ping(&self) -> BackendResult<()> {
        self.check(&self.faults.unreachable, "ping")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::models::TableNumber;

    fn header() -> OrderHeader {
        OrderHeader::received(TableNumber::new(12).unwrap(), Decimal::new(130900, 2))
    }

    #[tokio::test]
    async fn test_create_order_and_lines() {
        let backend = MemoryBackend::new();
        let id = backend.create_order(&header()).await.unwrap();
        assert!(id.starts_with("ORD-"));

        let lines = vec![OrderLineRecord {
            order_id: id.clone(),
            menu_item_id: "1".to_string(),
            quantity: 2,
            price: Decimal::from(425),
        }];
        backend.create_order_lines(&lines).await.unwrap();

        assert_eq!(backend.lines_of(&id), lines);
        assert_eq!(backend.fetch_status(&id).await.unwrap(), OrderStatus::Received);
    }

    #[tokio::test]
    async fn test_order_ids_are_unique_within_a_millisecond() {
        let backend = MemoryBackend::new();
        let a = backend.create_order(&header()).await.unwrap();
        let b = backend.create_order(&header()).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(backend.order_count(), 2);
    }

    #[tokio::test]
    async fn test_lines_for_unknown_order_are_rejected() {
        let backend = MemoryBackend::new();
        let lines = vec![OrderLineRecord {
            order_id: "ORD-missing".to_string(),
            menu_item_id: "1".to_string(),
            quantity: 1,
            price: Decimal::from(425),
        }];
        assert!(matches!(
            backend.create_order_lines(&lines).await,
            Err(BackendError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_subscription_filters_by_order() {
        let backend = MemoryBackend::new();
        let a = backend.create_order(&header()).await.unwrap();
        let b = backend.create_order(&header()).await.unwrap();

        let mut sub = backend.subscribe_status(&a).await.unwrap();
        backend.set_status(&b, OrderStatus::Ready);
        backend.set_status(&a, OrderStatus::Preparing);

        let event = sub.recv().await.unwrap();
        assert_eq!(event, StatusEvent::new(a, OrderStatus::Preparing));
    }

    #[tokio::test]
    async fn test_drop_subscriptions_closes_channel() {
        let backend = MemoryBackend::new();
        let id = backend.create_order(&header()).await.unwrap();
        let mut sub = backend.subscribe_status(&id).await.unwrap();

        backend.drop_subscriptions();
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_faults() {
        let backend = MemoryBackend::new();
        backend.fail_create_order(true);
        assert!(backend.create_order(&header()).await.is_err());
        assert_eq!(backend.order_count(), 0);
        assert_eq!(backend.create_order_calls(), 1);

        backend.fail_create_order(false);
        backend.set_unreachable(true);
        assert!(backend.ping().await.is_err());
        assert!(backend.fetch_menu().await.is_err());

        backend.set_unreachable(false);
        assert!(backend.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_cancel_removes_order() {
        let backend = MemoryBackend::new();
        let id = backend.create_order(&header()).await.unwrap();
        backend.cancel_order(&id).await.unwrap();
        assert!(backend.status_of(&id).is_none());
        assert!(matches!(
            backend.fetch_status(&id).await,
            Err(BackendError::NotFound(_))
        ));
    }
}
