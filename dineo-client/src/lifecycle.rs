//! Session lifecycle
//!
//! [`DineoSession`] is the single entry point a table-side UI drives. It
//! owns the in-memory cart, the durable session store and the tracker of
//! the active order, and derives the current [`SessionPhase`] from them.
//!
//! Phase transitions:
//!
//! ```text
//! NoTable --enter_table--> Browsing --submit_order--> ActiveOrder
//!    ^                        ^                           |
//!    |                        +-------order_again---------+ (terminal only)
//!    +--------------------------------go_home-------------+ (terminal only)
//! ```
//!
//! `reset_session` returns to `NoTable` from anywhere.

use crate::backend::OrderBackend;
use crate::cart::{Cart, CartTotals};
use crate::config::ClientConfig;
use crate::connectivity::{Connectivity, ConnectivityMonitor};
use crate::error::{SessionError, SessionResult};
use crate::store::{KeyValueStore, MemoryStore, RedbStore, SessionStore};
use crate::submission::OrderSubmitter;
use crate::sync::{StatusTracker, TrackerOptions};
use crate::task::TaskHandle;
use shared::models::{MenuItem, TableNumber};
use shared::order::{OrderSnapshot, OrderStatus};
use std::sync::Arc;
use tokio::sync::watch;

/// Phase derived from what the session currently holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// Table entry required before browsing
    NoTable,
    /// Table set, no active order
    Browsing { table: TableNumber },
    /// An order was placed and is being tracked
    ActiveOrder {
        table: TableNumber,
        order_id: String,
        status: OrderStatus,
    },
}

impl SessionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NoTable => "no_table",
            Self::Browsing { .. } => "browsing",
            Self::ActiveOrder { .. } => "active_order",
        }
    }
}

pub struct DineoSession {
    session: SessionStore,
    backend: Arc<dyn OrderBackend>,
    config: ClientConfig,
    connectivity: Connectivity,
    submitter: OrderSubmitter,
    table: Option<TableNumber>,
    cart: Cart,
    active: Option<OrderSnapshot>,
    tracker: Option<StatusTracker>,
}

impl DineoSession {
    /// Rebuild the session from whatever the store holds
    ///
    /// An active order wins over a plain table, so a restart during an
    /// order always lands back on its status view.
    pub fn restore(
        store: Arc<dyn KeyValueStore>,
        backend: Arc<dyn OrderBackend>,
        config: ClientConfig,
    ) -> SessionResult<Self> {
        let session = SessionStore::new(store);
        let connectivity = Connectivity::default();

        let table = session.table()?;
        let cart = session.cart()?;
        let active = session.active_order()?;

        let submitter = OrderSubmitter::new(backend.clone(), session.clone(), connectivity.clone());

        let restored = Self {
            session,
            backend,
            config,
            connectivity,
            submitter,
            table,
            cart,
            active,
            tracker: None,
        };
        tracing::info!(
            phase = restored.phase().name(),
            cart_lines = restored.cart.len(),
            "Session restored"
        );
        Ok(restored)
    }

    /// Open the store named by `config.store_path` (in memory when unset)
    /// and restore from it
    pub fn open(config: ClientConfig, backend: Arc<dyn OrderBackend>) -> SessionResult<Self> {
        let store: Arc<dyn KeyValueStore> = match &config.store_path {
            Some(path) => Arc::new(RedbStore::open(path)?),
            None => Arc::new(MemoryStore::new()),
        };
        Self::restore(store, backend, config)
    }

    pub fn phase(&self) -> SessionPhase {
        if let Some(order) = &self.active {
            return SessionPhase::ActiveOrder {
                table: self.table.unwrap_or(order.table_number),
                order_id: order.order_id.clone(),
                status: self.displayed_status(order),
            };
        }
        match self.table {
            Some(table) => SessionPhase::Browsing { table },
            None => SessionPhase::NoTable,
        }
    }

    /// Table in use; falls back to the active order's table
    pub fn table(&self) -> Option<TableNumber> {
        self.table
            .or_else(|| self.active.as_ref().map(|order| order.table_number))
    }

    /// Validate and persist the table number typed by the patron
    pub fn enter_table(&mut self, input: &str) -> SessionResult<TableNumber> {
        let table = TableNumber::parse(input)?;
        self.session.set_table(table)?;
        self.table = Some(table);
        tracing::info!(table = %table, "Table selected");
        Ok(table)
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn totals(&self) -> CartTotals {
        self.cart.totals()
    }

    pub fn add_item(&mut self, item: &MenuItem) -> SessionResult<()> {
        self.require_table()?;
        self.cart.add_item(item);
        self.persist_cart()
    }

    /// Set a line's quantity; zero or less removes it
    pub fn set_quantity(&mut self, item_id: &str, quantity: i64) -> SessionResult<()> {
        self.require_table()?;
        self.cart.set_quantity(item_id, quantity);
        self.persist_cart()
    }

    pub fn remove_item(&mut self, item_id: &str) -> SessionResult<()> {
        self.require_table()?;
        self.cart.remove_item(item_id);
        self.persist_cart()
    }

    pub async fn fetch_menu(&self) -> SessionResult<Vec<MenuItem>> {
        self.backend
            .fetch_menu()
            .await
            .map_err(SessionError::MenuUnavailable)
    }

    /// Place the current cart as a new order and start tracking it
    ///
    /// A previous active order is replaced. Its tracker is stopped before
    /// the new snapshot is written and restarted if the submission fails.
    pub async fn submit_order(&mut self) -> SessionResult<OrderSnapshot> {
        let previous = self.active_order();
        let was_tracking = self.tracker.is_some();
        self.active = previous.clone();
        self.stop_tracking().await;

        let table = self.table();
        match self.submitter.submit(table, &mut self.cart).await {
            Ok(snapshot) => {
                self.active = Some(snapshot.clone());
                self.start_tracker(&snapshot);
                Ok(snapshot)
            }
            Err(e) => {
                if let Some(order) = previous.filter(|_| was_tracking) {
                    self.start_tracker(&order);
                }
                Err(e.into())
            }
        }
    }

    /// Whether a submission is awaiting the backend
    pub fn is_submitting(&self) -> bool {
        self.submitter.is_submitting()
    }

    /// Start (or keep) tracking the active order and return its status feed
    pub fn track_active_order(&mut self) -> SessionResult<watch::Receiver<OrderStatus>> {
        let order = self.active.clone().ok_or(SessionError::NoActiveOrder)?;
        if let Some(tracker) = self.tracker.as_ref().filter(|t| t.order_id() == order.order_id) {
            return Ok(tracker.subscribe());
        }
        Ok(self.start_tracker(&order))
    }

    /// Active order with its latest known status
    pub fn active_order(&self) -> Option<OrderSnapshot> {
        self.active.as_ref().map(|order| OrderSnapshot {
            status: self.displayed_status(order),
            ..order.clone()
        })
    }

    pub fn active_status(&self) -> Option<OrderStatus> {
        self.active.as_ref().map(|order| self.displayed_status(order))
    }

    /// Clear the finished order and the cart, keeping the table
    pub async fn order_again(&mut self) -> SessionResult<()> {
        let order = self.finished_order()?;
        self.stop_tracking().await;

        if self.table.is_none() {
            self.session.set_table(order.table_number)?;
            self.table = Some(order.table_number);
        }
        self.session.clear_active_order()?;
        self.session.clear_cart()?;
        self.active = None;
        self.cart.clear();

        tracing::info!(order_id = %order.order_id, table = %order.table_number, "Ordering again");
        Ok(())
    }

    /// Clear table, cart and the finished order
    pub async fn go_home(&mut self) -> SessionResult<()> {
        let order = self.finished_order()?;
        self.clear_everything().await?;
        tracing::info!(order_id = %order.order_id, "Session closed");
        Ok(())
    }

    /// Clear everything regardless of phase
    pub async fn reset_session(&mut self) -> SessionResult<()> {
        self.clear_everything().await?;
        tracing::info!("Session reset");
        Ok(())
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    /// Ping the backend on `config.ping_interval` and keep
    /// [`DineoSession::connectivity`] current
    pub fn spawn_connectivity_monitor(&self) -> TaskHandle {
        ConnectivityMonitor::new(
            self.backend.clone(),
            self.connectivity.clone(),
            self.config.ping_interval,
        )
        .spawn()
    }

    /// Stop background tracking and release the store
    ///
    /// The persisted session is kept, so a later `restore` picks up where
    /// this one left off.
    pub async fn shutdown(mut self) {
        self.stop_tracking().await;
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn require_table(&self) -> SessionResult<TableNumber> {
        self.table().ok_or(SessionError::NoTable)
    }

    fn persist_cart(&self) -> SessionResult<()> {
        self.session.save_cart(&self.cart)?;
        Ok(())
    }

    fn displayed_status(&self, order: &OrderSnapshot) -> OrderStatus {
        match &self.tracker {
            Some(tracker) if tracker.order_id() == order.order_id => {
                tracker.status().max(order.status)
            }
            _ => order.status,
        }
    }

    fn finished_order(&self) -> SessionResult<OrderSnapshot> {
        let order = self.active_order().ok_or(SessionError::NoActiveOrder)?;
        if !order.status.is_terminal(self.config.status_variant) {
            return Err(SessionError::NotTerminal(order.status));
        }
        Ok(order)
    }

    fn start_tracker(&mut self, order: &OrderSnapshot) -> watch::Receiver<OrderStatus> {
        let tracker = StatusTracker::spawn(
            self.backend.clone(),
            Some(self.session.clone()),
            order.order_id.clone(),
            order.status,
            TrackerOptions::from(&self.config),
        );
        let rx = tracker.subscribe();
        self.tracker = Some(tracker);
        rx
    }

    async fn stop_tracking(&mut self) {
        if let Some(tracker) = self.tracker.take() {
            tracing::debug!(order_id = %tracker.order_id(), "Stopping status tracker");
            tracker.stop().await;
        }
    }

    async fn clear_everything(&mut self) -> SessionResult<()> {
        self.stop_tracking().await;
        self.session.clear_all()?;
        self.table = None;
        self.cart.clear();
        self.active = None;
        Ok(())
    }
}
