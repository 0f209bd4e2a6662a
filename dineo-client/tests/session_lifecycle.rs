//! Session phases across restarts

use dineo_client::store::{ACTIVE_ORDER_KEY, CART_KEY, TABLE_KEY};
use dineo_client::{
    CartLine, ClientConfig, DineoSession, KeyValueStore, MemoryBackend, MemoryStore, OrderSnapshot,
    OrderStatus, RedbStore, SessionError, SessionPhase, SessionStore, SubmitError, TableNumber,
    demo_catalog,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tempfile::TempDir;

fn backend() -> Arc<MemoryBackend> {
    Arc::new(MemoryBackend::new().with_menu(demo_catalog()))
}

fn table(n: i64) -> TableNumber {
    TableNumber::new(n).unwrap()
}

#[tokio::test]
async fn test_cart_survives_restart() {
    let dir = TempDir::new().unwrap();
    let config = ClientConfig::default().with_store_path(dir.path().join("session.redb"));
    let menu = demo_catalog();

    {
        let mut session = DineoSession::open(config.clone(), backend()).unwrap();
        session.enter_table(" 7 ").unwrap();
        session.add_item(&menu[3]).unwrap();
        session.add_item(&menu[8]).unwrap();
        session.set_quantity("9", 3).unwrap();
        session.shutdown().await;
    }

    let session = DineoSession::open(config, backend()).unwrap();
    assert_eq!(session.phase(), SessionPhase::Browsing { table: table(7) });
    assert_eq!(session.cart().quantity_of("4"), 1);
    assert_eq!(session.cart().quantity_of("9"), 3);
    assert_eq!(session.totals().item_count, 4);
    assert_eq!(session.totals().subtotal, Decimal::from(2000));
}

#[tokio::test]
async fn test_active_order_wins_on_restore() {
    let store = Arc::new(MemoryStore::new());
    let stored = SessionStore::new(store.clone());
    let menu = demo_catalog();

    stored.set_table(table(2)).unwrap();
    let snapshot = OrderSnapshot {
        order_id: "ORD-1".to_string(),
        table_number: table(9),
        items: vec![CartLine::new(menu[4].clone(), 1)],
        subtotal: Decimal::from(935),
        total: Decimal::new(102850, 2),
        status: OrderStatus::Preparing,
        submitted_at: 1,
    };
    stored.save_active_order(&snapshot).unwrap();

    let session = DineoSession::restore(store, backend(), ClientConfig::default()).unwrap();
    assert_eq!(
        session.phase(),
        SessionPhase::ActiveOrder {
            table: table(2),
            order_id: "ORD-1".to_string(),
            status: OrderStatus::Preparing,
        }
    );
}

#[tokio::test]
async fn test_active_order_alone_restores_its_table() {
    let store = Arc::new(MemoryStore::new());
    let stored = SessionStore::new(store.clone());
    stored
        .save_active_order(&OrderSnapshot {
            order_id: "ORD-5".to_string(),
            table_number: table(40),
            items: Vec::new(),
            subtotal: Decimal::ZERO,
            total: Decimal::ZERO,
            status: OrderStatus::Received,
            submitted_at: 5,
        })
        .unwrap();

    let mut session = DineoSession::restore(store, backend(), ClientConfig::default()).unwrap();
    assert_eq!(session.table(), Some(table(40)));
    // Adding to a new order is allowed while the first is tracked
    session.add_item(&demo_catalog()[0]).unwrap();
    assert_eq!(session.cart().len(), 1);
}

#[test]
fn test_corrupted_cart_degrades_to_empty() {
    let store = Arc::new(MemoryStore::new());
    store.set(TABLE_KEY, b"3").unwrap();
    store.set(CART_KEY, b"{not a cart").unwrap();

    let session = DineoSession::restore(store.clone(), backend(), ClientConfig::default()).unwrap();
    assert_eq!(session.phase(), SessionPhase::Browsing { table: table(3) });
    assert!(session.cart().is_empty());
    assert!(store.get(CART_KEY).unwrap().is_none());
}

#[test]
fn test_invalid_table_numbers() {
    let store = Arc::new(MemoryStore::new());
    let mut session = DineoSession::restore(store.clone(), backend(), ClientConfig::default()).unwrap();

    for input in ["0", "101", "-3", "twelve", ""] {
        let err = session.enter_table(input).unwrap_err();
        assert!(matches!(err, SessionError::InvalidTable(_)), "{input}");
    }
    assert!(store.get(TABLE_KEY).unwrap().is_none());

    session.enter_table("12").unwrap();
    assert_eq!(SessionStore::new(store).table().unwrap(), Some(table(12)));
}

#[tokio::test]
async fn test_empty_cart_submission_is_rejected() {
    let backend = backend();
    let mut session =
        DineoSession::restore(Arc::new(MemoryStore::new()), backend.clone(), ClientConfig::default())
            .unwrap();
    session.enter_table("1").unwrap();

    let err = session.submit_order().await.unwrap_err();
    assert!(matches!(err, SessionError::Submit(SubmitError::EmptyCart)));
    assert_eq!(backend.create_order_calls(), 0);
}

#[tokio::test]
async fn test_go_home_clears_every_key() {
    let store = Arc::new(MemoryStore::new());
    let backend = backend();
    let mut session =
        DineoSession::restore(store.clone(), backend.clone(), ClientConfig::default()).unwrap();

    session.enter_table("12").unwrap();
    session.add_item(&demo_catalog()[5]).unwrap();
    let order = session.submit_order().await.unwrap();
    assert!(store.get(ACTIVE_ORDER_KEY).unwrap().is_some());

    assert!(matches!(
        session.go_home().await,
        Err(SessionError::NotTerminal(_))
    ));

    backend.set_status(&order.order_id, OrderStatus::Completed);
    let mut rx = session.track_active_order().unwrap();
    rx.wait_for(|status| *status == OrderStatus::Completed)
        .await
        .unwrap();

    session.go_home().await.unwrap();
    assert_eq!(session.phase(), SessionPhase::NoTable);
    assert!(store.keys().is_empty());
}

#[tokio::test]
async fn test_second_order_replaces_first() {
    let store = Arc::new(MemoryStore::new());
    let backend = backend();
    let mut session =
        DineoSession::restore(store.clone(), backend.clone(), ClientConfig::default()).unwrap();
    let menu = demo_catalog();

    session.enter_table("8").unwrap();
    session.add_item(&menu[0]).unwrap();
    let first = session.submit_order().await.unwrap();

    session.add_item(&menu[12]).unwrap();
    let second = session.submit_order().await.unwrap();
    assert_ne!(first.order_id, second.order_id);

    let stored = SessionStore::new(store).active_order().unwrap().unwrap();
    assert_eq!(stored.order_id, second.order_id);
    assert_eq!(stored.items.len(), 1);
    assert_eq!(stored.items[0].item.id, "13");
    assert_eq!(backend.order_count(), 2);

    session.reset_session().await.unwrap();
    assert_eq!(session.phase(), SessionPhase::NoTable);
}

#[tokio::test]
async fn test_tracking_resumes_after_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.redb");
    let backend = backend();

    let order_id = {
        let store = Arc::new(RedbStore::open(&path).unwrap());
        let mut session =
            DineoSession::restore(store, backend.clone(), ClientConfig::default()).unwrap();
        session.enter_table("15").unwrap();
        session.add_item(&demo_catalog()[1]).unwrap();
        let order = session.submit_order().await.unwrap();
        session.shutdown().await;
        order.order_id
    };

    backend.set_status(&order_id, OrderStatus::Ready);

    let store = Arc::new(RedbStore::open(&path).unwrap());
    let mut session = DineoSession::restore(store, backend.clone(), ClientConfig::default()).unwrap();
    assert!(matches!(session.phase(), SessionPhase::ActiveOrder { .. }));

    let mut rx = session.track_active_order().unwrap();
    rx.wait_for(|status| *status == OrderStatus::Ready)
        .await
        .unwrap();
    assert_eq!(session.active_status(), Some(OrderStatus::Ready));
    assert!(session.cart().is_empty());
    session.shutdown().await;
}

async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_previous_tracker_stops_before_resubmission() {
    let store = Arc::new(MemoryStore::new());
    let backend = backend();
    let mut session =
        DineoSession::restore(store.clone(), backend.clone(), ClientConfig::default()).unwrap();
    let menu = demo_catalog();

    session.enter_table("4").unwrap();
    session.add_item(&menu[2]).unwrap();
    let first = session.submit_order().await.unwrap();
    settle().await;
    assert_eq!(backend.live_subscriptions(), 1);

    session.add_item(&menu[6]).unwrap();
    let gate = backend.gate_create_order();
    let kitchen = backend.clone();
    let watch_backend = async {
        while kitchen.create_order_calls() < 2 {
            tokio::task::yield_now().await;
        }
        settle().await;
        // Nothing is left that could write the first order back
        assert_eq!(kitchen.live_subscriptions(), 0);
        kitchen.set_status(&first.order_id, OrderStatus::Ready);
        gate.add_permits(1);
    };
    let (second, ()) = tokio::join!(session.submit_order(), watch_backend);
    let second = second.unwrap();
    settle().await;

    let stored = SessionStore::new(store).active_order().unwrap().unwrap();
    assert_eq!(stored.order_id, second.order_id);
    assert_eq!(stored.status, OrderStatus::Received);
    assert_eq!(backend.live_subscriptions(), 1);
    session.shutdown().await;
}

#[tokio::test]
async fn test_failed_resubmission_resumes_tracking() {
    let store = Arc::new(MemoryStore::new());
    let backend = backend();
    let mut session =
        DineoSession::restore(store.clone(), backend.clone(), ClientConfig::default()).unwrap();
    let menu = demo_catalog();

    session.enter_table("6").unwrap();
    session.add_item(&menu[1]).unwrap();
    let first = session.submit_order().await.unwrap();
    settle().await;

    backend.fail_create_order(true);
    session.add_item(&menu[3]).unwrap();
    assert!(session.submit_order().await.is_err());
    assert_eq!(session.cart().len(), 1);
    settle().await;
    assert_eq!(backend.live_subscriptions(), 1);

    backend.set_status(&first.order_id, OrderStatus::Preparing);
    let mut rx = session.track_active_order().unwrap();
    rx.wait_for(|status| *status == OrderStatus::Preparing)
        .await
        .unwrap();
    let stored = SessionStore::new(store).active_order().unwrap().unwrap();
    assert_eq!(stored.order_id, first.order_id);
    session.shutdown().await;
}
