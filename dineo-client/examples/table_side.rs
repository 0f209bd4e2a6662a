//! Table-side ordering walkthrough
//!
//! Seats a table, fills a cart, places the order and follows it until the
//! kitchen is done. Without `DINEO_BACKEND_URL` it runs against the
//! in-memory backend with a simulated kitchen.
//!
//! Run: cargo run --example table_side -- 12

use anyhow::Context;
use dineo_client::logger::init_logger;
use dineo_client::{
    ClientConfig, DineoSession, MemoryBackend, OrderBackend, OrderStatus, RestBackend,
    SimulatedKitchen, demo_catalog,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logger();

    let table = std::env::args().nth(1).unwrap_or_else(|| "12".to_string());
    let config = ClientConfig::from_env();

    let mut kitchen = None;
    let backend: Arc<dyn OrderBackend> = if std::env::var("DINEO_BACKEND_URL").is_ok() {
        println!("Backend: {}", config.base_url);
        Arc::new(RestBackend::new(&config).context("building REST backend")?)
    } else {
        println!("Backend: in-memory with simulated kitchen");
        let memory = Arc::new(MemoryBackend::new().with_menu(demo_catalog()));
        let kitchen_task = SimulatedKitchen::new(memory.clone())
            .with_step(Duration::from_secs(9), OrderStatus::Completed)
            .spawn();
        kitchen = Some(kitchen_task);
        memory
    };

    let mut session = DineoSession::open(config, backend)?;
    let monitor = session.spawn_connectivity_monitor();
    println!("Restored phase: {:?}", session.phase());

    if session.active_order().is_none() {
        let table = session.enter_table(&table)?;
        println!("Seated at table {table}");

        let menu = session.fetch_menu().await?;
        for item in menu.iter().filter(|item| item.category == "Starters").take(2) {
            session.add_item(item)?;
        }
        if let Some(drink) = menu.iter().find(|item| item.category == "Beverages") {
            session.add_item(drink)?;
            session.add_item(drink)?;
        }

        let totals = session.totals();
        println!("Cart: {} items, subtotal {}", totals.item_count, totals.subtotal);
        for line in session.cart().lines() {
            println!("  {} x{} = {}", line.item.name, line.quantity, line.line_total());
        }

        let order = session.submit_order().await?;
        println!("Placed {} (total {})", order.order_id, order.total);
    }

    let mut status = session.track_active_order()?;
    println!("Status: {}", *status.borrow_and_update());
    while status.changed().await.is_ok() {
        let current = *status.borrow_and_update();
        println!("Status: {current}");
        if current.is_terminal(session.config().status_variant) {
            break;
        }
    }

    match session.go_home().await {
        Ok(()) => println!("Order finished, session closed"),
        Err(e) => println!("Order still open: {e}"),
    }

    monitor.stop().await;
    if let Some(kitchen) = kitchen {
        kitchen.stop().await;
    }
    session.shutdown().await;
    Ok(())
}
