//! Kitchen display: logs the live ticket board until Ctrl-C

use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::Utc;
use menu_client::channel::WsTransport;
use menu_client::kitchen::{ActiveOrderQueue, FeedEvent, KitchenFeed, LogAlert};
use menu_client::logger::init_logger_with_file;
use menu_client::session::{AdminCredentials, ensure_login};
use menu_client::storage::FileStore;
use menu_client::{ClientConfig, HttpClient};
use tokio::sync::broadcast::error::RecvError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment and logging
    dotenv::dotenv().ok();
    let config = ClientConfig::from_env();
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());

    tracing::info!(api = %config.base_url, "🍳 Kitchen display starting...");

    // 2. Admin session
    let store = FileStore::new(config.storage_dir.clone());
    store
        .ensure_dir()
        .with_context(|| format!("cannot create {}", config.storage_dir.display()))?;
    let http = HttpClient::new(&config)?.with_store(Arc::new(store));
    ensure_login(&http, AdminCredentials::from_env().as_ref())
        .await
        .context("admin login failed (set MENU_ADMIN_USERNAME / MENU_ADMIN_PASSWORD)")?;

    // 3. Feed
    let feed = KitchenFeed::spawn(
        &config,
        Arc::new(http),
        Arc::new(LogAlert),
        Arc::new(WsTransport),
    );
    let mut events = feed.subscribe_events();
    let mut board = feed.subscribe_queue();

    let expired = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break false;
            }
            event = events.recv() => match event {
                Ok(FeedEvent::AuthExpired) => break true,
                Ok(FeedEvent::FetchFailed(e)) => tracing::warn!("Board not refreshed: {e}"),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => tracing::debug!(skipped, "Feed events lagged"),
                Err(RecvError::Closed) => break false,
            },
            changed = board.changed() => {
                if changed.is_err() {
                    break false;
                }
                let queue = board.borrow_and_update().clone();
                log_board(&queue);
            }
        }
    };

    feed.shutdown().await;
    if expired {
        bail!("admin session expired, log in again");
    }
    Ok(())
}

fn log_board(queue: &ActiveOrderQueue) {
    let now = Utc::now();
    tracing::info!(active = queue.len(), "Board updated");
    for order in queue.orders() {
        let elapsed = ActiveOrderQueue::elapsed_minutes(order, now);
        let late = queue.late(now).any(|o| o.id == order.id);
        tracing::info!(
            order_id = order.id,
            status = %order.status,
            customer = %order.customer_name,
            table_id = ?order.table_id,
            items = order.items.len(),
            elapsed_min = elapsed,
            late,
            "ticket"
        );
    }
}
