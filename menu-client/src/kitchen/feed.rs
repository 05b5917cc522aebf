//! Kitchen feed task
//!
//! Owns the admin channel. Pushes are only a signal: every `new_order`
//! (and every reconnect) triggers a full re-fetch of the order list.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use shared::message::{AdminPush, NewOrderPush};
use shared::models::{OrderDetail, OrderStatus};

use super::queue::ActiveOrderQueue;
use crate::channel::{ChannelHandle, ChannelState, JsonCodec, Transport};
use crate::{ClientConfig, ClientError, ClientResult, HttpClient};

/// Admin channel codec; nothing is sent besides the keep-alive
pub type AdminCodec = JsonCodec<AdminPush, ()>;

/// Orders fetched per refresh
pub const KITCHEN_FETCH_LIMIT: u32 = 100;

/// Order endpoints used by the feed
#[async_trait]
pub trait OrderApi: Send + Sync {
    async fn list_orders(&self, limit: u32) -> ClientResult<Vec<OrderDetail>>;
    async fn update_order_status(&self, order_id: i64, status: OrderStatus) -> ClientResult<()>;
}

#[async_trait]
impl OrderApi for HttpClient {
    async fn list_orders(&self, limit: u32) -> ClientResult<Vec<OrderDetail>> {
        HttpClient::list_orders(self, limit).await
    }

    async fn update_order_status(&self, order_id: i64, status: OrderStatus) -> ClientResult<()> {
        HttpClient::update_order_status(self, order_id, status).await
    }
}

/// Audible/visual alert for a new order
pub trait OrderAlert: Send + Sync {
    fn new_order(&self, push: &NewOrderPush);
}

/// Alert that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAlert;

impl OrderAlert for LogAlert {
    fn new_order(&self, push: &NewOrderPush) {
        tracing::info!(
            order_id = push.order_id,
            customer = push.customer_name.as_deref().unwrap_or("-"),
            table_id = ?push.table_id,
            total = ?push.total_amount,
            "🔔 New order"
        );
    }
}

/// Feed notifications
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// Queue replaced by a fresh fetch
    Refreshed { active: usize },
    NewOrder(NewOrderPush),
    /// Fetch failed; the queue keeps its previous content
    FetchFailed(String),
    /// Admin token rejected; the feed has stopped
    AuthExpired,
}

struct FeedShared {
    api: Arc<dyn OrderApi>,
    queue: watch::Sender<ActiveOrderQueue>,
    events: broadcast::Sender<FeedEvent>,
    shutdown: CancellationToken,
    /// Bumped by every fetch issued and every local board change; a fetch
    /// result only lands if nothing happened since it was issued
    generation: AtomicU64,
}

impl FeedShared {
    async fn refresh(&self) -> ClientResult<usize> {
        let issued = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        match self.api.list_orders(KITCHEN_FETCH_LIMIT).await {
            Ok(orders) => {
                let mut fresh = Some(ActiveOrderQueue::from_orders(orders));
                let applied = self.queue.send_if_modified(|queue| {
                    if self.generation.load(Ordering::SeqCst) != issued {
                        return false;
                    }
                    if let Some(fresh) = fresh.take() {
                        *queue = fresh;
                    }
                    true
                });
                let active = self.queue.borrow().len();
                if !applied {
                    tracing::debug!(issued, "Discarding stale order list");
                    return Ok(active);
                }
                tracing::debug!(active, "Kitchen queue refreshed");
                self.emit(FeedEvent::Refreshed { active });
                Ok(active)
            }
            Err(e) => {
                if e.is_unauthorized() {
                    self.expire();
                } else {
                    tracing::warn!("Failed to fetch orders: {e}");
                    self.emit(FeedEvent::FetchFailed(e.to_string()));
                }
                Err(e)
            }
        }
    }

    /// Apply a local change to the board, invalidating fetches in flight
    fn modify_board(&self, change: impl FnOnce(&mut ActiveOrderQueue)) {
        self.queue.send_modify(|queue| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            change(queue);
        });
    }

    fn expire(&self) {
        tracing::warn!("Admin session expired, stopping kitchen feed");
        self.emit(FeedEvent::AuthExpired);
        self.shutdown.cancel();
    }

    fn emit(&self, event: FeedEvent) {
        // no subscriber is fine
        let _ = self.events.send(event);
    }
}

/// Live kitchen board
pub struct KitchenFeed {
    shared: Arc<FeedShared>,
    channel_state: watch::Receiver<ChannelState>,
    task: Option<JoinHandle<()>>,
}

impl KitchenFeed {
    /// Connect the admin channel and start maintaining the queue
    pub fn spawn(
        config: &ClientConfig,
        api: Arc<dyn OrderApi>,
        alert: Arc<dyn OrderAlert>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let (channel, inbound) =
            ChannelHandle::spawn(config.admin_channel(), transport, AdminCodec::new());
        let channel_state = channel.subscribe_state();
        let (queue, _) = watch::channel(ActiveOrderQueue::default());
        let (events, _) = broadcast::channel(32);

        let shared = Arc::new(FeedShared {
            api,
            queue,
            events,
            shutdown: CancellationToken::new(),
            generation: AtomicU64::new(0),
        });
        let task = tokio::spawn(run_feed(channel, inbound, shared.clone(), alert));

        Self {
            shared,
            channel_state,
            task: Some(task),
        }
    }

    /// Current tickets
    pub fn queue(&self) -> ActiveOrderQueue {
        self.shared.queue.borrow().clone()
    }

    pub fn subscribe_queue(&self) -> watch::Receiver<ActiveOrderQueue> {
        self.shared.queue.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<FeedEvent> {
        self.shared.events.subscribe()
    }

    pub fn channel_state(&self) -> ChannelState {
        *self.channel_state.borrow()
    }

    pub fn subscribe_channel_state(&self) -> watch::Receiver<ChannelState> {
        self.channel_state.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.shared.shutdown.is_cancelled()
    }

    /// Manual reload
    pub async fn refresh(&self) -> ClientResult<usize> {
        self.shared.refresh().await
    }

    /// Move an order one step along new → confirmed → preparing → completed.
    ///
    /// The board changes immediately; a failed server call puts the
    /// ticket back. A successful one is followed by a re-fetch.
    pub async fn advance(&self, order_id: i64) -> ClientResult<OrderStatus> {
        let previous = self
            .shared
            .queue
            .borrow()
            .get(order_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("order {order_id} is not on the board")))?;
        let next = previous.status.next_kitchen_step().ok_or_else(|| {
            ClientError::Validation(format!("order {order_id} has no next kitchen step"))
        })?;

        self.shared.modify_board(|queue| {
            queue.set_status(order_id, next);
        });

        match self.shared.api.update_order_status(order_id, next).await {
            Ok(()) => {
                tracing::info!(order_id, status = %next, "Order advanced");
                if let Err(e) = self.shared.refresh().await {
                    tracing::debug!(order_id, "Re-fetch after advance failed: {e}");
                }
                Ok(next)
            }
            Err(e) => {
                tracing::warn!(order_id, status = %next, "Status update failed, rolling back: {e}");
                self.shared.modify_board(|queue| queue.restore(previous));
                if e.is_unauthorized() {
                    self.shared.expire();
                }
                Err(e)
            }
        }
    }

    /// Resolves once the feed has stopped (shutdown or auth expiry)
    pub async fn stopped(&self) {
        self.shared.shutdown.cancelled().await;
    }

    /// Stop the feed and close the channel
    pub async fn shutdown(mut self) {
        self.shared.shutdown.cancel();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            tracing::warn!("Kitchen feed task ended abnormally: {e}");
        }
    }
}

impl Drop for KitchenFeed {
    fn drop(&mut self) {
        self.shared.shutdown.cancel();
    }
}

impl std::fmt::Debug for KitchenFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KitchenFeed")
            .field("channel", &self.channel_state())
            .field("active", &self.shared.queue.borrow().len())
            .finish_non_exhaustive()
    }
}

async fn run_feed(
    channel: ChannelHandle<AdminCodec>,
    mut inbound: mpsc::Receiver<AdminPush>,
    shared: Arc<FeedShared>,
    alert: Arc<dyn OrderAlert>,
) {
    let mut state = channel.subscribe_state();
    tracing::info!("Kitchen feed started");

    // board is filled before the channel comes up
    let _ = shared.refresh().await;

    loop {
        tokio::select! {
            _ = shared.shutdown.cancelled() => break,

            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *state.borrow_and_update();
                tracing::info!(state = %current, "Kitchen channel");
                if current == ChannelState::Online {
                    let _ = shared.refresh().await;
                }
            }

            push = inbound.recv() => match push {
                Some(AdminPush::NewOrder(push)) => {
                    alert.new_order(&push);
                    shared.emit(FeedEvent::NewOrder(push));
                    let _ = shared.refresh().await;
                }
                Some(AdminPush::Other) => tracing::trace!("Ignoring admin push"),
                None => break,
            },
        }
    }

    channel.shutdown_and_wait().await;
    tracing::info!("Kitchen feed stopped");
}
