//! Kitchen feed against a scripted order API and an in-memory admin channel

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use menu_client::channel::{MemoryPeer, MemoryServer, memory_transport};
use menu_client::kitchen::{FeedEvent, KitchenFeed, OrderAlert, OrderApi};
use menu_client::{ClientConfig, ClientError, ClientResult, OrderStatus};
use parking_lot::Mutex;
use shared::message::NewOrderPush;
use shared::models::OrderDetail;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;

fn order(id: i64, status: OrderStatus, minute: u32) -> OrderDetail {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "customer_name": format!("Khách {id}"),
        "total_amount": 75000,
        "status": status.code(),
        "created_at": Utc.with_ymd_and_hms(2026, 3, 1, 11, minute, 0).unwrap().to_rfc3339(),
    }))
    .unwrap()
}

#[derive(Default)]
struct FakeOrders {
    orders: Mutex<Vec<OrderDetail>>,
    list_calls: AtomicUsize,
    status_calls: Mutex<Vec<(i64, OrderStatus)>>,
    fail_updates: Mutex<bool>,
    expired: Mutex<bool>,
    /// Delay applied to the next list call only
    slow_next_list: Mutex<Option<Duration>>,
}

impl FakeOrders {
    fn with(orders: Vec<OrderDetail>) -> Arc<Self> {
        let api = Self::default();
        *api.orders.lock() = orders;
        Arc::new(api)
    }

    fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderApi for FakeOrders {
    async fn list_orders(&self, _limit: u32) -> ClientResult<Vec<OrderDetail>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if *self.expired.lock() {
            return Err(ClientError::Unauthorized);
        }
        let snapshot = self.orders.lock().clone();
        let delay = self.slow_next_list.lock().take();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(snapshot)
    }

    async fn update_order_status(&self, order_id: i64, status: OrderStatus) -> ClientResult<()> {
        self.status_calls.lock().push((order_id, status));
        if *self.fail_updates.lock() {
            return Err(ClientError::Internal("500: database busy".to_string()));
        }
        if let Some(order) = self.orders.lock().iter_mut().find(|o| o.id == order_id) {
            order.status = status;
        }
        Ok(())
    }
}

#[derive(Default)]
struct CountingAlert {
    alerts: Mutex<Vec<i64>>,
}

impl OrderAlert for CountingAlert {
    fn new_order(&self, push: &NewOrderPush) {
        self.alerts.lock().push(push.order_id);
    }
}

struct Harness {
    feed: KitchenFeed,
    api: Arc<FakeOrders>,
    alert: Arc<CountingAlert>,
    server: MemoryServer,
    events: broadcast::Receiver<FeedEvent>,
}

fn start(orders: Vec<OrderDetail>) -> Harness {
    let (transport, server) = memory_transport();
    let api = FakeOrders::with(orders);
    let alert = Arc::new(CountingAlert::default());
    let feed = KitchenFeed::spawn(
        &ClientConfig::default(),
        api.clone(),
        alert.clone(),
        Arc::new(transport),
    );
    let events = feed.subscribe_events();
    Harness {
        feed,
        api,
        alert,
        server,
        events,
    }
}

async fn next_event(events: &mut broadcast::Receiver<FeedEvent>, wanted: impl Fn(&FeedEvent) -> bool) -> FeedEvent {
    tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            let event = events.recv().await.unwrap();
            if wanted(&event) {
                return event;
            }
        }
    })
    .await
    .expect("event not received")
}

fn ids(feed: &KitchenFeed) -> Vec<i64> {
    feed.queue().orders().iter().map(|o| o.id).collect()
}

async fn online(h: &mut Harness) -> MemoryPeer {
    let peer = h.server.accept().await.unwrap();
    let mut state = h.feed.subscribe_channel_state();
    state
        .wait_for(|s| *s == menu_client::channel::ChannelState::Online)
        .await
        .unwrap();
    peer
}

#[tokio::test(start_paused = true)]
async fn test_board_is_fifo_and_filtered() {
    let mut h = start(vec![
        order(3, OrderStatus::Preparing, 20),
        order(1, OrderStatus::New, 5),
        order(2, OrderStatus::Completed, 0),
        order(4, OrderStatus::Confirmed, 10),
    ]);
    let _peer = online(&mut h).await;
    next_event(&mut h.events, |e| matches!(e, FeedEvent::Refreshed { .. })).await;

    assert_eq!(ids(&h.feed), vec![1, 4, 3]);
}

#[tokio::test(start_paused = true)]
async fn test_new_order_push_alerts_and_refetches() {
    let mut h = start(vec![order(1, OrderStatus::New, 0)]);
    let peer = online(&mut h).await;
    next_event(&mut h.events, |e| matches!(e, FeedEvent::Refreshed { active: 1 })).await;

    // the push is only a signal; the order comes from the re-fetch
    h.api.orders.lock().push(order(2, OrderStatus::New, 30));
    peer.send(r#"{"type":"new_order","order_id":2,"customer_name":"Khách 2","table_id":null,"total_amount":75000.0,"timestamp":"2026-03-01T11:30:00"}"#);

    next_event(&mut h.events, |e| matches!(e, FeedEvent::NewOrder(push) if push.order_id == 2)).await;
    next_event(&mut h.events, |e| matches!(e, FeedEvent::Refreshed { active: 2 })).await;
    assert_eq!(*h.alert.alerts.lock(), vec![2]);
    assert_eq!(ids(&h.feed), vec![1, 2]);

    // other push types and keep-alive replies are ignored
    let calls = h.api.list_calls();
    peer.send(r#"{"type":"order_updated","order_id":1}"#);
    peer.send("pong");
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(h.api.list_calls(), calls);
    assert_eq!(h.alert.alerts.lock().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_keepalive_while_online() {
    let mut h = start(vec![]);
    let mut peer = online(&mut h).await;
    let frame = tokio::time::timeout(Duration::from_secs(25), peer.recv())
        .await
        .unwrap();
    assert_eq!(frame.as_deref(), Some("ping"));
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_refetches() {
    let mut h = start(vec![order(1, OrderStatus::New, 0)]);
    let peer = online(&mut h).await;
    next_event(&mut h.events, |e| matches!(e, FeedEvent::Refreshed { .. })).await;
    let calls = h.api.list_calls();

    drop(peer);
    let _peer = online(&mut h).await;
    next_event(&mut h.events, |e| matches!(e, FeedEvent::Refreshed { .. })).await;
    assert!(h.api.list_calls() > calls);
}

#[tokio::test(start_paused = true)]
async fn test_advance_through_kitchen_steps() {
    let mut h = start(vec![order(1, OrderStatus::New, 0), order(2, OrderStatus::New, 5)]);
    let _peer = online(&mut h).await;
    next_event(&mut h.events, |e| matches!(e, FeedEvent::Refreshed { active: 2 })).await;

    assert_eq!(h.feed.advance(1).await.unwrap(), OrderStatus::Confirmed);
    assert_eq!(h.feed.advance(1).await.unwrap(), OrderStatus::Preparing);
    assert_eq!(h.feed.queue().get(1).unwrap().status, OrderStatus::Preparing);

    // done: off the board
    assert_eq!(h.feed.advance(1).await.unwrap(), OrderStatus::Completed);
    assert_eq!(ids(&h.feed), vec![2]);
    assert_eq!(
        *h.api.status_calls.lock(),
        vec![
            (1, OrderStatus::Confirmed),
            (1, OrderStatus::Preparing),
            (1, OrderStatus::Completed)
        ]
    );

    assert!(matches!(h.feed.advance(1).await, Err(ClientError::NotFound(_))));
}

#[tokio::test(start_paused = true)]
async fn test_failed_advance_rolls_back() {
    let mut h = start(vec![order(1, OrderStatus::Preparing, 0)]);
    let _peer = online(&mut h).await;
    next_event(&mut h.events, |e| matches!(e, FeedEvent::Refreshed { active: 1 })).await;

    *h.api.fail_updates.lock() = true;
    let mut board = h.feed.subscribe_queue();
    let _ = board.borrow_and_update();

    let result = h.feed.advance(1).await;
    assert!(matches!(result, Err(ClientError::Internal(_))));

    // the ticket disappeared optimistically and came back
    assert!(board.has_changed().unwrap());
    assert_eq!(h.feed.queue().get(1).unwrap().status, OrderStatus::Preparing);
    assert!(h.feed.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_slow_fetch_does_not_overwrite_advance() {
    let mut h = start(vec![order(1, OrderStatus::New, 0)]);
    let _peer = online(&mut h).await;
    next_event(&mut h.events, |e| matches!(e, FeedEvent::Refreshed { active: 1 })).await;

    // this list is taken while the order is still new and answers late
    *h.api.slow_next_list.lock() = Some(Duration::from_secs(10));
    let (slow, advanced) = tokio::join!(h.feed.refresh(), async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        h.feed.advance(1).await
    });

    assert_eq!(advanced.unwrap(), OrderStatus::Confirmed);
    assert_eq!(slow.unwrap(), 1);
    assert_eq!(h.feed.queue().get(1).unwrap().status, OrderStatus::Confirmed);
}

#[tokio::test(start_paused = true)]
async fn test_auth_expiry_stops_feed() {
    let mut h = start(vec![order(1, OrderStatus::New, 0)]);
    let _peer = online(&mut h).await;
    next_event(&mut h.events, |e| matches!(e, FeedEvent::Refreshed { .. })).await;

    *h.api.expired.lock() = true;
    assert!(matches!(h.feed.refresh().await, Err(ClientError::Unauthorized)));
    next_event(&mut h.events, |e| *e == FeedEvent::AuthExpired).await;

    tokio::time::timeout(Duration::from_secs(5), h.feed.stopped())
        .await
        .unwrap();
    assert!(!h.feed.is_running());
    // the board keeps what it had
    assert_eq!(ids(&h.feed), vec![1]);
}
