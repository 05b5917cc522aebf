//! Kitchen/Order Realtime Feed
//!
//! Keeps a FIFO board of in-progress orders in sync with the backend:
//! full re-fetch on connect and on every `new_order` push, optimistic
//! status advancement with rollback on failure.

mod feed;
mod queue;

pub use feed::{
    AdminCodec, FeedEvent, KITCHEN_FETCH_LIMIT, KitchenFeed, LogAlert, OrderAlert, OrderApi,
};
pub use queue::{ActiveOrderQueue, LATE_AFTER_MINUTES};
