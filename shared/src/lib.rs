//! Shared types for the smart-menu ordering client
//!
//! Catalog models, cart lines, order/pricing payloads and realtime
//! channel messages. Used by `menu-client` and anything that talks to
//! the same backend.

pub mod cart;
pub mod message;
pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use cart::{CartLine, LineHandle, LineIdentity, NewLine};
pub use message::{AdminPush, GroupMessage};
