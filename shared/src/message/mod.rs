//! Realtime channel messages
//!
//! Two WebSocket channels share this module:
//! - `/ws/admin/orders`: server push to the kitchen/admin screens
//! - `/ws/group/{group_id}`: cart mirroring between group participants.
//!   The server relays every frame to the other members of the group.

use crate::cart::CartLine;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Keep-alive frame sent by clients (plain text, not JSON)
pub const KEEPALIVE_PING: &str = "ping";
/// Keep-alive reply, discarded by clients
pub const KEEPALIVE_PONG: &str = "pong";

// ============================================================================
// Admin push
// ============================================================================

/// Payload of a `new_order` push
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrderPush {
    pub order_id: i64,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub table_id: Option<i64>,
    #[serde(default)]
    pub total_amount: Option<Decimal>,
    /// ISO timestamp as sent by the server
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Admin channel push, discriminated by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdminPush {
    NewOrder(NewOrderPush),
    /// Any push type this client does not handle
    #[serde(other)]
    Other,
}

// ============================================================================
// Group cart
// ============================================================================

/// Cart mutation carried by a group message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartAction {
    #[serde(rename = "ADD")]
    Add,
    #[serde(other)]
    Unknown,
}

/// Group channel message, discriminated by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GroupMessage {
    #[serde(rename = "UPDATE_CART")]
    UpdateCart {
        action: CartAction,
        item: CartLine,
        participant: String,
    },
}

impl GroupMessage {
    /// Mirror of a locally added line
    pub fn add(item: CartLine, participant: impl Into<String>) -> Self {
        Self::UpdateCart {
            action: CartAction::Add,
            item,
            participant: participant.into(),
        }
    }
}
