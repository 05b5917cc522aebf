use crate::storage::{SharedStore, keys};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::cart::{CartLine, LineHandle, NewLine};
use shared::models::OrderItemCreate;
use std::sync::Arc;
use tokio::sync::watch;

/// Version tag written into the persisted cart envelope
pub const CART_FORMAT_VERSION: u32 = 1;

/// Cart shared between the UI, group sync and checkout
pub type SharedCart = Arc<Mutex<CartStore>>;

#[derive(Serialize)]
struct PersistedCartRef<'a> {
    version: u32,
    lines: &'a [CartLine],
}

#[derive(Deserialize)]
struct PersistedCart {
    version: u32,
    lines: Vec<CartLine>,
}

/// In-memory cart with best-effort persistence.
///
/// Lines keep insertion order. Totals are computed on every read.
#[derive(Debug)]
pub struct CartStore {
    lines: Vec<CartLine>,
    store: Option<SharedStore>,
    revision: watch::Sender<u64>,
}

impl CartStore {
    /// Empty cart without persistence
    pub fn new() -> Self {
        Self::with_lines(Vec::new(), None)
    }

    fn with_lines(lines: Vec<CartLine>, store: Option<SharedStore>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            lines,
            store,
            revision,
        }
    }

    /// Rehydrate from `store`; unreadable or malformed data yields an
    /// empty cart.
    pub fn load(store: SharedStore) -> Self {
        let lines = match store.get(keys::CART) {
            Ok(Some(raw)) => decode_lines(&raw).unwrap_or_else(|reason| {
                tracing::warn!(reason = %reason, "Discarding persisted cart");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read persisted cart: {e}");
                Vec::new()
            }
        };
        tracing::debug!(lines = lines.len(), "Cart loaded");
        Self::with_lines(lines, Some(store))
    }

    /// Wrap into a [`SharedCart`]
    pub fn into_shared(self) -> SharedCart {
        Arc::new(Mutex::new(self))
    }

    /// Revision counter, bumped on every mutation
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    // ========== Mutations ==========

    /// Add a candidate line, merging into the line with the same identity.
    ///
    /// Returns the handle of the line that absorbed the candidate, or
    /// `None` when `quantity <= 0` (no-op).
    pub fn add_line(&mut self, candidate: NewLine) -> Option<LineHandle> {
        if candidate.quantity <= 0 {
            tracing::debug!(
                product_id = candidate.product_id,
                quantity = candidate.quantity,
                "Ignoring add with non-positive quantity"
            );
            return None;
        }
        let quantity = u32::try_from(candidate.quantity).unwrap_or(u32::MAX);
        let identity = candidate.identity();

        let handle = match self.lines.iter_mut().find(|l| l.identity() == identity) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(quantity);
                existing.handle
            }
            None => {
                let handle = LineHandle::new();
                self.lines
                    .push(CartLine::from_new(handle, candidate, quantity));
                handle
            }
        };

        self.changed();
        Some(handle)
    }

    /// Remove a line; returns false if the handle is unknown
    pub fn remove_line(&mut self, handle: LineHandle) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.handle != handle);
        let removed = self.lines.len() != before;
        if removed {
            self.changed();
        }
        removed
    }

    /// Set a line's quantity; anything below 1 removes the line
    pub fn update_quantity(&mut self, handle: LineHandle, quantity: i64) -> bool {
        if quantity < 1 {
            return self.remove_line(handle);
        }
        let Some(line) = self.lines.iter_mut().find(|l| l.handle == handle) else {
            return false;
        };
        line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        self.changed();
        true
    }

    /// Empty the cart and drop the persisted entry
    pub fn clear(&mut self) {
        self.lines.clear();
        if let Some(store) = &self.store
            && let Err(e) = store.remove(keys::CART)
        {
            tracing::warn!("Failed to remove persisted cart: {e}");
        }
        self.revision.send_modify(|r| *r += 1);
    }

    // ========== Reads ==========

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn find(&self, handle: LineHandle) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.handle == handle)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of quantities
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Sum of `unit_price × quantity`
    pub fn total_price(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Lines in order-submission form
    pub fn order_items(&self) -> Vec<OrderItemCreate> {
        self.lines.iter().map(OrderItemCreate::from).collect()
    }

    fn changed(&mut self) {
        self.persist();
        self.revision.send_modify(|r| *r += 1);
    }

    fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let envelope = PersistedCartRef {
            version: CART_FORMAT_VERSION,
            lines: &self.lines,
        };
        let result = serde_json::to_string(&envelope)
            .map_err(crate::storage::StorageError::from)
            .and_then(|json| store.set(keys::CART, &json));
        if let Err(e) = result {
            tracing::warn!("Failed to persist cart: {e}");
        }
    }
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a persisted cart: the versioned envelope, or the bare array
/// written by older clients.
fn decode_lines(raw: &str) -> Result<Vec<CartLine>, String> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {e}"))?;

    let lines: Vec<CartLine> = if value.is_array() {
        serde_json::from_value(value).map_err(|e| format!("invalid lines: {e}"))?
    } else {
        let envelope: PersistedCart =
            serde_json::from_value(value).map_err(|e| format!("invalid envelope: {e}"))?;
        if envelope.version != CART_FORMAT_VERSION {
            return Err(format!("unsupported version {}", envelope.version));
        }
        envelope.lines
    };

    if lines.iter().any(|l| l.quantity == 0) {
        return Err("line with zero quantity".to_string());
    }
    Ok(merge_duplicates(lines))
}

/// Fold lines sharing an identity into the first of them.
///
/// Older clients keyed lines by option order, so `[3,5]` and `[5,3]` may
/// have been stored as separate lines.
fn merge_duplicates(lines: Vec<CartLine>) -> Vec<CartLine> {
    let mut merged: Vec<CartLine> = Vec::with_capacity(lines.len());
    for line in lines {
        let identity = line.identity();
        match merged.iter_mut().find(|l| l.identity() == identity) {
            Some(existing) => {
                tracing::debug!(
                    product_id = line.product_id,
                    "Merging duplicate persisted cart line"
                );
                existing.quantity = existing.quantity.saturating_add(line.quantity);
            }
            None => merged.push(line),
        }
    }
    merged
}
