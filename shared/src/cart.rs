//! Cart line model
//!
//! A cart line is one orderable configuration (product + chosen option
//! values + note + orderer) with a quantity. Lines that share a
//! [`LineIdentity`] are the same logical line and merge quantities.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Line Handle
// ============================================================================

/// Per-line handle, unique for the lifetime of a cart line.
///
/// Handles are local: a line mirrored to another participant gets a fresh
/// handle on the receiving side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineHandle(Uuid);

impl LineHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LineHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// Line Identity
// ============================================================================

/// Structural identity of a cart line.
///
/// Option value ids are sorted and deduplicated, so selection order never
/// matters. `ordered_by == None` is the single-user sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineIdentity {
    pub product_id: i64,
    pub option_value_ids: Vec<i64>,
    pub note: String,
    pub ordered_by: Option<String>,
}

impl LineIdentity {
    pub fn new(product_id: i64, option_value_ids: &[i64], note: &str, ordered_by: Option<&str>) -> Self {
        let mut ids = option_value_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        Self {
            product_id,
            option_value_ids: ids,
            note: note.to_string(),
            ordered_by: ordered_by.map(str::to_string),
        }
    }
}

// ============================================================================
// New Line (candidate)
// ============================================================================

/// A line about to be added: everything except its handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLine {
    pub product_id: i64,
    /// Product name snapshot (display only)
    #[serde(default)]
    pub name: String,
    /// Product image snapshot (display only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Requested quantity; `<= 0` makes the add a no-op
    pub quantity: i64,
    #[serde(default)]
    pub option_value_ids: Vec<i64>,
    #[serde(default)]
    pub note: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordered_by: Option<String>,
    /// Base price + option adjustments at insertion time
    pub unit_price: Decimal,
}

impl NewLine {
    pub fn new(product_id: i64, name: impl Into<String>, unit_price: Decimal) -> Self {
        Self {
            product_id,
            name: name.into(),
            image_url: None,
            quantity: 1,
            option_value_ids: Vec::new(),
            note: String::new(),
            ordered_by: None,
            unit_price,
        }
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_options(mut self, option_value_ids: impl IntoIterator<Item = i64>) -> Self {
        self.option_value_ids = option_value_ids.into_iter().collect();
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn with_ordered_by(mut self, name: impl Into<String>) -> Self {
        self.ordered_by = Some(name.into());
        self
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn identity(&self) -> LineIdentity {
        LineIdentity::new(
            self.product_id,
            &self.option_value_ids,
            &self.note,
            self.ordered_by.as_deref(),
        )
    }
}

// ============================================================================
// Cart Line
// ============================================================================

/// A line held by the cart.
///
/// The serde aliases accept lines persisted by the earlier web client
/// (`options`, `itemPrice`, no handle).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(default)]
    pub handle: LineHandle,
    pub product_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub quantity: u32,
    #[serde(default, alias = "options")]
    pub option_value_ids: Vec<i64>,
    #[serde(default)]
    pub note: String,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "orderedBy")]
    pub ordered_by: Option<String>,
    #[serde(alias = "itemPrice")]
    pub unit_price: Decimal,
}

impl CartLine {
    /// Build a line from a candidate. `quantity` is the already-validated
    /// positive quantity.
    pub fn from_new(handle: LineHandle, candidate: NewLine, quantity: u32) -> Self {
        Self {
            handle,
            product_id: candidate.product_id,
            name: candidate.name,
            image_url: candidate.image_url,
            quantity,
            option_value_ids: candidate.option_value_ids,
            note: candidate.note,
            ordered_by: candidate.ordered_by,
            unit_price: candidate.unit_price,
        }
    }

    pub fn identity(&self) -> LineIdentity {
        LineIdentity::new(
            self.product_id,
            &self.option_value_ids,
            &self.note,
            self.ordered_by.as_deref(),
        )
    }

    /// `unit_price × quantity`
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// Candidate form of this line (drops the local handle).
    pub fn to_new_line(&self) -> NewLine {
        NewLine {
            product_id: self.product_id,
            name: self.name.clone(),
            image_url: self.image_url.clone(),
            quantity: i64::from(self.quantity),
            option_value_ids: self.option_value_ids.clone(),
            note: self.note.clone(),
            ordered_by: self.ordered_by.clone(),
            unit_price: self.unit_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_ignores_option_order_and_duplicates() {
        let a = LineIdentity::new(7, &[5, 3], "ít đá", None);
        let b = LineIdentity::new(7, &[3, 5, 5], "ít đá", None);
        assert_eq!(a, b);
    }

    #[test]
    fn test_identity_separator_characters_do_not_collide() {
        // "a|b" + "" must not equal "a" + "b|"
        let a = LineIdentity::new(1, &[], "a|b", Some(""));
        let b = LineIdentity::new(1, &[], "a", Some("b|"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_identity_includes_orderer() {
        let line = NewLine::new(7, "Trà đào", Decimal::from(25_000));
        let an = line.clone().with_ordered_by("An").identity();
        let binh = line.with_ordered_by("Bình").identity();
        assert_ne!(an, binh);
    }

    #[test]
    fn test_line_total() {
        let line = CartLine::from_new(
            LineHandle::new(),
            NewLine::new(7, "Trà đào", Decimal::from(25_000)),
            3,
        );
        assert_eq!(line.line_total(), Decimal::from(75_000));
    }

    #[test]
    fn test_legacy_line_deserializes() {
        let json = r#"{"product_id":7,"quantity":2,"options":[3,5],"note":"","name":"Trà đào","itemPrice":25000}"#;
        let line: CartLine = serde_json::from_str(json).unwrap();
        assert_eq!(line.option_value_ids, vec![3, 5]);
        assert_eq!(line.unit_price, Decimal::from(25_000));
        assert_eq!(line.quantity, 2);
    }
}
