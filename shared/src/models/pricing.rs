//! Price quote models (`POST /orders/calculate`)

use super::{DeliveryMethod, OrderItemCreate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Quote request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculateRequest {
    pub items: Vec<OrderItemCreate>,
    pub voucher_code: Option<String>,
    pub delivery_method: DeliveryMethod,
    /// Used by the backend to look up loyalty points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub use_points: bool,
}

/// Authoritative price quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingQuote {
    pub sub_total: Decimal,
    pub delivery_fee: Decimal,
    pub discount_amount: Decimal,
    #[serde(default)]
    pub points_discount: Decimal,
    pub total_amount: Decimal,
    #[serde(default)]
    pub user_points_available: i64,
    #[serde(default)]
    pub can_use_points: bool,
}

impl PricingQuote {
    /// A voucher counts as applied only if it produced a discount.
    pub fn voucher_applied(&self) -> bool {
        self.discount_amount > Decimal::ZERO
    }

    /// `total = max(0, sub_total + delivery_fee - discount - points_discount)`
    pub fn is_consistent(&self) -> bool {
        let expected = (self.sub_total + self.delivery_fee
            - self.discount_amount
            - self.points_discount)
            .max(Decimal::ZERO);
        expected == self.total_amount
    }
}
