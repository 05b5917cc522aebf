//! Order Model

use crate::cart::CartLine;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Enums
// ============================================================================

/// Order status (backend codes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Just placed
    #[serde(rename = "MOI")]
    New,
    #[serde(rename = "DA_XAC_NHAN")]
    Confirmed,
    #[serde(rename = "DANG_CHUAN_BI")]
    Preparing,
    /// Kitchen finished, waiting for pickup / delivery
    #[serde(rename = "DA_XONG")]
    Ready,
    #[serde(rename = "DANG_GIAO")]
    Delivering,
    #[serde(rename = "HOAN_TAT")]
    Completed,
    #[serde(rename = "DA_HUY")]
    Cancelled,
    #[serde(rename = "TU_CHOI")]
    Rejected,
    /// A status code this client does not know
    #[serde(rename = "UNKNOWN", other)]
    Unknown,
}

impl OrderStatus {
    /// Statuses shown on the kitchen board
    pub const KITCHEN_ACTIVE: [OrderStatus; 3] =
        [OrderStatus::New, OrderStatus::Confirmed, OrderStatus::Preparing];

    /// Backend code, as used in the `status` query parameter
    pub fn code(self) -> &'static str {
        match self {
            Self::New => "MOI",
            Self::Confirmed => "DA_XAC_NHAN",
            Self::Preparing => "DANG_CHUAN_BI",
            Self::Ready => "DA_XONG",
            Self::Delivering => "DANG_GIAO",
            Self::Completed => "HOAN_TAT",
            Self::Cancelled => "DA_HUY",
            Self::Rejected => "TU_CHOI",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn is_kitchen_active(self) -> bool {
        Self::KITCHEN_ACTIVE.contains(&self)
    }

    /// Next step on the kitchen board: new → confirmed → preparing → completed
    pub fn next_kitchen_step(self) -> Option<OrderStatus> {
        match self {
            Self::New => Some(Self::Confirmed),
            Self::Confirmed => Some(Self::Preparing),
            Self::Preparing => Some(Self::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Delivery method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DeliveryMethod {
    /// Eat in
    #[serde(rename = "TAI_CHO")]
    DineIn,
    #[serde(rename = "MANG_DI")]
    TakeAway,
    /// Pick up at the counter, no fee
    #[serde(rename = "TIEU_CHUAN")]
    Standard,
    /// Delivered to the customer address
    #[default]
    #[serde(rename = "NHANH")]
    Express,
}

impl DeliveryMethod {
    pub fn requires_address(self) -> bool {
        matches!(self, Self::Express)
    }
}

/// Payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "TIEN_MAT")]
    Cash,
    #[serde(rename = "CHUYEN_KHOAN")]
    BankTransfer,
    #[serde(rename = "MOMO")]
    Momo,
}

// ============================================================================
// Requests
// ============================================================================

/// Order line as sent to `/orders` and `/orders/calculate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemCreate {
    pub product_id: i64,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordered_by: Option<String>,
    /// Selected option value ids
    #[serde(default)]
    pub options: Vec<i64>,
}

impl From<&CartLine> for OrderItemCreate {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id,
            quantity: line.quantity,
            note: Some(line.note.clone()).filter(|n| !n.is_empty()),
            ordered_by: line.ordered_by.clone(),
            options: line.option_value_ids.clone(),
        }
    }
}

/// Order submission payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_note: Option<String>,
    pub payment_method: PaymentMethod,
    pub delivery_method: DeliveryMethod,
    pub voucher_code: Option<String>,
    #[serde(default)]
    pub use_points: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_id: Option<i64>,
    pub items: Vec<OrderItemCreate>,
}

// ============================================================================
// Responses
// ============================================================================

/// Response of a successful order submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedOrder {
    pub id: i64,
    pub status: OrderStatus,
    pub total_amount: Decimal,
}

/// Option chosen on an order item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemOptionDetail {
    #[serde(default)]
    pub option_name: Option<String>,
    pub value_name: String,
    #[serde(default)]
    pub added_price: Decimal,
}

/// Order item (admin view)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemDetail {
    pub id: i64,
    pub product_name: String,
    pub quantity: u32,
    pub item_price: Decimal,
    #[serde(default)]
    pub item_note: Option<String>,
    #[serde(default)]
    pub ordered_by: Option<String>,
    #[serde(default)]
    pub options_selected: Vec<OrderItemOptionDetail>,
}

/// Order (admin view), as listed by `GET /admin/orders/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetail {
    pub id: i64,
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub customer_address: String,
    #[serde(default)]
    pub customer_note: Option<String>,
    #[serde(default)]
    pub sub_total: Decimal,
    #[serde(default)]
    pub delivery_fee: Decimal,
    #[serde(default)]
    pub discount_amount: Decimal,
    #[serde(default)]
    pub points_discount: Option<Decimal>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub delivery_method_selected: Option<DeliveryMethod>,
    #[serde(default)]
    pub voucher_code: Option<String>,
    #[serde(with = "crate::util::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "crate::util::timestamp_opt")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub items: Vec<OrderItemDetail>,
    #[serde(default)]
    pub table_id: Option<i64>,
}

/// Short order form returned by the status endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: i64,
    pub customer_name: String,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    #[serde(with = "crate::util::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub table_id: Option<i64>,
}
