//! Option group / option value models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Selection mode of an option group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionKind {
    /// Exactly one value must be chosen (size, sugar level...)
    #[serde(rename = "CHON_1")]
    SingleSelect,
    /// Any number of values (toppings)
    #[serde(rename = "CHON_NHIEU")]
    MultiSelect,
}

/// Option value (embedded in OptionGroup)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionValue {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_id: Option<i64>,
    pub name: String,
    /// Added to the product base price (may be zero or negative)
    #[serde(default)]
    pub price_adjustment: Decimal,
    #[serde(default)]
    pub is_out_of_stock: bool,
}

/// Option group entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionGroup {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: OptionKind,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default)]
    pub values: Vec<OptionValue>,
}

impl OptionGroup {
    pub fn value(&self, value_id: i64) -> Option<&OptionValue> {
        self.values.iter().find(|v| v.id == value_id)
    }
}

/// Create option group payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionGroupCreate {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: OptionKind,
    pub display_order: i32,
}

/// Update option group payload (partial)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionGroupUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<OptionKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
}

/// Create option value payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionValueCreate {
    pub name: String,
    pub price_adjustment: Decimal,
    #[serde(default)]
    pub is_out_of_stock: bool,
}

/// Update option value payload (partial)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionValueUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_adjustment: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_out_of_stock: Option<bool>,
}
