//! Product Model

use super::OptionGroup;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product entity
///
/// The public menu nests products under their category and omits
/// `category_id`; the admin listing includes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub base_price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default)]
    pub is_best_seller: bool,
    #[serde(default)]
    pub is_out_of_stock: bool,
    #[serde(default)]
    pub category_id: Option<i64>,
    /// Linked option groups
    #[serde(default)]
    pub options: Vec<OptionGroup>,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub description: Option<String>,
    pub base_price: Decimal,
    pub image_url: Option<String>,
    pub display_order: i32,
    pub is_best_seller: bool,
    pub is_out_of_stock: bool,
    pub category_id: i64,
}

/// Update product payload (partial)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_best_seller: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_out_of_stock: Option<bool>,
}

/// Replace the option groups linked to a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkOptionsRequest {
    pub option_ids: Vec<i64>,
}

/// Response of the image upload endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedImage {
    /// Served path, usually relative to the API base (`/static/...`)
    pub image_url: String,
}
