//! Public menu

use super::Product;
use serde::{Deserialize, Serialize};

/// A menu section: category with its products, as served by `GET /menu`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuCategory {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default)]
    pub products: Vec<Product>,
}

/// Sort categories and their products by display order.
///
/// The backend already sorts; this keeps the invariant for menus built or
/// patched locally.
pub fn sort_menu(menu: &mut [MenuCategory]) {
    menu.sort_by_key(|c| (c.display_order, c.id));
    for category in menu.iter_mut() {
        category.products.sort_by_key(|p| (p.display_order, p.id));
    }
}
