//! Cart Store
//!
//! The customer's in-progress order. [`CartStore`] is the single source of
//! truth for cart lines; [`ProductSelection`] turns a product plus the
//! customer's option choices into a [`NewLine`](shared::NewLine).

mod selection;
mod store;

pub use selection::{GroupSelection, ProductSelection, SelectionError};
pub use store::{CART_FORMAT_VERSION, CartStore, SharedCart};
