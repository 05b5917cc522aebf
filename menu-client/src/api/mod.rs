//! Typed REST endpoints on [`HttpClient`](crate::HttpClient)
//!
//! - `menu`: public menu, pricing, order submission
//! - `catalog`: admin CRUD for categories, option groups, products, images
//! - `orders`: admin order listing and status transitions

mod catalog;
mod menu;
mod orders;

/// Page size used for admin listings (the admin screens load everything)
pub const ADMIN_LIST_LIMIT: u32 = 1000;
