//! Data models
//!
//! Mirrors the backend REST payloads. All IDs are `i64`, all money is
//! `Decimal`.

pub mod auth;
pub mod category;
pub mod customer;
pub mod menu;
pub mod option;
pub mod order;
pub mod pricing;
pub mod product;

// Re-exports
pub use auth::*;
pub use category::*;
pub use customer::*;
pub use menu::*;
pub use option::*;
pub use order::*;
pub use pricing::*;
pub use product::*;
