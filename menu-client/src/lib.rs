//! Menu Client - ordering client for the smart-menu backend
//!
//! Cart, group ordering, price quotes and checkout for customers; the
//! kitchen feed and catalog tools for staff.

pub mod admin;
pub mod api;
pub mod cart;
pub mod channel;
pub mod checkout;
pub mod config;
pub mod error;
pub mod group;
pub mod http;
pub mod kitchen;
pub mod logger;
pub mod pricing;
pub mod session;
pub mod storage;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;

// Re-export shared types for convenience
pub use shared::cart::{CartLine, LineHandle, LineIdentity, NewLine};
pub use shared::models::{CustomerInfo, DeliveryMethod, OrderStatus, PaymentMethod, PricingQuote};

pub use cart::{CartStore, SharedCart};
pub use group::{GroupPhase, GroupSync};
pub use kitchen::{ActiveOrderQueue, FeedEvent, KitchenFeed};
pub use pricing::{PriceCalculator, PricingInputs, QuoteState};
