//! Price/Voucher Calculator
//!
//! Keeps the displayed quote in line with the cart, delivery method,
//! voucher and phone. The backend is the only source of prices; this
//! module decides when to ask and which answer to keep.

mod calculator;
mod inputs;

pub use calculator::{
    PriceCalculator, PricingApi, QuoteState, VOUCHER_MIN_LENGTH, VOUCHER_REJECTED_MESSAGE,
};
pub use inputs::{PricingInputs, normalize_voucher};
