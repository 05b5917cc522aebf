use shared::models::{CalculateRequest, DeliveryMethod, OrderItemCreate};

use crate::cart::CartStore;

/// Voucher codes are case-insensitive; the backend expects upper case
pub fn normalize_voucher(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Everything a price quote depends on
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PricingInputs {
    pub items: Vec<OrderItemCreate>,
    pub delivery_method: DeliveryMethod,
    /// Normalized voucher code; empty when none is entered
    pub voucher_code: String,
    pub customer_phone: Option<String>,
    pub use_points: bool,
}

impl PricingInputs {
    pub fn new(items: Vec<OrderItemCreate>, delivery_method: DeliveryMethod) -> Self {
        Self {
            items,
            delivery_method,
            ..Default::default()
        }
    }

    /// Current cart lines with the chosen delivery method
    pub fn from_cart(cart: &CartStore, delivery_method: DeliveryMethod) -> Self {
        Self::new(cart.order_items(), delivery_method)
    }

    pub fn with_voucher(mut self, code: &str) -> Self {
        self.voucher_code = normalize_voucher(code);
        self
    }

    pub fn with_phone(mut self, phone: &str) -> Self {
        let phone = phone.trim();
        self.customer_phone = (!phone.is_empty()).then(|| phone.to_string());
        self
    }

    pub fn with_points(mut self, use_points: bool) -> Self {
        self.use_points = use_points;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn voucher(&self) -> Option<&str> {
        (!self.voucher_code.is_empty()).then_some(self.voucher_code.as_str())
    }

    pub fn to_request(&self) -> CalculateRequest {
        CalculateRequest {
            items: self.items.clone(),
            voucher_code: self.voucher().map(str::to_string),
            delivery_method: self.delivery_method,
            customer_phone: self.customer_phone.clone(),
            use_points: self.use_points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::cart::NewLine;

    #[test]
    fn test_normalize_voucher() {
        assert_eq!(normalize_voucher("  sale10 "), "SALE10");
        assert_eq!(normalize_voucher(""), "");
    }

    #[test]
    fn test_request_from_cart() {
        let mut cart = CartStore::new();
        cart.add_line(
            NewLine::new(7, "Trà đào", Decimal::from(25_000))
                .with_options([3, 5])
                .with_quantity(2),
        );
        let inputs = PricingInputs::from_cart(&cart, DeliveryMethod::Standard)
            .with_voucher("sale10")
            .with_phone(" ");
        let request = inputs.to_request();

        assert_eq!(request.items.len(), 1);
        assert_eq!(request.items[0].quantity, 2);
        assert_eq!(request.voucher_code.as_deref(), Some("SALE10"));
        assert_eq!(request.customer_phone, None);
        assert_eq!(request.delivery_method, DeliveryMethod::Standard);
    }

    #[test]
    fn test_no_voucher_is_null() {
        let request = PricingInputs::default().with_voucher("   ").to_request();
        assert_eq!(request.voucher_code, None);
        let json = serde_json::to_value(&request).unwrap();
        assert!(json["voucher_code"].is_null());
    }
}
