//! Order submission
//!
//! Validates the checkout form, remembers the contact info for next time,
//! posts the cart and empties it once the backend accepted the order.

use async_trait::async_trait;
use thiserror::Error;

use shared::models::{
    CreatedOrder, CustomerInfo, DeliveryMethod, OrderCreate, OrderItemCreate, PaymentMethod,
};

use crate::cart::SharedCart;
use crate::storage::{KeyValueStore, keys, load_json, save_json};
use crate::{ClientError, ClientResult, HttpClient};

/// Address sent when the customer picks the order up
pub const PICKUP_ADDRESS: &str = "Lấy tại quán";

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Customer name is required")]
    MissingName,

    #[error("Phone number is required")]
    MissingPhone,

    #[error("Delivery address is required")]
    MissingAddress,

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Checkout form as filled in by the customer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckoutForm {
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub customer_note: String,
    pub payment_method: PaymentMethod,
    pub delivery_method: DeliveryMethod,
    pub table_id: Option<i64>,
    pub use_points: bool,
}

impl CheckoutForm {
    /// Pre-filled from the last checkout
    pub fn from_customer_info(info: CustomerInfo) -> Self {
        Self {
            customer_name: info.name,
            customer_phone: info.phone,
            customer_address: info.address,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), CheckoutError> {
        if self.customer_name.trim().is_empty() {
            return Err(CheckoutError::MissingName);
        }
        if self.customer_phone.trim().is_empty() {
            return Err(CheckoutError::MissingPhone);
        }
        if self.delivery_method.requires_address() && self.customer_address.trim().is_empty() {
            return Err(CheckoutError::MissingAddress);
        }
        Ok(())
    }

    pub fn customer_info(&self) -> CustomerInfo {
        CustomerInfo {
            name: self.customer_name.trim().to_string(),
            phone: self.customer_phone.trim().to_string(),
            address: self.customer_address.trim().to_string(),
        }
    }

    /// Order payload. Only a voucher that produced a discount is sent.
    pub fn to_order(&self, items: Vec<OrderItemCreate>, applied_voucher: Option<String>) -> OrderCreate {
        let info = self.customer_info();
        let address = if info.address.is_empty() {
            PICKUP_ADDRESS.to_string()
        } else {
            info.address
        };
        let note = self.customer_note.trim();
        OrderCreate {
            customer_name: info.name,
            customer_phone: info.phone,
            customer_address: address,
            customer_note: (!note.is_empty()).then(|| note.to_string()),
            payment_method: self.payment_method,
            delivery_method: self.delivery_method,
            voucher_code: applied_voucher.filter(|code| !code.is_empty()),
            use_points: self.use_points,
            table_id: self.table_id,
            items,
        }
    }
}

/// Order submission endpoint
#[async_trait]
pub trait OrderSubmitter: Send + Sync {
    async fn create_order(&self, order: &OrderCreate) -> ClientResult<CreatedOrder>;
}

#[async_trait]
impl OrderSubmitter for HttpClient {
    async fn create_order(&self, order: &OrderCreate) -> ClientResult<CreatedOrder> {
        HttpClient::create_order(self, order).await
    }
}

/// Last-used contact info; empty when missing or unreadable
pub fn load_customer_info(store: &dyn KeyValueStore) -> CustomerInfo {
    load_json(store, keys::CUSTOMER_INFO).unwrap_or_default()
}

/// Submit the cart.
///
/// Nothing reaches the backend unless the form is valid and the cart is
/// not empty. The cart is cleared only after the backend accepted the
/// order; on failure it is left untouched for a retry.
pub async fn submit(
    api: &dyn OrderSubmitter,
    cart: &SharedCart,
    store: &dyn KeyValueStore,
    form: &CheckoutForm,
    applied_voucher: Option<String>,
) -> Result<CreatedOrder, CheckoutError> {
    let items = cart.lock().order_items();
    if items.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    form.validate()?;

    if let Err(e) = save_json(store, keys::CUSTOMER_INFO, &form.customer_info()) {
        tracing::warn!("Failed to remember customer info: {e}");
    }

    let order = form.to_order(items, applied_voucher);
    let created = match api.create_order(&order).await {
        Ok(created) => created,
        Err(e) => {
            tracing::warn!(customer = %order.customer_name, "Order submission failed: {e}");
            return Err(e.into());
        }
    };

    cart.lock().clear();
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartStore;
    use crate::storage::MemoryStore;
    use parking_lot::Mutex;
    use rust_decimal::Decimal;
    use shared::cart::NewLine;
    use shared::models::OrderStatus;

    #[derive(Default)]
    struct FakeOrders {
        received: Mutex<Vec<OrderCreate>>,
        reject: bool,
    }

    #[async_trait]
    impl OrderSubmitter for FakeOrders {
        async fn create_order(&self, order: &OrderCreate) -> ClientResult<CreatedOrder> {
            self.received.lock().push(order.clone());
            if self.reject {
                return Err(ClientError::Validation("Sản phẩm đã hết hàng".to_string()));
            }
            Ok(CreatedOrder {
                id: 42,
                status: OrderStatus::New,
                total_amount: Decimal::from(105_000),
            })
        }
    }

    fn form() -> CheckoutForm {
        CheckoutForm {
            customer_name: " An ".to_string(),
            customer_phone: "0901234567".to_string(),
            customer_address: "12 Lê Lợi".to_string(),
            ..Default::default()
        }
    }

    fn cart_with_line() -> SharedCart {
        let mut cart = CartStore::new();
        cart.add_line(NewLine::new(7, "Trà đào", Decimal::from(25_000)).with_quantity(2));
        cart.into_shared()
    }

    #[test]
    fn test_validation() {
        assert!(form().validate().is_ok());

        let mut missing = form();
        missing.customer_phone = "  ".to_string();
        assert!(matches!(missing.validate(), Err(CheckoutError::MissingPhone)));

        let mut no_address = form();
        no_address.customer_address.clear();
        assert!(matches!(no_address.validate(), Err(CheckoutError::MissingAddress)));

        // pickup does not need an address
        no_address.delivery_method = DeliveryMethod::Standard;
        assert!(no_address.validate().is_ok());
        let order = no_address.to_order(vec![], None);
        assert_eq!(order.customer_address, PICKUP_ADDRESS);
    }

    #[tokio::test]
    async fn test_submit_clears_cart_and_remembers_customer() {
        let api = FakeOrders::default();
        let cart = cart_with_line();
        let store = MemoryStore::new();

        let created = submit(&api, &cart, &store, &form(), Some("SALE10".to_string()))
            .await
            .unwrap();

        assert_eq!(created.id, 42);
        assert!(cart.lock().is_empty());
        let sent = api.received.lock()[0].clone();
        assert_eq!(sent.customer_name, "An");
        assert_eq!(sent.voucher_code.as_deref(), Some("SALE10"));
        assert_eq!(sent.items[0].quantity, 2);
        assert_eq!(load_customer_info(&store).name, "An");
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_cart() {
        let api = FakeOrders {
            reject: true,
            ..Default::default()
        };
        let cart = cart_with_line();
        let store = MemoryStore::new();

        let result = submit(&api, &cart, &store, &form(), None).await;
        assert!(matches!(result, Err(CheckoutError::Client(ClientError::Validation(_)))));
        assert_eq!(cart.lock().item_count(), 2);
        // contact info is kept even when the order fails
        assert_eq!(load_customer_info(&store).phone, "0901234567");
    }

    #[tokio::test]
    async fn test_invalid_form_sends_nothing() {
        let api = FakeOrders::default();
        let store = MemoryStore::new();

        let empty = CartStore::new().into_shared();
        let result = submit(&api, &empty, &store, &form(), None).await;
        assert!(matches!(result, Err(CheckoutError::EmptyCart)));

        let mut nameless = form();
        nameless.customer_name.clear();
        let result = submit(&api, &cart_with_line(), &store, &nameless, None).await;
        assert!(matches!(result, Err(CheckoutError::MissingName)));

        assert!(api.received.lock().is_empty());
        assert_eq!(load_customer_info(&store), CustomerInfo::default());
    }

    #[test]
    fn test_corrupt_customer_info_is_ignored() {
        let store = MemoryStore::new();
        store.set(keys::CUSTOMER_INFO, "{not json").unwrap();
        assert_eq!(load_customer_info(&store), CustomerInfo::default());
    }
}
