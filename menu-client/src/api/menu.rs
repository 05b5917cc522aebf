use crate::{ClientResult, HttpClient};
use shared::models::{
    CalculateRequest, CreatedOrder, MenuCategory, OrderCreate, PricingQuote, sort_menu,
};

impl HttpClient {
    /// Public menu, categories and products sorted by display order
    pub async fn fetch_menu(&self) -> ClientResult<Vec<MenuCategory>> {
        let mut menu: Vec<MenuCategory> = self.get("/menu").await?;
        sort_menu(&mut menu);
        Ok(menu)
    }

    /// Price quote for the given items (read-only on the server)
    pub async fn calculate(&self, request: &CalculateRequest) -> ClientResult<PricingQuote> {
        self.post("/orders/calculate", request).await
    }

    /// Submit an order
    pub async fn create_order(&self, order: &OrderCreate) -> ClientResult<CreatedOrder> {
        let created: CreatedOrder = self.post("/orders", order).await?;
        tracing::info!(order_id = created.id, total = %created.total_amount, "Order submitted");
        Ok(created)
    }
}
