use crate::{ClientResult, HttpClient};
use shared::models::{OrderDetail, OrderStatus};

impl HttpClient {
    /// Most recent orders (admin)
    pub async fn list_orders(&self, limit: u32) -> ClientResult<Vec<OrderDetail>> {
        self.get(&format!("/admin/orders/?skip=0&limit={limit}")).await
    }

    /// Move an order to `status` (admin)
    pub async fn update_order_status(&self, order_id: i64, status: OrderStatus) -> ClientResult<()> {
        self.put_empty(&format!(
            "/admin/orders/{order_id}/status?status={}",
            status.code()
        ))
        .await?;
        tracing::info!(order_id, status = %status, "Order status updated");
        Ok(())
    }
}
