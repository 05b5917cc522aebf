use chrono::{DateTime, Duration, Utc};
use shared::models::{OrderDetail, OrderStatus};

/// Tickets waiting longer than this are flagged late
pub const LATE_AFTER_MINUTES: i64 = 15;

/// Active kitchen tickets, oldest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveOrderQueue {
    orders: Vec<OrderDetail>,
}

impl ActiveOrderQueue {
    /// Keep only kitchen-active orders, sorted by creation time (FIFO)
    pub fn from_orders(orders: impl IntoIterator<Item = OrderDetail>) -> Self {
        let mut orders: Vec<OrderDetail> = orders
            .into_iter()
            .filter(|o| o.status.is_kitchen_active())
            .collect();
        let mut queue = Self { orders };
        queue.sort();
        queue
    }

    fn sort(&mut self) {
        self.orders
            .sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    }

    pub fn orders(&self) -> &[OrderDetail] {
        &self.orders
    }

    pub fn get(&self, order_id: i64) -> Option<&OrderDetail> {
        self.orders.iter().find(|o| o.id == order_id)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Apply a status locally. A status that leaves the board removes the
    /// ticket. Returns false if the order is not on the board.
    pub fn set_status(&mut self, order_id: i64, status: OrderStatus) -> bool {
        let Some(index) = self.orders.iter().position(|o| o.id == order_id) else {
            return false;
        };
        if status.is_kitchen_active() {
            self.orders[index].status = status;
        } else {
            self.orders.remove(index);
        }
        true
    }

    /// Put a ticket back as it was before a local change
    pub fn restore(&mut self, order: OrderDetail) {
        match self.orders.iter_mut().find(|o| o.id == order.id) {
            Some(slot) => *slot = order,
            None => {
                self.orders.push(order);
                self.sort();
            }
        }
    }

    /// Whole minutes since the order was placed
    pub fn elapsed_minutes(order: &OrderDetail, now: DateTime<Utc>) -> i64 {
        (now - order.created_at).num_minutes().max(0)
    }

    /// Tickets older than [`LATE_AFTER_MINUTES`]
    pub fn late(&self, now: DateTime<Utc>) -> impl Iterator<Item = &OrderDetail> {
        let limit = Duration::minutes(LATE_AFTER_MINUTES);
        self.orders
            .iter()
            .filter(move |o| now - o.created_at > limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn order(id: i64, status: OrderStatus, minute: u32) -> OrderDetail {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "customer_name": format!("Khách {id}"),
            "total_amount": 50000,
            "status": status.code(),
            "created_at": Utc.with_ymd_and_hms(2026, 3, 1, 10, minute, 0).unwrap().to_rfc3339(),
        }))
        .unwrap()
    }

    #[test]
    fn test_filters_and_sorts_fifo() {
        let queue = ActiveOrderQueue::from_orders(vec![
            order(3, OrderStatus::Preparing, 30),
            order(1, OrderStatus::Completed, 0),
            order(2, OrderStatus::New, 10),
            order(4, OrderStatus::Cancelled, 5),
            order(5, OrderStatus::Confirmed, 20),
        ]);
        let ids: Vec<i64> = queue.orders().iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![2, 5, 3]);
        assert_eq!(queue.get(2).unwrap().total_amount, Decimal::from(50_000));
    }

    #[test]
    fn test_set_status() {
        let mut queue = ActiveOrderQueue::from_orders(vec![
            order(1, OrderStatus::New, 0),
            order(2, OrderStatus::Preparing, 5),
        ]);
        assert!(queue.set_status(1, OrderStatus::Confirmed));
        assert_eq!(queue.get(1).unwrap().status, OrderStatus::Confirmed);

        assert!(queue.set_status(2, OrderStatus::Completed));
        assert!(queue.get(2).is_none());
        assert!(!queue.set_status(9, OrderStatus::Confirmed));

        queue.restore(order(2, OrderStatus::Preparing, 5));
        let ids: Vec<i64> = queue.orders().iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_late_tickets() {
        let queue = ActiveOrderQueue::from_orders(vec![
            order(1, OrderStatus::New, 0),
            order(2, OrderStatus::New, 40),
        ]);
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 10, 45, 0).unwrap();
        let late: Vec<i64> = queue.late(now).map(|o| o.id).collect();
        assert_eq!(late, vec![1]);
        assert_eq!(ActiveOrderQueue::elapsed_minutes(queue.get(2).unwrap(), now), 5);
    }
}
