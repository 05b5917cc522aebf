//! Display-order swaps against a scripted catalog backend

use async_trait::async_trait;
use menu_client::admin::{CatalogApi, CatalogKind, MoveDirection, Reorderer};
use menu_client::{ClientError, ClientResult};
use parking_lot::Mutex;
use shared::models::{Category, OptionGroup, Product};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Default)]
struct FakeCatalog {
    categories: Mutex<Vec<Category>>,
    products: Mutex<Vec<Product>>,
    writes: Mutex<Vec<(CatalogKind, i64, i32)>>,
    failing: Mutex<HashSet<i64>>,
    expired: Mutex<bool>,
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn set_display_order(&self, kind: CatalogKind, id: i64, display_order: i32) -> ClientResult<()> {
        self.writes.lock().push((kind, id, display_order));
        if *self.expired.lock() {
            return Err(ClientError::Unauthorized);
        }
        if self.failing.lock().contains(&id) {
            return Err(ClientError::Internal("500: write failed".to_string()));
        }
        match kind {
            CatalogKind::Category => {
                if let Some(c) = self.categories.lock().iter_mut().find(|c| c.id == id) {
                    c.display_order = display_order;
                }
            }
            CatalogKind::Product => {
                if let Some(p) = self.products.lock().iter_mut().find(|p| p.id == id) {
                    p.display_order = display_order;
                }
            }
            CatalogKind::OptionGroup => {}
        }
        Ok(())
    }

    async fn list_categories(&self) -> ClientResult<Vec<Category>> {
        let mut categories = self.categories.lock().clone();
        categories.sort_by_key(|c| c.display_order);
        Ok(categories)
    }

    async fn list_option_groups(&self) -> ClientResult<Vec<OptionGroup>> {
        Ok(Vec::new())
    }

    async fn list_products(&self) -> ClientResult<Vec<Product>> {
        Ok(self.products.lock().clone())
    }
}

fn category(id: i64, display_order: i32) -> Category {
    Category {
        id,
        name: format!("Danh mục {id}"),
        display_order,
    }
}

fn product(id: i64, category_id: i64, display_order: i32) -> Product {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "name": format!("Món {id}"),
        "base_price": 30000,
        "display_order": display_order,
        "category_id": category_id,
    }))
    .unwrap()
}

fn catalog() -> Arc<FakeCatalog> {
    let api = FakeCatalog::default();
    *api.categories.lock() = vec![category(1, 1), category(2, 2), category(3, 3)];
    Arc::new(api)
}

fn order_of(items: &[Category]) -> Vec<i64> {
    items.iter().map(|c| c.id).collect()
}

#[tokio::test]
async fn test_swap_and_refetch() {
    let api = catalog();
    let reorderer = Reorderer::new(api.clone());
    let current = api.list_categories().await.unwrap();

    let outcome = reorderer
        .move_category(&current, 3, MoveDirection::Up)
        .await
        .unwrap();

    assert!(outcome.is_complete());
    assert_eq!(order_of(&outcome.items), vec![1, 3, 2]);
    let mut writes = api.writes.lock().clone();
    writes.sort();
    assert_eq!(
        writes,
        vec![(CatalogKind::Category, 2, 3), (CatalogKind::Category, 3, 2)]
    );
}

#[tokio::test]
async fn test_move_at_end_is_noop_but_reloads() {
    let api = catalog();
    let reorderer = Reorderer::new(api.clone());
    let current = api.list_categories().await.unwrap();

    let outcome = reorderer
        .move_category(&current, 1, MoveDirection::Up)
        .await
        .unwrap();

    assert!(outcome.plan.is_none());
    assert!(!outcome.is_complete());
    assert!(api.writes.lock().is_empty());
    assert_eq!(order_of(&outcome.items), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_partial_failure_is_reported_and_reloaded() {
    let api = catalog();
    api.failing.lock().insert(2);
    let reorderer = Reorderer::new(api.clone());
    let current = api.list_categories().await.unwrap();

    let outcome = reorderer
        .move_category(&current, 1, MoveDirection::Down)
        .await
        .unwrap();

    // both writes were attempted, one landed
    assert_eq!(api.writes.lock().len(), 2);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].0, 2);
    // the half-applied state is what the list now shows
    let orders: Vec<(i64, i32)> = outcome.items.iter().map(|c| (c.id, c.display_order)).collect();
    assert!(orders.contains(&(1, 2)));
    assert!(orders.contains(&(2, 2)));
}

#[tokio::test]
async fn test_unauthorized_propagates() {
    let api = catalog();
    *api.expired.lock() = true;
    let reorderer = Reorderer::new(api.clone());
    let current = vec![category(1, 1), category(2, 2)];

    let result = reorderer.move_category(&current, 2, MoveDirection::Up).await;
    assert!(matches!(result, Err(ClientError::Unauthorized)));
}

#[tokio::test]
async fn test_products_move_within_category() {
    let api = catalog();
    *api.products.lock() = vec![
        product(10, 1, 1),
        product(11, 2, 2),
        product(12, 1, 3),
    ];
    let reorderer = Reorderer::new(api.clone());
    let current = api.list_products().await.unwrap();

    let outcome = reorderer
        .move_product(&current, 12, MoveDirection::Up)
        .await
        .unwrap();
    assert!(outcome.is_complete());
    let plan = outcome.plan.unwrap();
    assert_eq!(plan.neighbor.id, 10);

    let moved = outcome.items.iter().find(|p| p.id == 12).unwrap();
    assert_eq!(moved.display_order, 1);
    let other_category = outcome.items.iter().find(|p| p.id == 11).unwrap();
    assert_eq!(other_category.display_order, 2);
}
