use async_trait::async_trait;
use std::sync::Arc;

use shared::models::{Category, CategoryUpdate, OptionGroup, OptionGroupUpdate, Product, ProductUpdate};

use crate::{ClientError, ClientResult, HttpClient};

/// Catalog entity kinds that carry a display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CatalogKind {
    Category,
    OptionGroup,
    Product,
}

impl std::fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogKind::Category => write!(f, "category"),
            CatalogKind::OptionGroup => write!(f, "option group"),
            CatalogKind::Product => write!(f, "product"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// An entity positioned by `display_order`
pub trait Ordered {
    fn id(&self) -> i64;
    fn display_order(&self) -> i32;

    /// Entities only move among others in the same partition
    fn partition(&self) -> Option<i64> {
        None
    }
}

impl Ordered for Category {
    fn id(&self) -> i64 {
        self.id
    }
    fn display_order(&self) -> i32 {
        self.display_order
    }
}

impl Ordered for OptionGroup {
    fn id(&self) -> i64 {
        self.id
    }
    fn display_order(&self) -> i32 {
        self.display_order
    }
}

impl Ordered for Product {
    fn id(&self) -> i64 {
        self.id
    }
    fn display_order(&self) -> i32 {
        self.display_order
    }
    fn partition(&self) -> Option<i64> {
        self.category_id
    }
}

/// New display order for one entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderUpdate {
    pub id: i64,
    pub display_order: i32,
}

/// The two writes of a swap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapPlan {
    pub moved: OrderUpdate,
    pub neighbor: OrderUpdate,
}

/// Plan moving `id` one position in `direction`.
///
/// `None` when `id` is unknown, already at that end of its partition, or
/// shares its display order with the neighbor (swapping would change
/// nothing).
pub fn plan_swap<T: Ordered>(items: &[T], id: i64, direction: MoveDirection) -> Option<SwapPlan> {
    let target = items.iter().find(|item| item.id() == id)?;
    let partition = target.partition();

    let mut siblings: Vec<&T> = items
        .iter()
        .filter(|item| item.partition() == partition)
        .collect();
    siblings.sort_by_key(|item| item.display_order());

    let index = siblings.iter().position(|item| item.id() == id)?;
    let neighbor_index = match direction {
        MoveDirection::Up => index.checked_sub(1)?,
        MoveDirection::Down => index + 1,
    };
    let neighbor = siblings.get(neighbor_index)?;

    if neighbor.display_order() == target.display_order() {
        return None;
    }
    Some(SwapPlan {
        moved: OrderUpdate {
            id,
            display_order: neighbor.display_order(),
        },
        neighbor: OrderUpdate {
            id: neighbor.id(),
            display_order: target.display_order(),
        },
    })
}

/// Catalog endpoints used by reordering
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn set_display_order(&self, kind: CatalogKind, id: i64, display_order: i32) -> ClientResult<()>;
    async fn list_categories(&self) -> ClientResult<Vec<Category>>;
    async fn list_option_groups(&self) -> ClientResult<Vec<OptionGroup>>;
    async fn list_products(&self) -> ClientResult<Vec<Product>>;
}

#[async_trait]
impl CatalogApi for HttpClient {
    async fn set_display_order(&self, kind: CatalogKind, id: i64, display_order: i32) -> ClientResult<()> {
        let display_order = Some(display_order);
        match kind {
            CatalogKind::Category => {
                let update = CategoryUpdate {
                    display_order,
                    ..Default::default()
                };
                self.update_category(id, &update).await?;
            }
            CatalogKind::OptionGroup => {
                let update = OptionGroupUpdate {
                    display_order,
                    ..Default::default()
                };
                self.update_option_group(id, &update).await?;
            }
            CatalogKind::Product => {
                let update = ProductUpdate {
                    display_order,
                    ..Default::default()
                };
                self.update_product(id, &update).await?;
            }
        }
        Ok(())
    }

    async fn list_categories(&self) -> ClientResult<Vec<Category>> {
        HttpClient::list_categories(self).await
    }

    async fn list_option_groups(&self) -> ClientResult<Vec<OptionGroup>> {
        HttpClient::list_option_groups(self).await
    }

    async fn list_products(&self) -> ClientResult<Vec<Product>> {
        HttpClient::list_products(self).await
    }
}

/// Result of a move: the plan that was attempted, the writes that failed
/// and the re-fetched list
#[derive(Debug, Clone)]
pub struct ReorderOutcome<T> {
    pub plan: Option<SwapPlan>,
    /// `(id, error)` of each failed write; non-empty means the backend may
    /// hold a half-applied swap, already reflected in `items`
    pub failed: Vec<(i64, String)>,
    pub items: Vec<T>,
}

impl<T> ReorderOutcome<T> {
    pub fn is_complete(&self) -> bool {
        self.plan.is_some() && self.failed.is_empty()
    }
}

/// Moves catalog entities up and down.
///
/// Both writes of a swap run concurrently. Whatever happens, the list is
/// re-fetched afterwards; there is no compensating write.
#[derive(Clone)]
pub struct Reorderer {
    api: Arc<dyn CatalogApi>,
}

impl Reorderer {
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        Self { api }
    }

    pub async fn move_category(
        &self,
        categories: &[Category],
        id: i64,
        direction: MoveDirection,
    ) -> ClientResult<ReorderOutcome<Category>> {
        let (plan, failed) = self.swap(CatalogKind::Category, categories, id, direction).await?;
        let items = self.api.list_categories().await?;
        Ok(ReorderOutcome { plan, failed, items })
    }

    pub async fn move_option_group(
        &self,
        groups: &[OptionGroup],
        id: i64,
        direction: MoveDirection,
    ) -> ClientResult<ReorderOutcome<OptionGroup>> {
        let (plan, failed) = self.swap(CatalogKind::OptionGroup, groups, id, direction).await?;
        let items = self.api.list_option_groups().await?;
        Ok(ReorderOutcome { plan, failed, items })
    }

    /// Products only move within their category
    pub async fn move_product(
        &self,
        products: &[Product],
        id: i64,
        direction: MoveDirection,
    ) -> ClientResult<ReorderOutcome<Product>> {
        let (plan, failed) = self.swap(CatalogKind::Product, products, id, direction).await?;
        let items = self.api.list_products().await?;
        Ok(ReorderOutcome { plan, failed, items })
    }

    async fn swap<T: Ordered>(
        &self,
        kind: CatalogKind,
        items: &[T],
        id: i64,
        direction: MoveDirection,
    ) -> ClientResult<(Option<SwapPlan>, Vec<(i64, String)>)> {
        let Some(plan) = plan_swap(items, id, direction) else {
            tracing::debug!(kind = %kind, id, ?direction, "Nothing to swap");
            return Ok((None, Vec::new()));
        };

        let (moved, neighbor) = futures::join!(
            self.api
                .set_display_order(kind, plan.moved.id, plan.moved.display_order),
            self.api
                .set_display_order(kind, plan.neighbor.id, plan.neighbor.display_order),
        );

        let mut failed = Vec::new();
        for (update, result) in [(plan.moved, moved), (plan.neighbor, neighbor)] {
            match result {
                Ok(()) => {}
                Err(ClientError::Unauthorized) => return Err(ClientError::Unauthorized),
                Err(e) => {
                    tracing::warn!(kind = %kind, id = update.id, "Display order update failed: {e}");
                    failed.push((update.id, e.to_string()));
                }
            }
        }
        if failed.is_empty() {
            tracing::info!(kind = %kind, id, other = plan.neighbor.id, "Swapped display order");
        }
        Ok((Some(plan), failed))
    }
}

impl std::fmt::Debug for Reorderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reorderer").finish_non_exhaustive()
    }
}
