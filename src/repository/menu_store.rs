//! Menu Store
//!
//! Both record repositories behind one handle: snapshot reads for the
//! reorder engine and the single-record write it issues.

use async_trait::async_trait;

use crate::domain::{Category, DomainResult, MenuItem, OrderUpdate, RecordKind};
use crate::reorder::OrderKeyAllocator;
use super::category_repo::CategoryRepository;
use super::db::SharedConnection;
use super::menu_item_repo::MenuItemRepository;
use super::traits::{OrderStore, TenantRepository};

pub struct MenuStore {
    pub categories: CategoryRepository,
    pub items: MenuItemRepository,
}

impl MenuStore {
    pub fn new(conn: SharedConnection, allocator: OrderKeyAllocator) -> Self {
        Self {
            categories: CategoryRepository::new(conn.clone()).with_allocator(allocator),
            items: MenuItemRepository::new(conn).with_allocator(allocator),
        }
    }

    /// Everything one restaurant's menu tree is built from
    pub async fn snapshot(&self, restaurant_id: u32) -> DomainResult<(Vec<Category>, Vec<MenuItem>)> {
        let categories = self.categories.list_for_restaurant(restaurant_id).await?;
        let items = self.items.list_for_restaurant(restaurant_id).await?;
        Ok((categories, items))
    }
}

#[async_trait]
impl OrderStore for MenuStore {
    async fn apply_order_update(&self, update: &OrderUpdate) -> DomainResult<()> {
        match update.record {
            RecordKind::Category => self.categories.apply_order(update).await,
            RecordKind::MenuItem => self.items.apply_order(update).await,
        }
    }
}
