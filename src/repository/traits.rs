//! Repository Layer - Core Traits
//!
//! Defines the abstract interfaces for data access.
//! Implementations can use SQLite, in-memory, etc.

use async_trait::async_trait;
use crate::domain::{DomainResult, Entity, OrderUpdate};

/// Core repository trait for CRUD operations
///
/// Generic over any Entity type.
/// All operations are async to support various backends.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Create a new entity
    async fn create(&self, entity: &T) -> DomainResult<T>;

    /// Find entity by ID
    async fn find_by_id(&self, id: T::Id) -> DomainResult<Option<T>>;

    /// List all active entities
    async fn list(&self) -> DomainResult<Vec<T>>;

    /// Update an existing entity
    async fn update(&self, entity: &T) -> DomainResult<T>;

    /// Delete entity by ID
    async fn delete(&self, id: T::Id) -> DomainResult<()>;
}

/// Extension for records owned by a restaurant
#[async_trait]
pub trait TenantRepository<T: Entity>: Repository<T> {
    /// Active records of one restaurant, ordered by sort key
    async fn list_for_restaurant(&self, restaurant_id: u32) -> DomainResult<Vec<T>>;
}

/// Persistence collaborator for reorder decisions.
///
/// One call is one atomic single-record write of the sort key and,
/// for re-parent moves, the parent reference.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn apply_order_update(&self, update: &OrderUpdate) -> DomainResult<()>;
}
