//! Domain Layer
//!
//! Contains all domain entities and core abstractions.
//! This layer has NO external dependencies (except serde for serialization).

mod entity;
mod category;
mod menu_item;
mod node;
mod sorting;
mod update;

pub use entity::{Entity, DomainError, DomainResult};
pub use category::{Category, validate_category_name, validate_description};
pub use menu_item::{DishType, MenuItem, Serviceability};
pub use node::{NodeKind, NodeRef, RecordKind};
pub use sorting::{SortField, SortingMode};
pub use update::OrderUpdate;
