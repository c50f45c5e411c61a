//! Repository Layer
//!
//! Data access abstractions and implementations.

mod traits;
mod db;
mod category_repo;
mod menu_item_repo;
mod menu_store;


pub use traits::{OrderStore, Repository, TenantRepository};
pub use db::{init_db, DbState, SharedConnection};
pub use category_repo::CategoryRepository;
pub use menu_item_repo::MenuItemRepository;
pub use menu_store::MenuStore;
