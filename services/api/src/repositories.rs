//! Catalog store
//!
//! Handlers talk to products through [`ProductStore`] so the PostgreSQL
//! implementation can be swapped for the in-memory one in tests.

use async_trait::async_trait;
use common::error::DatabaseResult;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{NewProduct, Product, ProductFilter, ProductUpdate};

#[cfg(test)]
pub mod memory;
pub mod product;

#[cfg(test)]
pub use memory::InMemoryProductRepository;
pub use product::ProductRepository;

/// Shared handle to a product store
pub type DynProductStore = Arc<dyn ProductStore>;

/// Persistence operations over the catalog
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Products matching the filter, in the filter's sort order
    async fn list(&self, filter: &ProductFilter) -> DatabaseResult<Vec<Product>>;

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Product>>;

    /// Insert a product; the store assigns its id and timestamps
    async fn create(&self, product: &NewProduct) -> DatabaseResult<Product>;

    /// Apply a partial update, returning the updated product if it exists
    async fn update(&self, id: Uuid, changes: &ProductUpdate) -> DatabaseResult<Option<Product>>;

    /// Remove a product, returning what was removed
    async fn delete(&self, id: Uuid) -> DatabaseResult<Option<Product>>;

    /// Whether the backing store is reachable
    async fn health_check(&self) -> DatabaseResult<bool>;
}
