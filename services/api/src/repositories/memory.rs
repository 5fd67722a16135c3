//! In-memory product store for tests

use async_trait::async_trait;
use chrono::Utc;
use common::error::DatabaseResult;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::ProductStore;
use crate::models::{NewProduct, Product, ProductFilter, ProductUpdate, SortOrder};

#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<Vec<Product>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for InMemoryProductRepository {
    async fn list(&self, filter: &ProductFilter) -> DatabaseResult<Vec<Product>> {
        let mut products: Vec<Product> = self
            .products
            .read()
            .await
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();

        match filter.sort {
            SortOrder::PriceLow => products.sort_by(|a, b| a.price.total_cmp(&b.price)),
            SortOrder::PriceHigh => products.sort_by(|a, b| b.price.total_cmp(&a.price)),
            SortOrder::Newest => products.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }

        Ok(products)
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, product: &NewProduct) -> DatabaseResult<Product> {
        let now = Utc::now();
        let created = Product {
            id: Uuid::new_v4(),
            name: product.name.clone(),
            price: product.price,
            category: product.category,
            image: product.image.clone(),
            description: product.description.clone(),
            stock: product.stock,
            created_at: now,
            updated_at: now,
        };
        self.products.write().await.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: Uuid, changes: &ProductUpdate) -> DatabaseResult<Option<Product>> {
        let mut products = self.products.write().await;

        Ok(products.iter_mut().find(|p| p.id == id).map(|product| {
            changes.apply_to(product);
            product.updated_at = Utc::now();
            product.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> DatabaseResult<Option<Product>> {
        let mut products = self.products.write().await;
        let position = products.iter().position(|p| p.id == id);
        Ok(position.map(|index| products.remove(index)))
    }

    async fn health_check(&self) -> DatabaseResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, PriceRange};

    fn new_product(name: &str, price: f64, category: Category) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            price,
            category,
            image: None,
            description: None,
            stock: 1,
        }
    }

    #[tokio::test]
    async fn list_filters_and_sorts() {
        let store = InMemoryProductRepository::new();
        store
            .create(&new_product("Cheap top", 20.0, Category::Tops))
            .await
            .unwrap();
        store
            .create(&new_product("Gown", 300.0, Category::Dresses))
            .await
            .unwrap();
        store
            .create(&new_product("Tee", 60.0, Category::Tops))
            .await
            .unwrap();

        let filter = ProductFilter {
            category: Some(Category::Tops),
            price_range: None,
            sort: SortOrder::PriceHigh,
        };
        let names: Vec<_> = store
            .list(&filter)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, ["Tee", "Cheap top"]);

        let filter = ProductFilter {
            category: None,
            price_range: Some(PriceRange {
                min: Some(50.0),
                max: None,
            }),
            sort: SortOrder::PriceLow,
        };
        let prices: Vec<_> = store
            .list(&filter)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.price)
            .collect();
        assert_eq!(prices, [60.0, 300.0]);
    }

    #[tokio::test]
    async fn update_touches_only_given_fields() {
        let store = InMemoryProductRepository::new();
        let product = store
            .create(&new_product("Heels", 80.0, Category::Shoes))
            .await
            .unwrap();

        let changes = ProductUpdate {
            stock: Some(9),
            ..Default::default()
        };
        let updated = store.update(product.id, &changes).await.unwrap().unwrap();
        assert_eq!(updated.stock, 9);
        assert_eq!(updated.name, "Heels");
        assert_eq!(updated.price, 80.0);
        assert!(updated.updated_at >= product.updated_at);

        assert!(
            store
                .update(Uuid::new_v4(), &changes)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn delete_returns_the_removed_product() {
        let store = InMemoryProductRepository::new();
        let product = store
            .create(&new_product("Lipstick", 15.0, Category::Beauty))
            .await
            .unwrap();

        assert_eq!(store.delete(product.id).await.unwrap(), Some(product.clone()));
        assert!(store.delete(product.id).await.unwrap().is_none());
        assert!(store.find_by_id(product.id).await.unwrap().is_none());
    }
}
