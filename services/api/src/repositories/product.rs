//! Product repository for database operations

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use super::ProductStore;
use crate::models::{NewProduct, Product, ProductFilter, ProductUpdate, SortOrder};

const PRODUCT_COLUMNS: &str =
    "id, name, price, category, image, description, stock, created_at, updated_at";

/// PostgreSQL-backed product repository
#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    /// Create a new product repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn product_from_row(row: &PgRow) -> DatabaseResult<Product> {
    let category: String = row.try_get("category").map_err(DatabaseError::Query)?;

    Ok(Product {
        id: row.try_get("id").map_err(DatabaseError::Query)?,
        name: row.try_get("name").map_err(DatabaseError::Query)?,
        price: row.try_get("price").map_err(DatabaseError::Query)?,
        category: category.parse().map_err(DatabaseError::Corrupt)?,
        image: row.try_get("image").map_err(DatabaseError::Query)?,
        description: row.try_get("description").map_err(DatabaseError::Query)?,
        stock: row.try_get("stock").map_err(DatabaseError::Query)?,
        created_at: row.try_get("created_at").map_err(DatabaseError::Query)?,
        updated_at: row.try_get("updated_at").map_err(DatabaseError::Query)?,
    })
}

#[async_trait]
impl ProductStore for ProductRepository {
    async fn list(&self, filter: &ProductFilter) -> DatabaseResult<Vec<Product>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE TRUE"));

        if let Some(category) = filter.category {
            builder.push(" AND category = ").push_bind(category.as_str());
        }

        if let Some(range) = filter.price_range {
            if let Some(min) = range.min {
                builder.push(" AND price >= ").push_bind(min);
            }
            if let Some(max) = range.max {
                builder.push(" AND price <= ").push_bind(max);
            }
        }

        builder.push(match filter.sort {
            SortOrder::PriceLow => " ORDER BY price ASC, created_at DESC",
            SortOrder::PriceHigh => " ORDER BY price DESC, created_at DESC",
            SortOrder::Newest => " ORDER BY created_at DESC",
        });

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        rows.iter().map(product_from_row).collect()
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        row.as_ref().map(product_from_row).transpose()
    }

    async fn create(&self, product: &NewProduct) -> DatabaseResult<Product> {
        let row = sqlx::query(&format!(
            "INSERT INTO products (name, price, category, image, description, stock) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&product.name)
        .bind(product.price)
        .bind(product.category.as_str())
        .bind(&product.image)
        .bind(&product.description)
        .bind(product.stock)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        let created = product_from_row(&row)?;
        info!("Created product {} ({})", created.id, created.name);
        Ok(created)
    }

    async fn update(&self, id: Uuid, changes: &ProductUpdate) -> DatabaseResult<Option<Product>> {
        let row = sqlx::query(&format!(
            "UPDATE products SET \
                 name = COALESCE($2, name), \
                 price = COALESCE($3, price), \
                 category = COALESCE($4, category), \
                 image = COALESCE($5, image), \
                 description = COALESCE($6, description), \
                 stock = COALESCE($7, stock), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(changes.price)
        .bind(changes.category.map(|c| c.as_str()))
        .bind(&changes.image)
        .bind(&changes.description)
        .bind(changes.stock)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        row.as_ref().map(product_from_row).transpose()
    }

    async fn delete(&self, id: Uuid) -> DatabaseResult<Option<Product>> {
        let row = sqlx::query(&format!(
            "DELETE FROM products WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        row.as_ref().map(product_from_row).transpose()
    }

    async fn health_check(&self) -> DatabaseResult<bool> {
        common::database::health_check(&self.pool).await
    }
}
