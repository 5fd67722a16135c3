//! Product model and catalog query parameters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// The fixed set of catalog categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Dresses,
    Tops,
    Accessories,
    Shoes,
    Beauty,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Dresses,
        Category::Tops,
        Category::Accessories,
        Category::Shoes,
        Category::Beauty,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Dresses => "dresses",
            Category::Tops => "tops",
            Category::Accessories => "accessories",
            Category::Shoes => "shoes",
            Category::Beauty => "beauty",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| format!("Invalid category '{s}'"))
    }
}

/// Catalog product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub category: Category,
    /// Public path of the stored image, `/uploads/<file>`
    pub image: Option<String>,
    pub description: Option<String>,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product creation payload
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    pub category: Category,
    pub image: Option<String>,
    pub description: Option<String>,
    pub stock: i32,
}

/// Partial product update; `None` leaves the stored value unchanged
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub category: Option<Category>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub stock: Option<i32>,
}

impl ProductUpdate {
    /// Apply the update to a product in place
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(image) = &self.image {
            product.image = Some(image.clone());
        }
        if let Some(description) = &self.description {
            product.description = Some(description.clone());
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
    }
}

/// Listing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Cheapest first
    PriceLow,
    /// Most expensive first
    PriceHigh,
    /// Most recently created first
    #[default]
    Newest,
}

impl SortOrder {
    /// Unknown values fall back to [`SortOrder::Newest`]
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("price-low") => SortOrder::PriceLow,
            Some("price-high") => SortOrder::PriceHigh,
            _ => SortOrder::Newest,
        }
    }
}

/// Inclusive price bounds parsed from `"min-max"`; either side may be open
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PriceRange {
    pub fn contains(&self, price: f64) -> bool {
        self.min.is_none_or(|min| price >= min) && self.max.is_none_or(|max| price <= max)
    }
}

fn parse_bound(bound: &str) -> Result<Option<f64>, String> {
    let bound = bound.trim();
    if bound.is_empty() {
        return Ok(None);
    }

    match bound.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(format!("Invalid price range bound '{bound}'")),
    }
}

impl FromStr for PriceRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (min, max) = s.split_once('-').unwrap_or((s, ""));

        Ok(PriceRange {
            min: parse_bound(min)?,
            max: parse_bound(max)?,
        })
    }
}

/// Raw query string of `GET /api/products`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub category: Option<String>,
    pub price_range: Option<String>,
    pub sort: Option<String>,
}

/// Validated listing filter handed to the product store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub category: Option<Category>,
    pub price_range: Option<PriceRange>,
    pub sort: SortOrder,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        self.category.is_none_or(|category| product.category == category)
            && self
                .price_range
                .is_none_or(|range| range.contains(product.price))
    }
}

impl TryFrom<ProductQuery> for ProductFilter {
    type Error = String;

    fn try_from(query: ProductQuery) -> Result<Self, Self::Error> {
        let category = query
            .category
            .as_deref()
            .filter(|c| !c.is_empty())
            .map(str::parse)
            .transpose()?;

        let price_range = query
            .price_range
            .as_deref()
            .filter(|r| !r.is_empty())
            .map(str::parse)
            .transpose()?;

        Ok(ProductFilter {
            category,
            price_range,
            sort: SortOrder::from_param(query.sort.as_deref()),
        })
    }
}
