//! Catalog models

pub mod product;

pub use product::{
    Category, NewProduct, PriceRange, Product, ProductFilter, ProductQuery, ProductUpdate,
    SortOrder,
};
