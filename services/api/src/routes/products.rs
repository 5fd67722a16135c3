//! Catalog routes, mounted under `/api/products`
//!
//! Reads are public. Create, update and delete sit behind the admin gate and
//! take `multipart/form-data` with an optional `image` file.

use auth::middleware::require_admin;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{post, put},
};
use axum_extra::extract::WithRejection;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    models::{Category, NewProduct, Product, ProductFilter, ProductQuery, ProductUpdate},
    storage::{ImageUpload, MAX_IMAGE_BYTES},
};

const PRODUCT_NOT_FOUND: &str = "Product not found";

/// Room for the text fields on top of a maximum-size image
const UPLOAD_BODY_LIMIT: usize = MAX_IMAGE_BYTES + 1024 * 1024;

pub fn router(state: &AppState) -> Router<AppState> {
    let admin_only = || middleware::from_fn_with_state(state.clone(), require_admin);

    Router::new()
        .route(
            "/",
            post(create_product)
                .route_layer(admin_only())
                .get(list_products),
        )
        .route(
            "/:id",
            put(update_product)
                .delete(delete_product)
                .route_layer(admin_only())
                .get(get_product),
        )
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}

/// Malformed ids cannot name a product, so they are simply not found
fn parse_id(id: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| ApiError::NotFound(PRODUCT_NOT_FOUND))
}

/// Raw fields of a product form
#[derive(Debug, Default)]
struct ProductForm {
    name: Option<String>,
    price: Option<String>,
    category: Option<String>,
    description: Option<String>,
    stock: Option<String>,
    image: Option<ImageUpload>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_price(raw: &str) -> Result<f64, String> {
    match raw.parse::<f64>() {
        Ok(price) if price.is_finite() && price >= 0.0 => Ok(price),
        _ => Err("Price must be a non-negative number".to_string()),
    }
}

fn parse_category(raw: &str) -> Result<Category, String> {
    raw.parse()
}

fn parse_stock(raw: &str) -> Result<i32, String> {
    match raw.parse::<i32>() {
        Ok(stock) if stock >= 0 => Ok(stock),
        _ => Err("Stock must be a non-negative integer".to_string()),
    }
}

impl ProductForm {
    async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = ProductForm::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match name.as_str() {
                "image" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let content_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await?;

                    // Browsers submit an empty part when no file was picked.
                    if file_name.is_empty() && data.is_empty() {
                        continue;
                    }
                    if form.image.is_some() {
                        return Err(ApiError::BadRequest(
                            "Only one image may be uploaded".to_string(),
                        ));
                    }
                    form.image = Some(ImageUpload {
                        file_name,
                        content_type,
                        data: data.to_vec(),
                    });
                }
                "name" => form.name = Some(field.text().await?),
                "price" => form.price = Some(field.text().await?),
                "category" => form.category = Some(field.text().await?),
                "description" => form.description = Some(field.text().await?),
                "stock" => form.stock = Some(field.text().await?),
                other => debug!("Ignoring form field {}", other),
            }
        }

        Ok(form)
    }

    fn into_new_product(self) -> Result<(NewProduct, Option<ImageUpload>), String> {
        let name = non_empty(self.name).ok_or("Name is required")?;
        let price = parse_price(&non_empty(self.price).ok_or("Price is required")?)?;
        let category = parse_category(&non_empty(self.category).ok_or("Category is required")?)?;
        let stock = non_empty(self.stock)
            .map(|raw| parse_stock(&raw))
            .transpose()?
            .unwrap_or(0);

        let product = NewProduct {
            name,
            price,
            category,
            image: None,
            description: non_empty(self.description),
            stock,
        };
        Ok((product, self.image))
    }

    /// Blank fields are left unchanged
    fn into_update(self) -> Result<(ProductUpdate, Option<ImageUpload>), String> {
        let update = ProductUpdate {
            name: non_empty(self.name),
            price: non_empty(self.price)
                .map(|raw| parse_price(&raw))
                .transpose()?,
            category: non_empty(self.category)
                .map(|raw| parse_category(&raw))
                .transpose()?,
            image: None,
            description: non_empty(self.description),
            stock: non_empty(self.stock)
                .map(|raw| parse_stock(&raw))
                .transpose()?,
        };
        Ok((update, self.image))
    }
}

/// List products with optional category, price range and sort
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    let filter = ProductFilter::try_from(query).map_err(ApiError::BadRequest)?;
    let products = state.products.list(&filter).await?;

    Ok(Json(products))
}

/// Get a product by ID
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    let id = parse_id(&id)?;
    let product = state
        .products
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound(PRODUCT_NOT_FOUND))?;

    Ok(Json(product))
}

/// Create a product (admin only)
pub async fn create_product(
    State(state): State<AppState>,
    WithRejection(multipart, _): WithRejection<Multipart, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let (mut new_product, upload) = ProductForm::read(multipart)
        .await?
        .into_new_product()
        .map_err(ApiError::BadRequest)?;

    if let Some(upload) = &upload {
        new_product.image = Some(state.storage.store(upload).await?);
    }

    let product = match state.products.create(&new_product).await {
        Ok(product) => product,
        Err(e) => {
            if let Some(image) = &new_product.image {
                state.storage.remove(image).await;
            }
            return Err(e.into());
        }
    };

    info!("Product {} created", product.id);
    Ok((StatusCode::CREATED, Json(product)))
}

/// Update a product (admin only); a new image replaces the stored one
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    WithRejection(multipart, _): WithRejection<Multipart, ApiError>,
) -> ApiResult<Json<Product>> {
    let id = parse_id(&id)?;
    let (mut changes, upload) = ProductForm::read(multipart)
        .await?
        .into_update()
        .map_err(ApiError::BadRequest)?;

    let existing = state
        .products
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound(PRODUCT_NOT_FOUND))?;

    if let Some(upload) = &upload {
        changes.image = Some(state.storage.store(upload).await?);
    }

    let updated = match state.products.update(id, &changes).await {
        Ok(Some(product)) => product,
        outcome => {
            if let Some(image) = &changes.image {
                state.storage.remove(image).await;
            }
            return Err(match outcome {
                Err(e) => e.into(),
                Ok(_) => ApiError::NotFound(PRODUCT_NOT_FOUND),
            });
        }
    };

    if let (Some(new_image), Some(old_image)) = (&changes.image, &existing.image) {
        if new_image != old_image {
            state.storage.remove(old_image).await;
        }
    }

    info!("Product {} updated", id);
    Ok(Json(updated))
}

/// Delete a product and its image (admin only)
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let product = state
        .products
        .delete(id)
        .await?
        .ok_or(ApiError::NotFound(PRODUCT_NOT_FOUND))?;

    if let Some(image) = &product.image {
        state.storage.remove(image).await;
    }

    info!("Product {} deleted", id);
    Ok(Json(json!({ "message": "Product deleted successfully" })))
}
