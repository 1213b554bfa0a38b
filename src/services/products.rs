use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::entities::{order_item, product};
use crate::errors::ServiceError;
use crate::services::onec::RemoteProduct;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255, message = "must be 1-255 characters"))]
    pub name: String,
    #[serde(default)]
    pub article: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub stock_quantity: i32,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 255, message = "must be 1-255 characters"))]
    pub name: Option<String>,
    pub article: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock_quantity: Option<i32>,
}

/// Outcome of a single catalog-sync upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

#[derive(Debug, Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, req), fields(name = %req.name))]
    pub async fn create_product(
        &self,
        req: CreateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        req.validate()?;
        ensure_non_negative_price(&req.price)?;
        ensure_non_negative_stock(req.stock_quantity)?;

        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            onec_id: Set(None),
            article: Set(normalize_opt(req.article)),
            name: Set(req.name),
            description: Set(req.description),
            price: Set(req.price.round_dp(2)),
            stock_quantity: Set(req.stock_quantity),
            ..Default::default()
        };

        let saved = model.insert(&*self.db).await?;
        info!(product_id = %saved.id, "Created product");
        Ok(saved)
    }

    pub async fn get_product(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))
    }

    pub async fn list_products(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let paginator = product::Entity::find()
            .order_by_asc(product::Column::Name)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((rows, total))
    }

    #[instrument(skip(self, req))]
    pub async fn update_product(
        &self,
        id: Uuid,
        req: UpdateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        req.validate()?;
        if let Some(price) = &req.price {
            ensure_non_negative_price(price)?;
        }
        if let Some(stock) = req.stock_quantity {
            ensure_non_negative_stock(stock)?;
        }

        let existing = self.get_product(id).await?;
        let mut active: product::ActiveModel = existing.into();

        if let Some(name) = req.name {
            active.name = Set(name);
        }
        if let Some(article) = req.article {
            active.article = Set(normalize_opt(Some(article)));
        }
        if let Some(description) = req.description {
            active.description = Set(Some(description));
        }
        if let Some(price) = req.price {
            active.price = Set(price.round_dp(2));
        }
        if let Some(stock) = req.stock_quantity {
            active.stock_quantity = Set(stock);
        }

        let updated = active.update(&*self.db).await?;
        info!(product_id = %updated.id, "Updated product");
        Ok(updated)
    }

    /// Deletes a product unless an order still references it. The FK would
    /// restrict the delete anyway; the pre-check turns that into a clean 409.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_product(id).await?;

        let references = order_item::Entity::find()
            .filter(order_item::Column::ProductId.eq(id))
            .count(&*self.db)
            .await?;
        if references > 0 {
            return Err(ServiceError::Conflict(format!(
                "Product {} is referenced by {} order item(s) and cannot be deleted",
                id, references
            )));
        }

        product::Entity::delete_by_id(existing.id)
            .exec(&*self.db)
            .await?;
        info!(product_id = %id, "Deleted product");
        Ok(())
    }

    /// Creates or updates a local product from a 1C catalog row.
    ///
    /// Matching prefers the 1C id; a product imported before 1C ids were
    /// tracked may only carry the article, so that is the fallback key.
    pub async fn upsert_from_remote(
        &self,
        remote: &RemoteProduct,
    ) -> Result<UpsertOutcome, ServiceError> {
        let price = decimal_from_remote_price(remote.price)?;
        let stock = i32::try_from(remote.stock).map_err(|_| {
            ServiceError::ValidationError(format!(
                "stock {} is out of range for product '{}'",
                remote.stock, remote.id
            ))
        })?;

        let by_onec_id = product::Entity::find()
            .filter(product::Column::OnecId.eq(remote.id.clone()))
            .one(&*self.db)
            .await?;

        let existing = match by_onec_id {
            Some(found) => Some(found),
            None => {
                product::Entity::find()
                    .filter(product::Column::Article.eq(remote.article.clone()))
                    .one(&*self.db)
                    .await?
            }
        };

        match existing {
            Some(found) => {
                let mut active: product::ActiveModel = found.into();
                active.onec_id = Set(Some(remote.id.clone()));
                active.article = Set(Some(remote.article.clone()));
                active.name = Set(remote.name.clone());
                active.description = Set(remote.description.clone());
                active.price = Set(price);
                active.stock_quantity = Set(stock);
                active.update(&*self.db).await?;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                let model = product::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    onec_id: Set(Some(remote.id.clone())),
                    article: Set(Some(remote.article.clone())),
                    name: Set(remote.name.clone()),
                    description: Set(remote.description.clone()),
                    price: Set(price),
                    stock_quantity: Set(stock),
                    ..Default::default()
                };
                model.insert(&*self.db).await?;
                Ok(UpsertOutcome::Created)
            }
        }
    }
}

/// 1C publishes prices as JSON numbers; convert to an exact decimal at the
/// boundary and round to currency precision.
fn decimal_from_remote_price(price: f64) -> Result<Decimal, ServiceError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ServiceError::ValidationError(format!(
            "price {} is not a valid non-negative number",
            price
        )));
    }
    Decimal::try_from(price)
        .map(|d| d.round_dp(2))
        .map_err(|e| ServiceError::ValidationError(format!("price {} does not convert: {}", price, e)))
}

fn ensure_non_negative_price(price: &Decimal) -> Result<(), ServiceError> {
    if price.is_sign_negative() {
        return Err(ServiceError::ValidationError(
            "price must not be negative".to_string(),
        ));
    }
    Ok(())
}

fn ensure_non_negative_stock(stock: i32) -> Result<(), ServiceError> {
    if stock < 0 {
        return Err(ServiceError::ValidationError(
            "stock_quantity must not be negative".to_string(),
        ));
    }
    Ok(())
}

fn normalize_opt(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}
