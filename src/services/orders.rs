use std::sync::Arc;

use chrono::NaiveDateTime;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::order::OrderStatus;
use crate::entities::{order, order_item, product};
use crate::errors::ServiceError;
use crate::services::onec::{RemoteOrderItem, RemoteOrderPayload};

/// One requested order line. The unit price is taken from the request, not
/// from the product card, so an order keeps the price it was agreed at.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price_per_item: Decimal,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub customer_info: Option<String>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    pub items: Vec<OrderItemInput>,
}

/// Partial update. When `items` is present the existing lines are replaced
/// wholesale; the total is recomputed from the final set either way.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateOrderRequest {
    #[serde(default)]
    pub customer_info: Option<String>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub items: Option<Vec<OrderItemInput>>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

/// An order with its lines, as returned by every order-reading endpoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderDetails {
    pub id: Uuid,
    pub onec_id: Option<String>,
    pub customer_info: Option<String>,
    pub status: OrderStatus,
    pub status_display: String,
    pub total_amount: Decimal,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
    pub items: Vec<order_item::Model>,
}

impl OrderDetails {
    fn from_parts(order: order::Model, items: Vec<order_item::Model>) -> Self {
        Self {
            id: order.id,
            onec_id: order.onec_id,
            customer_info: order.customer_info,
            status: order.status,
            status_display: order.status.label().to_string(),
            total_amount: order.total_amount,
            created_at: order.created_at,
            updated_at: order.updated_at,
            items,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates an order and its lines in one transaction. `onec_id` is set
    /// when the order was already accepted by 1C before being persisted here.
    #[instrument(skip(self, req), fields(items = req.items.len()))]
    pub async fn create_order(
        &self,
        req: CreateOrderRequest,
        onec_id: Option<String>,
    ) -> Result<OrderDetails, ServiceError> {
        validate_items(&req.items)?;

        let txn = self.db.begin().await?;
        resolve_products(&txn, &req.items).await?;

        let order_id = Uuid::new_v4();
        let total = compute_total(&req.items);

        let order_model = order::ActiveModel {
            id: Set(order_id),
            onec_id: Set(onec_id),
            customer_info: Set(req.customer_info),
            status: Set(req.status.unwrap_or_default()),
            total_amount: Set(total),
            ..Default::default()
        };
        let saved_order = order_model.insert(&txn).await?;

        let mut saved_items = Vec::with_capacity(req.items.len());
        for item in &req.items {
            saved_items.push(insert_item(&txn, order_id, item).await?);
        }

        txn.commit().await?;
        info!(order_id = %order_id, total = %total, "Created order");
        Ok(OrderDetails::from_parts(saved_order, saved_items))
    }

    pub async fn get_order(&self, id: Uuid) -> Result<OrderDetails, ServiceError> {
        let order = order::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;
        let items = self.items_of(order.id).await?;
        Ok(OrderDetails::from_parts(order, items))
    }

    pub async fn list_orders(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<OrderDetails>, u64), ServiceError> {
        let paginator = order::Entity::find()
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;

        let mut out = Vec::with_capacity(orders.len());
        for order in orders {
            let items = self.items_of(order.id).await?;
            out.push(OrderDetails::from_parts(order, items));
        }
        Ok((out, total))
    }

    /// Updates an order. When lines are supplied the old set is deleted and
    /// the new set inserted; the stored total always matches the lines that
    /// exist after the call.
    #[instrument(skip(self, req))]
    pub async fn update_order(
        &self,
        id: Uuid,
        req: UpdateOrderRequest,
    ) -> Result<OrderDetails, ServiceError> {
        if let Some(items) = &req.items {
            validate_items(items)?;
        }

        let txn = self.db.begin().await?;

        let existing = order::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;

        let mut saved_items = if let Some(items) = &req.items {
            resolve_products(&txn, items).await?;

            order_item::Entity::delete_many()
                .filter(order_item::Column::OrderId.eq(id))
                .exec(&txn)
                .await?;

            let mut inserted = Vec::with_capacity(items.len());
            for item in items {
                inserted.push(insert_item(&txn, id, item).await?);
            }
            inserted
        } else {
            order_item::Entity::find()
                .filter(order_item::Column::OrderId.eq(id))
                .all(&txn)
                .await?
        };
        saved_items.sort_by_key(|i| i.product_id);

        let total: Decimal = saved_items.iter().map(|i| i.total_price).sum();

        let mut active: order::ActiveModel = existing.into();
        if let Some(customer_info) = req.customer_info {
            active.customer_info = Set(Some(customer_info));
        }
        if let Some(status) = req.status {
            active.status = Set(status);
        }
        active.total_amount = Set(total);
        let saved_order = active.update(&txn).await?;

        txn.commit().await?;
        info!(order_id = %id, total = %total, "Updated order");
        Ok(OrderDetails::from_parts(saved_order, saved_items))
    }

    pub async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<OrderDetails, ServiceError> {
        let existing = order::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;

        let mut active: order::ActiveModel = existing.into();
        active.status = Set(status);
        let saved = active.update(&*self.db).await?;
        info!(order_id = %id, status = %status, "Updated order status");

        let items = self.items_of(id).await?;
        Ok(OrderDetails::from_parts(saved, items))
    }

    /// Deletes an order; its lines go with it via the cascade.
    pub async fn delete_order(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = order::Entity::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Order {} not found", id)));
        }
        info!(order_id = %id, "Deleted order");
        Ok(())
    }

    /// Lines of one order; 404 when the order itself does not exist.
    pub async fn get_order_items(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<order_item::Model>, ServiceError> {
        let exists = order::Entity::find_by_id(order_id).one(&*self.db).await?;
        if exists.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Order {} not found",
                order_id
            )));
        }
        self.items_of(order_id).await
    }

    pub async fn get_order_item(&self, id: Uuid) -> Result<order_item::Model, ServiceError> {
        order_item::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order item {} not found", id)))
    }

    pub async fn list_order_items(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<order_item::Model>, u64), ServiceError> {
        let paginator = order_item::Entity::find().paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((rows, total))
    }

    /// Validates the request and builds the 1C submission payload without
    /// touching the orders table. Every referenced product must exist and
    /// carry a 1C identifier (its 1C id, or the article as fallback).
    pub async fn prepare_remote_payload(
        &self,
        req: &CreateOrderRequest,
    ) -> Result<RemoteOrderPayload, ServiceError> {
        validate_items(&req.items)?;
        let resolved = resolve_products(&*self.db, &req.items).await?;

        let mut items = Vec::with_capacity(resolved.len());
        for (input, prod) in &resolved {
            let product_id_1c = prod
                .onec_id
                .clone()
                .or_else(|| prod.article.clone())
                .ok_or_else(|| {
                    ServiceError::ValidationError(format!(
                        "product {} has no 1C identifier or article",
                        prod.id
                    ))
                })?;
            let price = input.price_per_item.to_f64().ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "price {} for product {} does not convert to a number",
                    input.price_per_item, prod.id
                ))
            })?;
            items.push(RemoteOrderItem {
                product_id_1c,
                quantity: i64::from(input.quantity),
                price,
            });
        }

        Ok(RemoteOrderPayload {
            customer_info: req.customer_info.clone(),
            items,
        })
    }

    async fn items_of(&self, order_id: Uuid) -> Result<Vec<order_item::Model>, ServiceError> {
        Ok(order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?)
    }
}

/// Request-level checks that need no database access.
fn validate_items(items: &[OrderItemInput]) -> Result<(), ServiceError> {
    if items.is_empty() {
        return Err(ServiceError::ValidationError(
            "order must contain at least one item".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for (idx, item) in items.iter().enumerate() {
        if item.quantity <= 0 {
            return Err(ServiceError::ValidationError(format!(
                "items[{}].quantity must be greater than zero",
                idx
            )));
        }
        if item.price_per_item.is_sign_negative() {
            return Err(ServiceError::ValidationError(format!(
                "items[{}].price_per_item must not be negative",
                idx
            )));
        }
        if !seen.insert(item.product_id) {
            return Err(ServiceError::ValidationError(format!(
                "items[{}].product_id {} appears more than once",
                idx, item.product_id
            )));
        }
    }
    Ok(())
}

/// Looks up every referenced product, failing with the index of the first
/// missing one.
async fn resolve_products<C: ConnectionTrait>(
    conn: &C,
    items: &[OrderItemInput],
) -> Result<Vec<(OrderItemInput, product::Model)>, ServiceError> {
    let mut resolved = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let prod = product::Entity::find_by_id(item.product_id)
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "items[{}].product_id {} does not exist",
                    idx, item.product_id
                ))
            })?;
        resolved.push((item.clone(), prod));
    }
    Ok(resolved)
}

async fn insert_item<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
    item: &OrderItemInput,
) -> Result<order_item::Model, ServiceError> {
    let price = item.price_per_item.round_dp(2);
    let model = order_item::ActiveModel {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        product_id: Set(item.product_id),
        quantity: Set(item.quantity),
        price_per_item: Set(price),
        total_price: Set(price * Decimal::from(item.quantity)),
    };
    Ok(model.insert(conn).await?)
}

fn compute_total(items: &[OrderItemInput]) -> Decimal {
    items
        .iter()
        .map(|i| i.price_per_item.round_dp(2) * Decimal::from(i.quantity))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(product_id: Uuid, quantity: i32, price: Decimal) -> OrderItemInput {
        OrderItemInput {
            product_id,
            quantity,
            price_per_item: price,
        }
    }

    #[test]
    fn empty_orders_are_rejected() {
        let err = validate_items(&[]).unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[test]
    fn zero_and_negative_quantities_are_rejected_by_index() {
        let items = vec![
            item(Uuid::new_v4(), 1, dec!(10)),
            item(Uuid::new_v4(), 0, dec!(10)),
        ];
        let err = validate_items(&items).unwrap_err();
        assert!(err.to_string().contains("items[1].quantity"));
    }

    #[test]
    fn duplicate_products_are_rejected() {
        let id = Uuid::new_v4();
        let items = vec![item(id, 1, dec!(10)), item(id, 2, dec!(10))];
        let err = validate_items(&items).unwrap_err();
        assert!(err.to_string().contains("items[1].product_id"));
    }

    #[test]
    fn totals_are_exact_decimal_sums() {
        let items = vec![
            item(Uuid::new_v4(), 3, dec!(0.10)),
            item(Uuid::new_v4(), 2, dec!(85.50)),
        ];
        // 0.30 + 171.00; float math would drift on the first term
        assert_eq!(compute_total(&items), dec!(171.30));
    }
}
