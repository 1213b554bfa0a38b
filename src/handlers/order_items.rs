use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use crate::auth::{consts, AuthUser};
use crate::entities::order_item;
use crate::errors::ErrorResponse;
use crate::{ApiResponse, ApiResult, AppState, ListQuery, PaginatedResponse};

// Order lines are managed through the order endpoints; these are read-only
// views for auditing.

#[utoipa::path(
    get,
    path = "/api/v1/order-items",
    params(ListQuery),
    responses(
        (status = 200, description = "Paginated list of order items")
    ),
    security(("bearer_auth" = [])),
    tag = "order-items"
)]
pub async fn list_order_items(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ApiResponse<PaginatedResponse<order_item::Model>>>> {
    user.require(consts::ORDERS_READ)?;
    let (items, total) = state
        .services
        .orders
        .list_order_items(query.page(), query.limit())
        .await?;
    Ok(Json(ApiResponse::ok(PaginatedResponse::new(
        items,
        total,
        query.page(),
        query.limit(),
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/order-items/{id}",
    params(("id" = Uuid, Path, description = "Order item id")),
    responses(
        (status = 200, description = "The order item", body = order_item::Model),
        (status = 404, description = "Order item not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "order-items"
)]
pub async fn get_order_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<order_item::Model>>> {
    user.require(consts::ORDERS_READ)?;
    let found = state.services.orders.get_order_item(id).await?;
    Ok(Json(ApiResponse::ok(found)))
}
