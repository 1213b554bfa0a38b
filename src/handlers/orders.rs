use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::auth::{consts, AuthUser};
use crate::errors::ErrorResponse;
use crate::services::orders::{
    CreateOrderRequest, OrderDetails, UpdateOrderRequest, UpdateOrderStatusRequest,
};
use crate::{ApiResponse, ApiResult, AppState, ListQuery, PaginatedResponse};

#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(ListQuery),
    responses(
        (status = 200, description = "Paginated list of orders, newest first")
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ApiResponse<PaginatedResponse<OrderDetails>>>> {
    user.require(consts::ORDERS_READ)?;
    let (items, total) = state
        .services
        .orders
        .list_orders(query.page(), query.limit())
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
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "The order with its items", body = OrderDetails),
        (status = 404, description = "Order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<OrderDetails>>> {
    user.require(consts::ORDERS_READ)?;
    let found = state.services.orders.get_order(id).await?;
    Ok(Json(ApiResponse::ok(found)))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created with computed total", body = OrderDetails),
        (status = 400, description = "Invalid order data", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<OrderDetails>>)> {
    user.require(consts::ORDERS_WRITE)?;
    let created = state.services.orders.create_order(req, None).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(created))))
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Order updated; items replaced when supplied", body = OrderDetails),
        (status = 404, description = "Order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn update_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateOrderRequest>,
) -> ApiResult<Json<ApiResponse<OrderDetails>>> {
    user.require(consts::ORDERS_WRITE)?;
    let updated = state.services.orders.update_order(id, req).await?;
    Ok(Json(ApiResponse::ok(updated)))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/items",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Lines of the order"),
        (status = 404, description = "Order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn get_order_items(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<crate::entities::order_item::Model>>>> {
    user.require(consts::ORDERS_READ)?;
    let items = state.services.orders.get_order_items(id).await?;
    Ok(Json(ApiResponse::ok(items)))
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = OrderDetails),
        (status = 404, description = "Order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateOrderStatusRequest>,
) -> ApiResult<Json<ApiResponse<OrderDetails>>> {
    user.require(consts::ORDERS_WRITE)?;
    let updated = state
        .services
        .orders
        .update_order_status(id, req.status)
        .await?;
    Ok(Json(ApiResponse::ok(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 204, description = "Order and its items deleted"),
        (status = 404, description = "Order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    user.require(consts::ORDERS_WRITE)?;
    state.services.orders.delete_order(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
