use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::auth::{consts, AuthUser};
use crate::entities::product;
use crate::errors::ErrorResponse;
use crate::services::products::{CreateProductRequest, UpdateProductRequest};
use crate::{ApiResponse, ApiResult, AppState, ListQuery, PaginatedResponse};

/// Product reads are open; writes require authentication.
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(ListQuery),
    responses(
        (status = 200, description = "Paginated list of products")
    ),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ApiResponse<PaginatedResponse<product::Model>>>> {
    let (items, total) = state
        .services
        .products
        .list_products(query.page(), query.limit())
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
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "The product", body = product::Model),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<product::Model>>> {
    let found = state.services.products.get_product(id).await?;
    Ok(Json(ApiResponse::ok(found)))
}

#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = product::Model),
        (status = 400, description = "Invalid product data", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<product::Model>>)> {
    user.require(consts::PRODUCTS_WRITE)?;
    let created = state.services.products.create_product(req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(created))))
}

#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = product::Model),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProductRequest>,
) -> ApiResult<Json<ApiResponse<product::Model>>> {
    user.require(consts::PRODUCTS_WRITE)?;
    let updated = state.services.products.update_product(id, req).await?;
    Ok(Json(ApiResponse::ok(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 409, description = "Product is referenced by an order", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    user.require(consts::PRODUCTS_WRITE)?;
    state.services.products.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
