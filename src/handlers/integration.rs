use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{consts, AuthUser};
use crate::errors::ErrorResponse;
use crate::services::catalog_sync::SyncReport;
use crate::services::orders::{CreateOrderRequest, OrderDetails};
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct SyncResponse {
    pub status: String,
    pub message: String,
    pub details: SyncReport,
}

/// Pulls the product catalog from 1C. Row-level failures are reported in
/// the body; only failing to reach 1C at all fails the request.
#[utoipa::path(
    post,
    path = "/api/v1/integration/sync-products-from-1c",
    responses(
        (status = 200, description = "Sync finished; per-row errors listed in details", body = SyncResponse),
        (status = 502, description = "1C returned a malformed response", body = ErrorResponse),
        (status = 503, description = "1C is unreachable", body = ErrorResponse),
        (status = 504, description = "1C did not answer in time", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "integration"
)]
pub async fn sync_products_from_onec(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<SyncResponse>> {
    user.require(consts::INTEGRATION_MANAGE)?;
    let report = state.services.catalog_sync.sync_products().await?;
    Ok(Json(SyncResponse {
        status: "success".to_string(),
        message: report.summary(),
        details: report,
    }))
}

/// Submits an order to 1C and persists it locally once accepted.
#[utoipa::path(
    post,
    path = "/api/v1/integration/create-order-in-1c",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order accepted by 1C and saved locally", body = OrderDetails),
        (status = 400, description = "Invalid order, or rejected by 1C", body = ErrorResponse),
        (status = 500, description = "Order exists in 1C but was not saved locally; details carry the 1C order id", body = ErrorResponse),
        (status = 502, description = "1C returned a malformed response", body = ErrorResponse),
        (status = 503, description = "1C is unreachable", body = ErrorResponse),
        (status = 504, description = "1C did not answer in time", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "integration"
)]
pub async fn create_order_in_onec(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<OrderDetails>>)> {
    user.require(consts::INTEGRATION_MANAGE)?;
    let created = state.services.integration.submit_order(req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(created))))
}
