pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::handlers::AppServices;

pub type ApiResult<T> = Result<T, ServiceError>;

/// Shared application state threaded through every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub services: AppServices,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: Arc<AppConfig>) -> Self {
        let services = AppServices::new(db.clone(), &config);
        Self {
            db,
            config,
            services,
        }
    }
}

/// Uniform success envelope.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResponseMeta {
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            meta: ResponseMeta {
                timestamp: chrono::Utc::now().to_rfc3339(),
            },
        }
    }
}

const DEFAULT_PAGE_SIZE: u64 = 20;
const MAX_PAGE_SIZE: u64 = 100;

/// Common pagination query parameters.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListQuery {
    /// 1-based page number
    pub page: Option<u64>,
    /// Page size, capped at 100
    pub limit: Option<u64>,
}

impl ListQuery {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        let total_pages = if total == 0 { 0 } else { total.div_ceil(limit) };
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusInfo {
    pub name: String,
    pub version: String,
    pub environment: String,
}

/// Liveness probe.
pub async fn health_check() -> &'static str {
    "ok"
}

/// Service identity and environment.
pub async fn api_status(State(state): State<AppState>) -> Json<ApiResponse<StatusInfo>> {
    Json(ApiResponse::ok(StatusInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.config.environment.clone(),
    }))
}

/// All versioned API routes.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(api_status))
        .route(
            "/products",
            get(handlers::products::list_products).post(handlers::products::create_product),
        )
        .route(
            "/products/{id}",
            get(handlers::products::get_product)
                .put(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        )
        .route(
            "/orders",
            get(handlers::orders::list_orders).post(handlers::orders::create_order),
        )
        .route(
            "/orders/{id}",
            get(handlers::orders::get_order)
                .put(handlers::orders::update_order)
                .delete(handlers::orders::delete_order),
        )
        .route("/orders/{id}/items", get(handlers::orders::get_order_items))
        .route("/orders/{id}/status", put(handlers::orders::update_order_status))
        .route("/order-items", get(handlers::order_items::list_order_items))
        .route(
            "/order-items/{id}",
            get(handlers::order_items::get_order_item),
        )
        .route(
            "/integration/sync-products-from-1c",
            post(handlers::integration::sync_products_from_onec),
        )
        .route(
            "/integration/create-order-in-1c",
            post(handlers::integration::create_order_in_onec),
        )
}

/// Builds the full application router, shared by `main` and the tests.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_defaults_and_caps() {
        let q = ListQuery::default();
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(), 20);

        let q = ListQuery {
            page: Some(0),
            limit: Some(10_000),
        };
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(), 100);
    }

    #[test]
    fn pagination_math() {
        let p = PaginatedResponse::new(vec![1, 2, 3], 41, 1, 20);
        assert_eq!(p.total_pages, 3);
        let empty: PaginatedResponse<i32> = PaginatedResponse::new(vec![], 0, 1, 20);
        assert_eq!(empty.total_pages, 0);
    }
}
