use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::order::OrderStatus;
use crate::entities::{order_item, product};
use crate::errors::ErrorResponse;
use crate::handlers;
use crate::services::catalog_sync::SyncReport;
use crate::services::orders::{
    CreateOrderRequest, OrderDetails, OrderItemInput, UpdateOrderRequest, UpdateOrderStatusRequest,
};
use crate::services::products::{CreateProductRequest, UpdateProductRequest};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "1C Integration Bridge API",
        description = "Local product/order store with catalog sync and order submission to a 1C-style ERP"
    ),
    paths(
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::products::create_product,
        handlers::products::update_product,
        handlers::products::delete_product,
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::orders::create_order,
        handlers::orders::update_order,
        handlers::orders::get_order_items,
        handlers::orders::update_order_status,
        handlers::orders::delete_order,
        handlers::order_items::list_order_items,
        handlers::order_items::get_order_item,
        handlers::integration::sync_products_from_onec,
        handlers::integration::create_order_in_onec,
    ),
    components(schemas(
        product::Model,
        order_item::Model,
        OrderStatus,
        OrderDetails,
        OrderItemInput,
        CreateProductRequest,
        UpdateProductRequest,
        CreateOrderRequest,
        UpdateOrderRequest,
        UpdateOrderStatusRequest,
        SyncReport,
        handlers::integration::SyncResponse,
        ErrorResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "products", description = "Product catalog"),
        (name = "orders", description = "Orders and their items"),
        (name = "order-items", description = "Read-only order item views"),
        (name = "integration", description = "1C exchange operations"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .build(),
                ),
            );
        }
    }
}

/// Swagger UI mounted at `/docs`, serving the generated document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
