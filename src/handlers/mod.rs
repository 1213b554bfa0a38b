pub mod integration;
pub mod order_items;
pub mod orders;
pub mod products;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::services::{
    CatalogSyncService, IntegrationService, OneCClient, OrderService, ProductService,
};

/// The service layer, wired once at startup and cloned into handlers.
#[derive(Clone)]
pub struct AppServices {
    pub products: ProductService,
    pub orders: OrderService,
    pub catalog_sync: CatalogSyncService,
    pub integration: IntegrationService,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>, config: &AppConfig) -> Self {
        let client = OneCClient::from_config(config);
        let products = ProductService::new(db.clone());
        let orders = OrderService::new(db);
        let catalog_sync = CatalogSyncService::new(client.clone(), products.clone());
        let integration = IntegrationService::new(client, orders.clone());
        Self {
            products,
            orders,
            catalog_sync,
            integration,
        }
    }
}
