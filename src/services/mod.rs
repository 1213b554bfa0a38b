pub mod catalog_sync;
pub mod integration;
pub mod onec;
pub mod orders;
pub mod products;

pub use catalog_sync::CatalogSyncService;
pub use integration::IntegrationService;
pub use onec::OneCClient;
pub use orders::OrderService;
pub use products::ProductService;
