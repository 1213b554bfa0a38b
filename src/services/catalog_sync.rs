use serde::Serialize;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::errors::ServiceError;
use crate::services::onec::{OneCClient, RemoteProduct};
use crate::services::products::{ProductService, UpsertOutcome};

/// Result of one catalog sync run.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct SyncReport {
    pub created: u64,
    pub updated: u64,
    pub errors: u64,
    pub error_list: Vec<String>,
}

impl SyncReport {
    pub fn summary(&self) -> String {
        format!(
            "Created: {}, updated: {}, errors: {}.",
            self.created, self.updated, self.errors
        )
    }
}

/// Pulls the 1C product catalog into the local products table.
///
/// A failure to reach 1C fails the whole run; a bad individual row only
/// produces an error entry in the report, and the rest of the batch still
/// lands. Running the sync twice with the same remote data is a no-op
/// beyond the updated counters.
#[derive(Debug, Clone)]
pub struct CatalogSyncService {
    client: OneCClient,
    products: ProductService,
}

impl CatalogSyncService {
    pub fn new(client: OneCClient, products: ProductService) -> Self {
        Self { client, products }
    }

    #[instrument(skip(self))]
    pub async fn sync_products(&self) -> Result<SyncReport, ServiceError> {
        info!("Starting product catalog sync from 1C");
        let raw_items = self.client.fetch_products().await?;
        info!(count = raw_items.len(), "Received catalog from 1C");

        let mut report = SyncReport::default();
        for raw in raw_items {
            let remote_id = raw
                .get("id")
                .and_then(|v| v.as_str())
                .unwrap_or("N/A")
                .to_string();

            let remote: RemoteProduct = match serde_json::from_value(raw) {
                Ok(parsed) => parsed,
                Err(e) => {
                    report.errors += 1;
                    let msg = format!("Incomplete product data for id={}: {}", remote_id, e);
                    warn!(%msg, "Skipping catalog row");
                    report.error_list.push(msg);
                    continue;
                }
            };

            match self.products.upsert_from_remote(&remote).await {
                Ok(UpsertOutcome::Created) => report.created += 1,
                Ok(UpsertOutcome::Updated) => report.updated += 1,
                Err(e) => {
                    report.errors += 1;
                    let msg = format!("Failed to store product id={}: {}", remote.id, e);
                    warn!(%msg, "Catalog row not stored");
                    report.error_list.push(msg);
                }
            }
        }

        info!(
            created = report.created,
            updated = report.updated,
            errors = report.errors,
            "Catalog sync finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_summary_formats_counts() {
        let report = SyncReport {
            created: 2,
            updated: 1,
            errors: 1,
            error_list: vec!["bad row".into()],
        };
        assert_eq!(report.summary(), "Created: 2, updated: 1, errors: 1.");
    }
}
