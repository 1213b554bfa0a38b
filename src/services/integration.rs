use tracing::{error, info, instrument, warn};

use crate::errors::ServiceError;
use crate::services::onec::OneCClient;
use crate::services::orders::{CreateOrderRequest, OrderDetails, OrderService};

/// Two-phase order submission: the order is first accepted by 1C, then
/// persisted locally with the id 1C assigned.
#[derive(Debug, Clone)]
pub struct IntegrationService {
    client: OneCClient,
    orders: OrderService,
}

impl IntegrationService {
    pub fn new(client: OneCClient, orders: OrderService) -> Self {
        Self { client, orders }
    }

    /// Validates the request, submits it to 1C, and on acceptance persists
    /// the order locally carrying the remote id.
    ///
    /// Nothing is written locally before 1C accepts. If the local write
    /// fails afterwards the order exists only in 1C; that case is reported
    /// as an inconsistency carrying the remote id, never retried here.
    #[instrument(skip(self, req), fields(items = req.items.len()))]
    pub async fn submit_order(
        &self,
        req: CreateOrderRequest,
    ) -> Result<OrderDetails, ServiceError> {
        let payload = self.orders.prepare_remote_payload(&req).await?;

        info!("Submitting order to 1C");
        let verdict = self.client.create_order(&payload).await?;

        if !verdict.success {
            let reason = verdict
                .message
                .unwrap_or_else(|| "1C rejected the order".to_string());
            warn!(%reason, "1C declined the order");
            return Err(ServiceError::RemoteRejected(reason));
        }

        let onec_id = verdict.order_1c_id.ok_or_else(|| {
            ServiceError::RemoteMalformed(
                "1C accepted the order but returned no order id".to_string(),
            )
        })?;
        info!(%onec_id, "Order accepted by 1C");

        match self.orders.create_order(req, Some(onec_id.clone())).await {
            Ok(details) => {
                info!(order_id = %details.id, %onec_id, "Order persisted locally");
                Ok(details)
            }
            Err(e) => {
                error!(%onec_id, error = %e, "Order accepted by 1C but local persistence failed");
                Err(ServiceError::RemoteInconsistency {
                    onec_id,
                    message: e.response_message(),
                })
            }
        }
    }
}
