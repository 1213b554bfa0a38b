use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::AppConfig;
use crate::errors::ServiceError;

/// A product row as published by the 1C exchange service. `id`, `name`,
/// `article`, `price` and `stock` are all required; a row missing any of
/// them fails to parse and is reported by the sync.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteProduct {
    pub id: String,
    pub name: String,
    pub article: String,
    pub price: f64,
    pub stock: i64,
    #[serde(default)]
    pub description: Option<String>,
}

/// One line of an order as submitted to 1C. Prices travel as plain JSON
/// numbers on this wire; exact decimals live only on our side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteOrderItem {
    pub product_id_1c: String,
    pub quantity: i64,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteOrderPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_info: Option<String>,
    pub items: Vec<RemoteOrderItem>,
}

/// 1C's verdict on an order submission. `success: false` with a message is a
/// business rejection, not a transport failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteOrderResponse {
    pub success: bool,
    #[serde(default)]
    pub order_1c_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// HTTP client for the 1C exchange service. Basic auth on every call,
/// bounded per-request timeouts so a stalled 1C cannot hold API requests
/// open indefinitely.
#[derive(Debug, Clone)]
pub struct OneCClient {
    http: Client,
    base_url: String,
    username: String,
    password: String,
    catalog_timeout: Duration,
    order_timeout: Duration,
}

impl OneCClient {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        catalog_timeout: Duration,
        order_timeout: Duration,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            catalog_timeout,
            order_timeout,
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        Self::new(
            cfg.onec_base_url.clone(),
            cfg.onec_username.clone(),
            cfg.onec_password.clone(),
            Duration::from_secs(cfg.onec_catalog_timeout_secs),
            Duration::from_secs(cfg.onec_order_timeout_secs),
        )
    }

    /// Downloads the full product catalog.
    ///
    /// Items come back as raw JSON values so that one malformed row can be
    /// reported individually by the sync instead of failing the whole batch.
    #[instrument(skip(self))]
    pub async fn fetch_products(&self) -> Result<Vec<serde_json::Value>, ServiceError> {
        let url = format!("{}/products", self.base_url);
        debug!(%url, "Requesting product catalog from 1C");

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .timeout(self.catalog_timeout)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "1C catalog endpoint returned an error status");
            return Err(ServiceError::RemoteUnreachable(format!(
                "catalog request returned HTTP {}",
                status
            )));
        }

        response
            .json::<Vec<serde_json::Value>>()
            .await
            .map_err(|e| {
                ServiceError::RemoteMalformed(format!("catalog body is not a JSON array: {}", e))
            })
    }

    /// Submits an order and returns 1C's verdict.
    #[instrument(skip(self, payload), fields(items = payload.items.len()))]
    pub async fn create_order(
        &self,
        payload: &RemoteOrderPayload,
    ) -> Result<RemoteOrderResponse, ServiceError> {
        let url = format!("{}/orders", self.base_url);
        debug!(%url, "Submitting order to 1C");

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .timeout(self.order_timeout)
            .json(payload)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "1C order endpoint returned an error status");
            return Err(ServiceError::RemoteUnreachable(format!(
                "order request returned HTTP {}",
                status
            )));
        }

        response.json::<RemoteOrderResponse>().await.map_err(|e| {
            ServiceError::RemoteMalformed(format!("order response did not parse: {}", e))
        })
    }
}

/// Timeouts get their own error class; everything else at the transport
/// level counts as 1C being unreachable.
fn map_transport_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::RemoteTimeout(err.to_string())
    } else {
        ServiceError::RemoteUnreachable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = OneCClient::new(
            "http://localhost:8001/1c_mock/hs/exchange/",
            "u",
            "p",
            Duration::from_secs(5),
            Duration::from_secs(5),
        );
        assert_eq!(client.base_url, "http://localhost:8001/1c_mock/hs/exchange");
    }

    #[test]
    fn order_response_tolerates_missing_fields() {
        let parsed: RemoteOrderResponse =
            serde_json::from_str(r#"{"success": false, "message": "Out of stock"}"#).unwrap();
        assert!(!parsed.success);
        assert_eq!(parsed.order_1c_id, None);
        assert_eq!(parsed.message.as_deref(), Some("Out of stock"));
    }

    #[test]
    fn payload_omits_absent_customer_info() {
        let payload = RemoteOrderPayload {
            customer_info: None,
            items: vec![RemoteOrderItem {
                product_id_1c: "abc".into(),
                quantity: 2,
                price: 10.5,
            }],
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("customer_info").is_none());
        assert_eq!(json["items"][0]["product_id_1c"], "abc");
    }
}
