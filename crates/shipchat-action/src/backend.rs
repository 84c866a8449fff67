//! Logistics backend: the authenticated business endpoints actions call.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shipchat_core::config::{BackendConfig, EndpointPaths};
use shipchat_core::Credential;

use crate::error::ActionError;

/// JSON envelope every business endpoint answers with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Value>,
}

impl Envelope {
    pub fn with_data(data: Value) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    /// First present key of `data`, as text. Numbers are stringified.
    pub fn data_str(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| match self.data.get(key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    /// Number of items in a list response.
    ///
    /// Looks at `results`, then `data` itself, then common wrapper keys
    /// inside `data`, then an explicit `count`.
    pub fn item_count(&self) -> usize {
        if let Some(Value::Array(items)) = &self.results {
            return items.len();
        }
        if let Value::Array(items) = &self.data {
            return items.len();
        }
        for key in ["items", "shipments", "orders", "results"] {
            if let Some(Value::Array(items)) = self.data.get(key) {
                return items.len();
            }
        }
        self.data
            .get("count")
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(0)
    }
}

/// Body of a create-shipment call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewShipment {
    pub receiver_name: String,
    pub receiver_phone: String,
    pub city: String,
    pub address: String,
    /// Kilograms.
    pub weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    pub shipment_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

/// Remote business operations. One call per method, each authenticated
/// with the caller's bearer credential.
#[async_trait]
pub trait LogisticsBackend: Send + Sync {
    async fn create_shipment(
        &self,
        token: &Credential,
        shipment: &NewShipment,
    ) -> Result<Envelope, ActionError>;

    async fn track_shipment(
        &self,
        token: &Credential,
        tracking_number: &str,
        company: Option<&str>,
    ) -> Result<Envelope, ActionError>;

    async fn cancel_shipment(
        &self,
        token: &Credential,
        shipment_id: &str,
        company: &str,
    ) -> Result<Envelope, ActionError>;

    async fn list_shipments(&self, token: &Credential) -> Result<Envelope, ActionError>;

    async fn list_orders(&self, token: &Credential) -> Result<Envelope, ActionError>;

    async fn profile(&self, token: &Credential) -> Result<Envelope, ActionError>;

    async fn search(&self, token: &Credential, term: &str) -> Result<Envelope, ActionError>;
}

/// [`LogisticsBackend`] over HTTP/JSON.
pub struct HttpLogisticsBackend {
    client: Client,
    base_url: String,
    endpoints: EndpointPaths,
    timeout: Duration,
}

impl HttpLogisticsBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, ActionError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ActionError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            endpoints: config.endpoints.clone(),
            timeout: config.timeout(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder, token: &Credential) -> Result<Envelope, ActionError> {
        let response = request
            .bearer_auth(token.expose())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ActionError::Timeout(self.timeout.as_secs())
                } else {
                    ActionError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ActionError::Timeout(self.timeout.as_secs())
            } else {
                ActionError::Network(format!("Failed to read response: {}", e))
            }
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<Envelope>(&body)
                .ok()
                .and_then(|envelope| envelope.message)
                .filter(|m| !m.trim().is_empty());
            tracing::debug!(status = status.as_u16(), "Backend returned an error status");
            return Err(ActionError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        if body.trim().is_empty() {
            return Ok(Envelope::default());
        }
        serde_json::from_str(&body).map_err(|e| ActionError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl LogisticsBackend for HttpLogisticsBackend {
    async fn create_shipment(
        &self,
        token: &Credential,
        shipment: &NewShipment,
    ) -> Result<Envelope, ActionError> {
        let request = self
            .client
            .post(self.url(&self.endpoints.create_shipment))
            .json(shipment);
        self.send(request, token).await
    }

    async fn track_shipment(
        &self,
        token: &Credential,
        tracking_number: &str,
        company: Option<&str>,
    ) -> Result<Envelope, ActionError> {
        let request = self
            .client
            .post(self.url(&self.endpoints.track_shipment))
            .json(&serde_json::json!({
                "trackingNumber": tracking_number,
                "company": company,
            }));
        self.send(request, token).await
    }

    async fn cancel_shipment(
        &self,
        token: &Credential,
        shipment_id: &str,
        company: &str,
    ) -> Result<Envelope, ActionError> {
        let path = self.endpoints.cancel_shipment.replace("{id}", shipment_id);
        let request = self
            .client
            .post(self.url(&path))
            .json(&serde_json::json!({ "company": company }));
        self.send(request, token).await
    }

    async fn list_shipments(&self, token: &Credential) -> Result<Envelope, ActionError> {
        let request = self.client.get(self.url(&self.endpoints.list_shipments));
        self.send(request, token).await
    }

    async fn list_orders(&self, token: &Credential) -> Result<Envelope, ActionError> {
        let request = self.client.get(self.url(&self.endpoints.list_orders));
        self.send(request, token).await
    }

    async fn profile(&self, token: &Credential) -> Result<Envelope, ActionError> {
        let request = self.client.get(self.url(&self.endpoints.profile));
        self.send(request, token).await
    }

    async fn search(&self, token: &Credential, term: &str) -> Result<Envelope, ActionError> {
        let request = self
            .client
            .get(self.url(&self.endpoints.search))
            .query(&[("q", term)]);
        self.send(request, token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_missing_fields_default() {
        let envelope: Envelope = serde_json::from_str("{}").unwrap();
        assert_eq!(envelope.data, Value::Null);
        assert!(envelope.message.is_none());
        assert_eq!(envelope.item_count(), 0);
    }

    #[test]
    fn test_item_count_sources() {
        assert_eq!(Envelope::with_data(json!([1, 2, 3])).item_count(), 3);
        assert_eq!(
            Envelope::with_data(json!({"shipments": [{}, {}]})).item_count(),
            2
        );
        assert_eq!(Envelope::with_data(json!({"count": 7})).item_count(), 7);

        let envelope = Envelope {
            data: json!([1]),
            message: None,
            results: Some(json!([1, 2])),
        };
        assert_eq!(envelope.item_count(), 2);
    }

    #[test]
    fn test_data_str_stringifies_numbers() {
        let envelope = Envelope::with_data(json!({"id": 42, "trackingNumber": "SA123"}));
        assert_eq!(envelope.data_str(&["shipmentId", "id"]), Some("42".to_string()));
        assert_eq!(envelope.data_str(&["trackingNumber"]), Some("SA123".to_string()));
        assert_eq!(envelope.data_str(&["missing"]), None);
    }

    #[test]
    fn test_new_shipment_wire_shape() {
        let shipment = NewShipment {
            receiver_name: "محمد احمد".to_string(),
            receiver_phone: "0551234567".to_string(),
            city: "الرياض".to_string(),
            address: "حي النرجس".to_string(),
            weight: 2.5,
            price: None,
            payment_method: Some("cash_on_delivery".to_string()),
            shipment_type: "standard".to_string(),
            company: None,
        };
        let value = serde_json::to_value(&shipment).unwrap();
        assert_eq!(value["receiverPhone"], "0551234567");
        assert_eq!(value["shipmentType"], "standard");
        assert_eq!(value["paymentMethod"], "cash_on_delivery");
        assert!(value.get("price").is_none());
        assert!(value.get("company").is_none());
    }

    #[test]
    fn test_http_backend_trims_base_url() {
        let config = BackendConfig {
            base_url: "http://localhost:9000/api/".to_string(),
            ..BackendConfig::default()
        };
        let backend = HttpLogisticsBackend::new(&config).unwrap();
        assert_eq!(backend.url("/orders"), "http://localhost:9000/api/orders");
    }
}
