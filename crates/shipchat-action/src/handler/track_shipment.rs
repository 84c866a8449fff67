//! Tracking lookup handler.

use std::sync::Arc;

use async_trait::async_trait;
use shipchat_core::{ActionOutcome, ActionType, Field};

use crate::backend::LogisticsBackend;
use crate::error::ActionError;
use crate::handler::{ActionHandler, ActionRequest};

pub struct TrackShipmentHandler {
    backend: Arc<dyn LogisticsBackend>,
}

impl TrackShipmentHandler {
    pub fn new(backend: Arc<dyn LogisticsBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl ActionHandler for TrackShipmentHandler {
    fn action_type(&self) -> ActionType {
        ActionType::TrackShipment
    }

    fn required_fields(&self) -> &'static [Field] {
        &[Field::TrackingNumber]
    }

    async fn execute(&self, request: &ActionRequest<'_>) -> Result<ActionOutcome, ActionError> {
        let tracking_number = request.require_text(Field::TrackingNumber)?;
        let company = request.text(Field::Company);
        let envelope = self
            .backend
            .track_shipment(request.token, &tracking_number, company.as_deref())
            .await?;

        Ok(ActionOutcome::TrackingStatus {
            status: envelope.data_str(&["status", "state"]),
            location: envelope.data_str(&["location", "currentLocation", "current_location"]),
            tracking_number,
        })
    }

    fn describe(&self, request: &ActionRequest<'_>) -> String {
        format!(
            "Track shipment {}",
            request
                .text(Field::TrackingNumber)
                .unwrap_or_else(|| "<no tracking number>".to_string())
        )
    }
}
