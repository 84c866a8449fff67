//! Create-shipment action handler.

use std::sync::Arc;

use async_trait::async_trait;
use shipchat_core::{ActionOutcome, ActionType, Field};

use crate::backend::{LogisticsBackend, NewShipment};
use crate::error::ActionError;
use crate::handler::{ActionHandler, ActionRequest};

const REQUIRED: &[Field] = &[
    Field::ReceiverName,
    Field::ReceiverPhone,
    Field::City,
    Field::Address,
    Field::Weight,
];

/// Creates a shipment from the full slot set.
pub struct CreateShipmentHandler {
    backend: Arc<dyn LogisticsBackend>,
}

impl CreateShipmentHandler {
    pub fn new(backend: Arc<dyn LogisticsBackend>) -> Self {
        Self { backend }
    }

    fn build(request: &ActionRequest<'_>) -> Result<NewShipment, ActionError> {
        let weight = request.require_number(Field::Weight)?;
        if weight <= 0.0 {
            return Err(ActionError::InvalidPayload(
                "weight must be positive".to_string(),
            ));
        }

        Ok(NewShipment {
            receiver_name: request.require_text(Field::ReceiverName)?,
            receiver_phone: request.require_text(Field::ReceiverPhone)?,
            city: request.require_text(Field::City)?,
            address: request.require_text(Field::Address)?,
            weight,
            price: request.memory.get(Field::Price).and_then(|v| v.as_number()),
            payment_method: request.text(Field::PaymentMethod),
            shipment_type: request
                .text(Field::ShipmentType)
                .unwrap_or_else(|| "standard".to_string()),
            company: request.text(Field::Company),
        })
    }
}

#[async_trait]
impl ActionHandler for CreateShipmentHandler {
    fn action_type(&self) -> ActionType {
        ActionType::CreateShipment
    }

    fn required_fields(&self) -> &'static [Field] {
        REQUIRED
    }

    async fn execute(&self, request: &ActionRequest<'_>) -> Result<ActionOutcome, ActionError> {
        let shipment = Self::build(request)?;
        let envelope = self.backend.create_shipment(request.token, &shipment).await?;

        let outcome = ActionOutcome::ShipmentCreated {
            shipment_id: envelope.data_str(&["shipmentId", "shipment_id", "id"]),
            tracking_number: envelope.data_str(&["trackingNumber", "tracking_number"]),
        };
        tracing::info!(city = %shipment.city, weight = shipment.weight, "Shipment created");
        Ok(outcome)
    }

    fn describe(&self, request: &ActionRequest<'_>) -> String {
        format!(
            "Create shipment to {}",
            request.text(Field::City).unwrap_or_else(|| "<no city>".to_string())
        )
    }
}
