//! Cancel-by-id handler.

use std::sync::Arc;

use async_trait::async_trait;
use shipchat_core::{ActionOutcome, ActionType, Field};

use crate::backend::LogisticsBackend;
use crate::error::ActionError;
use crate::handler::{ActionHandler, ActionRequest};

pub struct CancelShipmentHandler {
    backend: Arc<dyn LogisticsBackend>,
}

impl CancelShipmentHandler {
    pub fn new(backend: Arc<dyn LogisticsBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl ActionHandler for CancelShipmentHandler {
    fn action_type(&self) -> ActionType {
        ActionType::CancelShipment
    }

    fn required_fields(&self) -> &'static [Field] {
        &[Field::ShipmentId, Field::Company]
    }

    async fn execute(&self, request: &ActionRequest<'_>) -> Result<ActionOutcome, ActionError> {
        let shipment_id = request.require_text(Field::ShipmentId)?;
        let company = request.require_text(Field::Company)?;
        self.backend
            .cancel_shipment(request.token, &shipment_id, &company)
            .await?;

        tracing::info!(shipment_id = %shipment_id, company = %company, "Shipment cancelled");
        Ok(ActionOutcome::ShipmentCancelled { shipment_id })
    }

    fn describe(&self, request: &ActionRequest<'_>) -> String {
        format!(
            "Cancel shipment {}",
            request
                .text(Field::ShipmentId)
                .unwrap_or_else(|| "<no id>".to_string())
        )
    }
}
