//! Token-only list handlers: the user's shipments and orders.

use std::sync::Arc;

use async_trait::async_trait;
use shipchat_core::{ActionOutcome, ActionType};

use crate::backend::LogisticsBackend;
use crate::error::ActionError;
use crate::handler::{ActionHandler, ActionRequest};

pub struct ListShipmentsHandler {
    backend: Arc<dyn LogisticsBackend>,
}

impl ListShipmentsHandler {
    pub fn new(backend: Arc<dyn LogisticsBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl ActionHandler for ListShipmentsHandler {
    fn action_type(&self) -> ActionType {
        ActionType::GetShipments
    }

    async fn execute(&self, request: &ActionRequest<'_>) -> Result<ActionOutcome, ActionError> {
        let envelope = self.backend.list_shipments(request.token).await?;
        Ok(ActionOutcome::ShipmentList {
            count: envelope.item_count(),
        })
    }

    fn describe(&self, _request: &ActionRequest<'_>) -> String {
        "List my shipments".to_string()
    }
}

pub struct ListOrdersHandler {
    backend: Arc<dyn LogisticsBackend>,
}

impl ListOrdersHandler {
    pub fn new(backend: Arc<dyn LogisticsBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl ActionHandler for ListOrdersHandler {
    fn action_type(&self) -> ActionType {
        ActionType::GetOrders
    }

    async fn execute(&self, request: &ActionRequest<'_>) -> Result<ActionOutcome, ActionError> {
        let envelope = self.backend.list_orders(request.token).await?;
        Ok(ActionOutcome::OrderList {
            count: envelope.item_count(),
        })
    }

    fn describe(&self, _request: &ActionRequest<'_>) -> String {
        "List my orders".to_string()
    }
}
