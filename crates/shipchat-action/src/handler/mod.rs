//! Action handler registry and trait definition.
//!
//! One handler per remote action type. Handlers read their inputs from the
//! conversation's slot memory and call the injected [`LogisticsBackend`].

pub mod cancel_shipment;
pub mod create_shipment;
pub mod listing;
pub mod profile;
pub mod search;
pub mod track_shipment;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use shipchat_core::{ActionOutcome, ActionType, ContextMemory, Credential, Field};

use crate::backend::LogisticsBackend;
use crate::error::ActionError;

pub use cancel_shipment::CancelShipmentHandler;
pub use create_shipment::CreateShipmentHandler;
pub use listing::{ListOrdersHandler, ListShipmentsHandler};
pub use profile::ProfileHandler;
pub use search::SearchHandler;
pub use track_shipment::TrackShipmentHandler;

/// Everything a handler may read for one execution.
#[derive(Debug, Clone, Copy)]
pub struct ActionRequest<'a> {
    pub token: &'a Credential,
    pub memory: &'a ContextMemory,
}

impl<'a> ActionRequest<'a> {
    pub fn new(token: &'a Credential, memory: &'a ContextMemory) -> Self {
        Self { token, memory }
    }

    /// Text value of a slot; numbers are rendered without a trailing `.0`.
    pub fn text(&self, field: Field) -> Option<String> {
        self.memory.get(field).map(|v| v.to_string())
    }

    /// Text value of a required slot.
    pub fn require_text(&self, field: Field) -> Result<String, ActionError> {
        self.text(field)
            .ok_or_else(|| ActionError::InvalidPayload(format!("{} is required", field)))
    }

    /// Numeric value of a required slot.
    pub fn require_number(&self, field: Field) -> Result<f64, ActionError> {
        self.memory
            .get(field)
            .and_then(|v| v.as_number())
            .ok_or_else(|| ActionError::InvalidPayload(format!("{} must be a number", field)))
    }
}

/// Executes one kind of remote action.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    fn action_type(&self) -> ActionType;

    /// Slots that must be present in memory before `execute` is called.
    fn required_fields(&self) -> &'static [Field] {
        &[]
    }

    async fn execute(&self, request: &ActionRequest<'_>) -> Result<ActionOutcome, ActionError>;

    /// Short, credential-free description for logs.
    fn describe(&self, request: &ActionRequest<'_>) -> String;
}

/// Immutable-after-setup map from action type to handler.
#[derive(Default)]
pub struct ActionRegistry {
    handlers: HashMap<ActionType, Arc<dyn ActionHandler>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn ActionHandler>) {
        self.handlers.insert(handler.action_type(), handler);
    }

    /// Register a handler for each business action, all sharing `backend`.
    pub fn register_defaults(&mut self, backend: Arc<dyn LogisticsBackend>) {
        self.register(Arc::new(CreateShipmentHandler::new(Arc::clone(&backend))));
        self.register(Arc::new(TrackShipmentHandler::new(Arc::clone(&backend))));
        self.register(Arc::new(CancelShipmentHandler::new(Arc::clone(&backend))));
        self.register(Arc::new(ListShipmentsHandler::new(Arc::clone(&backend))));
        self.register(Arc::new(ListOrdersHandler::new(Arc::clone(&backend))));
        self.register(Arc::new(ProfileHandler::new(Arc::clone(&backend))));
        self.register(Arc::new(SearchHandler::new(backend)));
    }

    pub fn get(&self, action_type: ActionType) -> Option<&Arc<dyn ActionHandler>> {
        self.handlers.get(&action_type)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod stub {
    //! In-memory backend recording every call.

    use std::sync::Mutex;

    use super::*;
    use crate::backend::{Envelope, NewShipment};

    #[derive(Default)]
    pub struct StubBackend {
        pub reply: Mutex<Option<Result<Envelope, ActionError>>>,
        pub calls: Mutex<Vec<String>>,
        pub created: Mutex<Option<NewShipment>>,
    }

    impl StubBackend {
        pub fn replying(envelope: Envelope) -> Arc<Self> {
            let stub = Self::default();
            *stub.reply.lock().unwrap() = Some(Ok(envelope));
            Arc::new(stub)
        }

        pub fn failing(err: ActionError) -> Arc<Self> {
            let stub = Self::default();
            *stub.reply.lock().unwrap() = Some(Err(err));
            Arc::new(stub)
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn answer(&self, call: String) -> Result<Envelope, ActionError> {
            self.calls.lock().unwrap().push(call);
            self.reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(Envelope::default()))
        }
    }

    #[async_trait]
    impl LogisticsBackend for StubBackend {
        async fn create_shipment(
            &self,
            _token: &Credential,
            shipment: &NewShipment,
        ) -> Result<Envelope, ActionError> {
            *self.created.lock().unwrap() = Some(shipment.clone());
            self.answer("create".to_string())
        }

        async fn track_shipment(
            &self,
            _token: &Credential,
            tracking_number: &str,
            _company: Option<&str>,
        ) -> Result<Envelope, ActionError> {
            self.answer(format!("track:{}", tracking_number))
        }

        async fn cancel_shipment(
            &self,
            _token: &Credential,
            shipment_id: &str,
            company: &str,
        ) -> Result<Envelope, ActionError> {
            self.answer(format!("cancel:{}:{}", shipment_id, company))
        }

        async fn list_shipments(&self, _token: &Credential) -> Result<Envelope, ActionError> {
            self.answer("shipments".to_string())
        }

        async fn list_orders(&self, _token: &Credential) -> Result<Envelope, ActionError> {
            self.answer("orders".to_string())
        }

        async fn profile(&self, _token: &Credential) -> Result<Envelope, ActionError> {
            self.answer("profile".to_string())
        }

        async fn search(&self, _token: &Credential, term: &str) -> Result<Envelope, ActionError> {
            self.answer(format!("search:{}", term))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::stub::StubBackend;
    use super::*;
    use shipchat_core::{EntityBag, EntityValue};

    #[test]
    fn test_register_defaults_covers_business_actions() {
        let mut registry = ActionRegistry::new();
        registry.register_defaults(Arc::new(StubBackend::default()));
        assert_eq!(registry.len(), 7);
        for action_type in [
            ActionType::CreateShipment,
            ActionType::TrackShipment,
            ActionType::CancelShipment,
            ActionType::GetShipments,
            ActionType::GetOrders,
            ActionType::GetProfile,
            ActionType::Search,
        ] {
            assert!(registry.get(action_type).is_some(), "{}", action_type);
        }
        assert!(registry.get(ActionType::Info).is_none());
        assert!(registry.get(ActionType::None).is_none());
    }

    #[test]
    fn test_request_text_and_numbers() {
        let mut memory = ContextMemory::new();
        let bag: EntityBag = [
            (Field::Weight, EntityValue::Number(2.0)),
            (Field::City, EntityValue::text("جدة")),
        ]
        .into_iter()
        .collect();
        memory.merge(&bag);
        let token = Credential::new("t");
        let request = ActionRequest::new(&token, &memory);

        assert_eq!(request.text(Field::Weight).as_deref(), Some("2"));
        assert_eq!(request.require_number(Field::Weight).unwrap(), 2.0);
        assert!(request.require_number(Field::City).is_err());
        assert!(matches!(
            request.require_text(Field::Address),
            Err(ActionError::InvalidPayload(_))
        ));
    }
}
