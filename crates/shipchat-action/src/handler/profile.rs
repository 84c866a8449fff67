//! Profile lookup handler.

use std::sync::Arc;

use async_trait::async_trait;
use shipchat_core::{ActionOutcome, ActionType};

use crate::backend::LogisticsBackend;
use crate::error::ActionError;
use crate::handler::{ActionHandler, ActionRequest};

pub struct ProfileHandler {
    backend: Arc<dyn LogisticsBackend>,
}

impl ProfileHandler {
    pub fn new(backend: Arc<dyn LogisticsBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl ActionHandler for ProfileHandler {
    fn action_type(&self) -> ActionType {
        ActionType::GetProfile
    }

    async fn execute(&self, request: &ActionRequest<'_>) -> Result<ActionOutcome, ActionError> {
        let envelope = self.backend.profile(request.token).await?;
        Ok(ActionOutcome::Profile {
            name: envelope.data_str(&["name", "fullName", "full_name"]),
            email: envelope.data_str(&["email"]),
            phone: envelope.data_str(&["phone", "mobile"]),
        })
    }

    fn describe(&self, _request: &ActionRequest<'_>) -> String {
        "Get profile".to_string()
    }
}
