//! Free-text search handler.

use std::sync::Arc;

use async_trait::async_trait;
use shipchat_core::{ActionOutcome, ActionType, Field};

use crate::backend::LogisticsBackend;
use crate::error::ActionError;
use crate::handler::{ActionHandler, ActionRequest};

pub struct SearchHandler {
    backend: Arc<dyn LogisticsBackend>,
}

impl SearchHandler {
    pub fn new(backend: Arc<dyn LogisticsBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl ActionHandler for SearchHandler {
    fn action_type(&self) -> ActionType {
        ActionType::Search
    }

    fn required_fields(&self) -> &'static [Field] {
        &[Field::SearchTerm]
    }

    async fn execute(&self, request: &ActionRequest<'_>) -> Result<ActionOutcome, ActionError> {
        let term = request.require_text(Field::SearchTerm)?;
        let envelope = self.backend.search(request.token, &term).await?;
        Ok(ActionOutcome::SearchResults {
            count: envelope.item_count(),
            term,
        })
    }

    fn describe(&self, request: &ActionRequest<'_>) -> String {
        format!(
            "Search for {}",
            request
                .text(Field::SearchTerm)
                .unwrap_or_else(|| "<no term>".to_string())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Envelope;
    use crate::handler::stub::StubBackend;
    use serde_json::json;
    use shipchat_core::{ContextMemory, Credential, EntityValue};

    #[tokio::test]
    async fn test_search_passes_term_and_counts() {
        let envelope = Envelope {
            results: Some(json!([{"id": 1}, {"id": 2}])),
            ..Envelope::default()
        };
        let stub = StubBackend::replying(envelope);
        let handler = SearchHandler::new(stub.clone());
        let mut memory = ContextMemory::new();
        memory.merge(
            &[(Field::SearchTerm, EntityValue::text("كتب"))]
                .into_iter()
                .collect(),
        );
        let token = Credential::new("t");

        let outcome = handler
            .execute(&ActionRequest::new(&token, &memory))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ActionOutcome::SearchResults {
                term: "كتب".to_string(),
                count: 2
            }
        );
        assert_eq!(stub.calls(), vec!["search:كتب".to_string()]);
    }
}
