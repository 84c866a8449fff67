//! Maps a resolved intent to one remote action and runs it.
//!
//! Missing slots short-circuit with [`DispatchResult::NeedsMoreInfo`]
//! before any network call. Every other path ends in a terminal action
//! status and a reply fragment.

use std::sync::Arc;

use shipchat_core::{Action, ActionOutcome, ActionStatus, ContextMemory, Credential, Field, Intent};

use crate::error::ActionError;
use crate::handler::{ActionHandler, ActionRegistry, ActionRequest};
use crate::state_machine::{advance, validate_transition};
use crate::summary::{failure_message, summarize};

/// Outcome of one dispatch attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchResult {
    /// The intent has no remote operation (greeting, help, ...).
    NoAction,
    /// Required slots are absent; the action is still pending.
    NeedsMoreInfo { action: Action, missing: Vec<Field> },
    /// The remote call succeeded.
    Completed { action: Action, summary: String },
    /// The remote call (or its preparation) failed.
    Failed { action: Action, message: String },
}

impl DispatchResult {
    pub fn action(&self) -> Option<&Action> {
        match self {
            DispatchResult::NoAction => None,
            DispatchResult::NeedsMoreInfo { action, .. }
            | DispatchResult::Completed { action, .. }
            | DispatchResult::Failed { action, .. } => Some(action),
        }
    }

    /// Text to append to the reply, if any.
    pub fn reply_fragment(&self) -> Option<&str> {
        match self {
            DispatchResult::Completed { summary, .. } => Some(summary),
            DispatchResult::Failed { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Runs actions through a shared, immutable handler registry.
#[derive(Clone)]
pub struct ActionDispatcher {
    registry: Arc<ActionRegistry>,
}

impl ActionDispatcher {
    pub fn new(registry: Arc<ActionRegistry>) -> Self {
        Self { registry }
    }

    /// Slots `intent` still needs, in declaration order.
    pub fn missing_fields(&self, intent: Intent, memory: &ContextMemory) -> Vec<Field> {
        self.registry
            .get(intent.action_type())
            .map(|handler| {
                handler
                    .required_fields()
                    .iter()
                    .copied()
                    .filter(|field| !memory.contains(*field))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub async fn dispatch(
        &self,
        intent: Intent,
        token: &Credential,
        memory: &ContextMemory,
    ) -> DispatchResult {
        let action_type = intent.action_type();
        if !action_type.is_remote() {
            return DispatchResult::NoAction;
        }

        let mut action = Action::new(action_type);
        let Some(handler) = self.registry.get(action_type) else {
            let err = ActionError::UnregisteredHandler(action_type);
            tracing::warn!(action = %action_type, "No handler registered");
            return fail(action, err);
        };

        let missing = self.missing_fields(intent, memory);
        if !missing.is_empty() {
            tracing::debug!(action = %action_type, missing = missing.len(), "Action needs more info");
            return DispatchResult::NeedsMoreInfo { action, missing };
        }

        let request = ActionRequest::new(token, memory);
        tracing::info!(action = %action_type, description = %handler.describe(&request), "Dispatching action");

        match run(handler.as_ref(), &mut action, &request).await {
            Ok(outcome) => {
                let summary = summarize(&outcome);
                action.result = Some(outcome);
                tracing::info!(action = %action_type, "Action succeeded");
                DispatchResult::Completed { action, summary }
            }
            Err(err) => {
                tracing::warn!(action = %action_type, error = %err, "Action failed");
                fail(action, err)
            }
        }
    }
}

async fn run(
    handler: &dyn ActionHandler,
    action: &mut Action,
    request: &ActionRequest<'_>,
) -> Result<ActionOutcome, ActionError> {
    advance(action, ActionStatus::Processing)?;
    let outcome = handler.execute(request).await?;
    advance(action, ActionStatus::Success)?;
    Ok(outcome)
}

fn fail(mut action: Action, err: ActionError) -> DispatchResult {
    if validate_transition(action.status, ActionStatus::Error).is_ok() {
        action.status = ActionStatus::Error;
    }
    let message = failure_message(action.action_type, &err);
    action.error = Some(err.to_string());
    DispatchResult::Failed { action, message }
}
