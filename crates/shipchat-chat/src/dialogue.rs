//! Slot-filling dialogue.
//!
//! Tracks the active intent and the conversation's slot memory, decides
//! which required fields are still missing, and builds the reply text for
//! the turn. Dispatching the action is left to the engine.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use shipchat_core::{ContextMemory, Field, Intent};
use shipchat_nlu::intent::classifier::FALLBACK_CONFIDENCE;
use shipchat_nlu::{IntentRegistry, RandomSource, ResponseBank};

use crate::error::ChatError;
use crate::transport::{Analysis, DialogueSnapshot};

// =============================================================================
// Phase state machine
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DialoguePhase {
    #[default]
    Idle,
    Collecting,
    Ready,
    Dispatched,
}

impl fmt::Display for DialoguePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialoguePhase::Idle => write!(f, "idle"),
            DialoguePhase::Collecting => write!(f, "collecting"),
            DialoguePhase::Ready => write!(f, "ready"),
            DialoguePhase::Dispatched => write!(f, "dispatched"),
        }
    }
}

/// Validate a dialogue phase transition.
///
/// `Ready` only exists between planning and dispatch, so it can only move
/// on to `Dispatched` (or back to `Collecting` if a slot was dropped).
pub fn validate_transition(from: DialoguePhase, to: DialoguePhase) -> Result<(), ChatError> {
    use DialoguePhase::*;

    let valid = matches!(
        (from, to),
        (Idle, Idle | Collecting | Ready)
            | (Collecting, Collecting | Ready | Idle)
            | (Ready, Dispatched | Collecting)
            | (Dispatched, Idle | Collecting | Ready)
    );

    if valid {
        Ok(())
    } else {
        Err(ChatError::InvalidTransition(from, to))
    }
}

// =============================================================================
// Conversation state
// =============================================================================

/// Everything the dialogue remembers between turns.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    phase: DialoguePhase,
    active_intent: Option<Intent>,
    memory: ContextMemory,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> DialoguePhase {
        self.phase
    }

    pub fn active_intent(&self) -> Option<Intent> {
        self.active_intent
    }

    pub fn memory(&self) -> &ContextMemory {
        &self.memory
    }

    pub fn transition(&mut self, to: DialoguePhase) -> Result<(), ChatError> {
        validate_transition(self.phase, to)?;
        tracing::trace!(from = %self.phase, to = %to, "Dialogue transition");
        self.phase = to;
        Ok(())
    }

    /// Marks the active intent's action as handed off. Slot memory is kept
    /// so later requests can reuse it.
    pub fn mark_dispatched(&mut self) -> Result<(), ChatError> {
        self.transition(DialoguePhase::Dispatched)?;
        self.active_intent = None;
        Ok(())
    }

    /// Forget everything: phase, active intent and memory.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn snapshot(&self) -> DialogueSnapshot {
        DialogueSnapshot {
            active_intent: self.active_intent,
            memory: self.memory.clone(),
        }
    }
}

// =============================================================================
// Turn planning
// =============================================================================

/// What the engine should do with one analyzed message.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnPlan {
    /// The intent the turn is about, after continuation is resolved.
    pub intent: Intent,
    pub reply: String,
    /// Required slots still empty, in declaration order.
    pub missing: Vec<Field>,
    /// Every slot is filled and the intent has a remote action.
    pub dispatch: bool,
    /// The message was read as an answer to the previous prompt.
    pub continued: bool,
}

pub struct DialogueManager {
    bank: ResponseBank,
}

impl DialogueManager {
    pub fn new(registry: Arc<IntentRegistry>) -> Self {
        Self {
            bank: ResponseBank::new(registry),
        }
    }

    fn registry(&self) -> &IntentRegistry {
        self.bank.registry()
    }

    /// A weak `info` guess while collecting is an answer to the last prompt,
    /// not a change of subject.
    fn continues(state: &ConversationState, analysis: &Analysis) -> Option<Intent> {
        match (state.phase, state.active_intent) {
            (DialoguePhase::Collecting, Some(active))
                if analysis.intent == Intent::Info
                    && analysis.confidence <= FALLBACK_CONFIDENCE =>
            {
                Some(active)
            }
            _ => None,
        }
    }

    /// One prompt per missing field, in the order given.
    pub fn follow_ups(
        &self,
        intent: Intent,
        missing: &[Field],
        rng: &mut dyn RandomSource,
    ) -> Vec<String> {
        missing
            .iter()
            .filter_map(|field| self.bank.follow_up(intent, *field, rng))
            .collect()
    }

    /// Merge the analysis into `state` and plan the reply.
    pub fn plan(
        &self,
        state: &mut ConversationState,
        analysis: &Analysis,
        rng: &mut dyn RandomSource,
    ) -> Result<TurnPlan, ChatError> {
        let continued_intent = Self::continues(state, analysis);
        let continued = continued_intent.is_some();
        let intent = continued_intent.unwrap_or(analysis.intent);

        let changed = state.memory.merge(&analysis.entities);
        if !changed.is_empty() {
            tracing::debug!(intent = %intent, filled = changed.len(), "Slots updated");
        }

        let required = self.registry().required_fields(intent);
        let missing: Vec<Field> = required
            .iter()
            .copied()
            .filter(|field| !state.memory.contains(*field))
            .collect();

        if !missing.is_empty() {
            state.transition(DialoguePhase::Collecting)?;
            state.active_intent = Some(intent);

            // A continued turn was analyzed as `info`, so its response text
            // belongs to the wrong intent.
            let base = if continued {
                self.bank.base(intent, rng)
            } else {
                analysis.response.clone()
            };
            let mut lines = vec![base];
            lines.extend(self.follow_ups(intent, &missing, rng));
            let reply = lines.join("\n");

            return Ok(TurnPlan {
                intent,
                reply,
                missing,
                dispatch: false,
                continued,
            });
        }

        if intent.action_type().is_remote() {
            state.transition(DialoguePhase::Ready)?;
            state.active_intent = Some(intent);

            let reply = if required.is_empty() {
                analysis.response.clone()
            } else {
                self.bank
                    .ready(intent, rng)
                    .unwrap_or_else(|| analysis.response.clone())
            };

            return Ok(TurnPlan {
                intent,
                reply,
                missing,
                dispatch: true,
                continued,
            });
        }

        state.transition(DialoguePhase::Idle)?;
        state.active_intent = None;
        Ok(TurnPlan {
            intent,
            reply: analysis.response.clone(),
            missing,
            dispatch: false,
            continued,
        })
    }
}
