//! Conversation engine: one instance per conversation.
//!
//! Each call to [`ChatEngine::process_message`] runs the message through
//! the best available analysis tier, plans the slot-filling reply, runs the
//! resulting action and appends exactly one assistant message to history.

use std::sync::Arc;

use shipchat_action::{ActionDispatcher, DispatchResult};
use shipchat_core::config::DialogueConfig;
use shipchat_core::{Action, ConversationContext, Message};
use shipchat_nlu::{IntentRegistry, RandomSource, DEFAULT_APOLOGY};

use crate::dialogue::{ConversationState, DialogueManager, DialoguePhase};
use crate::error::ChatError;
use crate::selector::{self, TierBoard, TierHealth};
use crate::transport::{Analysis, AnalysisRequest, Analyzer, HistoryEntry, LocalAnalyzer, Tier};

const EMPTY_MESSAGE_PROMPT: &str = "✏️ اكتب رسالتك وسأساعدك في شحناتك.";

pub struct ChatEngine {
    context: ConversationContext,
    config: DialogueConfig,
    analyzers: Vec<Box<dyn Analyzer>>,
    board: TierBoard,
    dialogue: DialogueManager,
    state: ConversationState,
    dispatcher: ActionDispatcher,
    rng: Box<dyn RandomSource>,
}

impl ChatEngine {
    /// Create an engine with only the local tier installed. The local tier
    /// draws its phrasing from a fork of `rng`.
    pub fn new(
        registry: Arc<IntentRegistry>,
        dispatcher: ActionDispatcher,
        context: ConversationContext,
        mut rng: Box<dyn RandomSource>,
    ) -> Self {
        let local = LocalAnalyzer::new(Arc::clone(&registry), rng.fork());
        Self {
            context,
            config: DialogueConfig::default(),
            analyzers: vec![Box::new(local)],
            board: TierBoard::new(),
            dialogue: DialogueManager::new(registry),
            state: ConversationState::new(),
            dispatcher,
            rng,
        }
    }

    /// Install `analyzer`, replacing any analyzer for the same tier.
    pub fn with_analyzer(mut self, analyzer: Box<dyn Analyzer>) -> Self {
        let tier = analyzer.tier();
        self.analyzers.retain(|existing| existing.tier() != tier);
        self.analyzers.push(analyzer);
        self
    }

    pub fn with_dialogue_config(mut self, config: DialogueConfig) -> Self {
        self.config = config;
        self
    }

    pub fn history(&self) -> &[Message] {
        &self.context.history
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn tier_health(&self, tier: Tier) -> TierHealth {
        self.board.health(tier)
    }

    /// Installed tiers in the order the next message would try them.
    pub fn tier_order(&self) -> Vec<Tier> {
        selector::order(&self.available_tiers(), &self.board)
    }

    /// Start the conversation over. Tier health is kept for the session.
    pub fn reset(&mut self) {
        self.state.reset();
        self.context.history.clear();
        tracing::info!("Conversation reset");
    }

    /// One-time availability check of the remote tiers. A failed probe
    /// degrades the tier; a passing probe changes nothing.
    pub async fn probe_tiers(&mut self) {
        for analyzer in &self.analyzers {
            let tier = analyzer.tier();
            if tier == Tier::Local || !self.board.health(tier).is_usable() {
                continue;
            }
            if let Err(err) = analyzer.probe().await {
                tracing::warn!(tier = %tier, error = %err, "Tier probe failed; disabling");
                self.board.record_failure(tier);
            }
        }
    }

    /// Handle one user message and return the assistant reply.
    ///
    /// Never fails: every error path is rendered as a reply.
    pub async fn process_message(&mut self, text: &str) -> Message {
        let (content, action) = match self.run_turn(text).await {
            Ok(reply) => reply,
            Err(ChatError::EmptyMessage) => (EMPTY_MESSAGE_PROMPT.to_string(), None),
            Err(ChatError::MessageTooLong(max)) => (
                format!("⚠️ الرسالة طويلة جداً، الحد الأقصى {} حرف.", max),
                None,
            ),
            Err(err) => {
                tracing::error!(error = %err, "Turn failed");
                (DEFAULT_APOLOGY.to_string(), None)
            }
        };

        let reply = Message::assistant(content, action);
        if !text.trim().is_empty() {
            self.context.history.push(Message::user(text.trim()));
            self.context.history.push(reply.clone());
        }
        reply
    }

    async fn run_turn(&mut self, text: &str) -> Result<(String, Option<Action>), ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let max = self.config.max_message_length;
        if text.chars().count() > max {
            return Err(ChatError::MessageTooLong(max));
        }

        let request = self.build_request(text);
        let analysis = self.analyze(&request).await;
        let plan = self
            .dialogue
            .plan(&mut self.state, &analysis, self.rng.as_mut())?;

        if !plan.dispatch {
            let action = (!plan.missing.is_empty()).then(|| Action::new(plan.intent.action_type()));
            return Ok((plan.reply, action));
        }

        let result = self
            .dispatcher
            .dispatch(plan.intent, &self.context.token, self.state.memory())
            .await;

        let mut reply = plan.reply;
        match &result {
            DispatchResult::NeedsMoreInfo { missing, .. } => {
                self.state.transition(DialoguePhase::Collecting)?;
                let prompts = self
                    .dialogue
                    .follow_ups(plan.intent, missing, self.rng.as_mut());
                for prompt in prompts {
                    reply.push('\n');
                    reply.push_str(&prompt);
                }
            }
            _ => {
                self.state.mark_dispatched()?;
                if let Some(fragment) = result.reply_fragment() {
                    reply.push_str("\n\n");
                    reply.push_str(fragment);
                }
            }
        }

        Ok((reply, result.action().cloned()))
    }

    fn available_tiers(&self) -> Vec<Tier> {
        self.analyzers.iter().map(|a| a.tier()).collect()
    }

    fn build_request(&self, text: &str) -> AnalysisRequest {
        let history = &self.context.history;
        let start = history.len().saturating_sub(self.config.history_turns);
        AnalysisRequest {
            message: text.to_string(),
            history: history[start..].iter().map(HistoryEntry::from).collect(),
            token: self.context.token.clone(),
            user_name: self.context.user_name.clone(),
            context: self.state.snapshot(),
        }
    }

    /// Try tiers best first. A failing tier is degraded and the same request
    /// goes to the next one.
    async fn analyze(&mut self, request: &AnalysisRequest) -> Analysis {
        for tier in selector::order(&self.available_tiers(), &self.board) {
            let Some(analyzer) = self.analyzers.iter().find(|a| a.tier() == tier) else {
                continue;
            };
            match analyzer.analyze(request).await {
                Ok(analysis) => {
                    tracing::debug!(tier = %tier, intent = %analysis.intent, confidence = analysis.confidence, "Message analyzed");
                    self.board.record_success(tier);
                    return analysis;
                }
                Err(err) => {
                    tracing::warn!(tier = %tier, error = %err, "Analysis tier failed; falling back");
                    self.board.record_failure(tier);
                }
            }
        }

        tracing::warn!("No analysis tier answered");
        LocalAnalyzer::default_analysis()
    }
}
