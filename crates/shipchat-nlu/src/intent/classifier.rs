//! Keyword-scoring intent classifier.
//!
//! For every pattern: +1 per keyword phrase contained in the cleaned text,
//! +2 more when a keyword equals the whole text. Confidence is
//! `score / keywords`, clamped to `[0, 1]`. The best pattern wins, earlier
//! patterns win ties. Below [`CONFIDENCE_FLOOR`] the result becomes
//! [`Intent::Info`] at [`FALLBACK_CONFIDENCE`].

use std::sync::Arc;

use serde::Serialize;
use shipchat_core::Intent;

use crate::intent::patterns::{IntentPattern, IntentRegistry};
use crate::normalize::clean_text;

pub const CONFIDENCE_FLOOR: f32 = 0.3;
pub const FALLBACK_CONFIDENCE: f32 = 0.5;
const EXACT_MATCH_BONUS: f32 = 2.0;

/// Result of classifying one message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub intent: Intent,
    pub confidence: f32,
    /// True when no pattern reached the floor and `Info` was substituted.
    pub fallback: bool,
}

/// Score a single pattern against already-cleaned text.
pub fn score_pattern(pattern: &IntentPattern, cleaned: &str) -> f32 {
    if pattern.keywords.is_empty() || cleaned.is_empty() {
        return 0.0;
    }
    let mut score = 0.0;
    for keyword in &pattern.keywords {
        if cleaned.contains(keyword.as_str()) {
            score += 1.0;
            if cleaned == keyword {
                score += EXACT_MATCH_BONUS;
            }
        }
    }
    (score / pattern.keywords.len() as f32).clamp(0.0, 1.0)
}

/// Deterministic classifier over an injected registry.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    registry: Arc<IntentRegistry>,
}

impl IntentClassifier {
    pub fn new(registry: Arc<IntentRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &IntentRegistry {
        &self.registry
    }

    /// Classify raw user text.
    pub fn classify(&self, text: &str) -> Classification {
        self.classify_cleaned(&clean_text(text))
    }

    /// Classify text that already went through [`clean_text`].
    pub fn classify_cleaned(&self, cleaned: &str) -> Classification {
        let mut best: Option<(Intent, f32)> = None;
        for pattern in self.registry.patterns() {
            let confidence = score_pattern(pattern, cleaned);
            // Strictly greater keeps the first-defined pattern on ties.
            if best.is_none_or(|(_, top)| confidence > top) {
                best = Some((pattern.intent, confidence));
            }
        }

        let classification = match best {
            Some((intent, confidence)) if confidence >= CONFIDENCE_FLOOR => Classification {
                intent,
                confidence,
                fallback: false,
            },
            _ => Classification {
                intent: Intent::Info,
                confidence: FALLBACK_CONFIDENCE,
                fallback: true,
            },
        };
        tracing::trace!(
            intent = %classification.intent,
            confidence = classification.confidence,
            fallback = classification.fallback,
            "Classified message"
        );
        classification
    }
}
