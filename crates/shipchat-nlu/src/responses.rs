//! Response bank and the random source used to vary phrasing.
//!
//! Template choice is the only non-deterministic step in the engine, so the
//! randomness is injected: production uses [`ThreadRandom`], tests use
//! [`SeededRandom`] or [`FirstChoice`].

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shipchat_core::{Field, Intent};

use crate::intent::patterns::{IntentRegistry, CAPABILITY_OVERVIEW};

/// Reply used when nothing better can be produced.
pub const DEFAULT_APOLOGY: &str =
    "😔 عذراً، لم أتمكن من معالجة طلبك الآن. حاول مرة أخرى أو اكتب \"مساعدة\" لمعرفة ما أستطيع فعله.";

/// Picks an index into a list of alternatives.
pub trait RandomSource: Send {
    /// Return an index in `0..len`. Only called with `len > 0`.
    fn pick_index(&mut self, len: usize) -> usize;

    /// An independent source for another component. Seeded sources derive
    /// the child seed from their own stream, so a seeded parent gives
    /// reproducible children.
    fn fork(&mut self) -> Box<dyn RandomSource>;
}

/// Thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn pick_index(&mut self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }

    fn fork(&mut self) -> Box<dyn RandomSource> {
        Box::new(ThreadRandom)
    }
}

/// Reproducible RNG for tests and replays.
#[derive(Debug, Clone)]
pub struct SeededRandom(StdRng);

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl RandomSource for SeededRandom {
    fn pick_index(&mut self, len: usize) -> usize {
        self.0.random_range(0..len)
    }

    fn fork(&mut self) -> Box<dyn RandomSource> {
        Box::new(SeededRandom::new(self.0.random()))
    }
}

/// Always the first alternative.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstChoice;

impl RandomSource for FirstChoice {
    fn pick_index(&mut self, _len: usize) -> usize {
        0
    }

    fn fork(&mut self) -> Box<dyn RandomSource> {
        Box::new(FirstChoice)
    }
}

/// Pick one of `options`, or `None` when empty.
pub fn choose<'a>(rng: &mut dyn RandomSource, options: &'a [String]) -> Option<&'a str> {
    if options.is_empty() {
        return None;
    }
    let index = rng.pick_index(options.len()).min(options.len() - 1);
    Some(options[index].as_str())
}

/// Per-intent templates drawn from the pattern registry.
#[derive(Debug, Clone)]
pub struct ResponseBank {
    registry: Arc<IntentRegistry>,
}

impl ResponseBank {
    pub fn new(registry: Arc<IntentRegistry>) -> Self {
        Self { registry }
    }

    /// Base reply for `intent`; the capability overview when the intent has
    /// no templates.
    pub fn base(&self, intent: Intent, rng: &mut dyn RandomSource) -> String {
        self.registry
            .get(intent)
            .and_then(|p| choose(rng, &p.responses))
            .unwrap_or(CAPABILITY_OVERVIEW)
            .to_string()
    }

    /// Reply once every required slot of `intent` is filled.
    pub fn ready(&self, intent: Intent, rng: &mut dyn RandomSource) -> Option<String> {
        self.registry
            .get(intent)
            .and_then(|p| choose(rng, &p.ready))
            .map(str::to_string)
    }

    /// One prompt asking for `field` while collecting slots for `intent`.
    pub fn follow_up(
        &self,
        intent: Intent,
        field: Field,
        rng: &mut dyn RandomSource,
    ) -> Option<String> {
        self.registry
            .get(intent)
            .and_then(|p| p.follow_up.get(&field))
            .and_then(|prompts| choose(rng, prompts))
            .map(str::to_string)
    }

    pub fn registry(&self) -> &IntentRegistry {
        &self.registry
    }
}
