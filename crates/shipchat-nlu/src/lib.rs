//! Deterministic language understanding for shipchat.
//!
//! Normalizes Arabic/English text, classifies intents by keyword scoring,
//! extracts typed entities through a compiled table, and holds the
//! per-intent response bank.

pub mod entity;
pub mod intent;
pub mod normalize;
pub mod responses;

pub use entity::{normalize_phone, ExtractorRule, ExtractorTable};
pub use intent::classifier::{Classification, IntentClassifier, CONFIDENCE_FLOOR};
pub use intent::patterns::{IntentPattern, IntentRegistry, CAPABILITY_OVERVIEW};
pub use normalize::{clean_text, normalize_text};
pub use responses::{
    FirstChoice, RandomSource, ResponseBank, SeededRandom, ThreadRandom, DEFAULT_APOLOGY,
};
