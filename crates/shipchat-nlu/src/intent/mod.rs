//! Intent detection for chat messages.
//!
//! A fixed, injected table of keyword patterns scored against cleaned text.

pub mod classifier;
pub mod patterns;
