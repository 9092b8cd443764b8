//! Greedy pattern application with fixed-point iteration.

pub mod engine;

pub use engine::apply_patterns_greedily;
