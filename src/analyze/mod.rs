// src/analyze/mod.rs
//! Optional enhancement layer on top of the heuristic classifier.

pub mod ai_adapter;

pub use ai_adapter::{AiAssessment, AiEnhancer, DynAiEnhancer};
