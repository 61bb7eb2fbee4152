//! Testing utilities for paperflow supervisors.
//!
//! This module provides:
//! - Scripted agents that succeed, fail, hang or panic on demand
//! - Sample paper fixtures and a fast retry policy

mod fixtures;
mod mocks;

pub use fixtures::{fast_policy, malformed_paper, sample_paper, sample_papers, TestAgents};
pub use mocks::{
    Behavior, Script, ScriptedAnalyzer, ScriptedCitationGenerator, ScriptedPaperGenerator,
    ScriptedRetriever, ScriptedSummarizer,
};
