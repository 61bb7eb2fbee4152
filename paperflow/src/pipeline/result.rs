//! The value a successful run returns.

use super::run::PipelineRun;
use crate::models::{Analytics, Citations, Draft, PaperRecord, ReferenceEntry, Summaries};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Everything a completed run produced.
///
/// Stages that exhausted their retries contribute fallback content; they
/// are listed in `metrics.degraded_stages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Run identifier.
    pub run_id: String,
    /// The query the run was started with.
    pub query: String,
    /// Retrieved papers.
    pub papers: Vec<PaperRecord>,
    /// Summarization output.
    pub summaries: Summaries,
    /// Citation output.
    pub citations: Citations,
    /// Draft with citation markers replaced.
    pub draft: Draft,
    /// Analytics over the draft.
    pub analytics: Analytics,
    /// Formatted reference list.
    pub references: Vec<ReferenceEntry>,
    /// Final run metrics.
    pub metrics: PipelineRun,
    /// Total run time in seconds.
    pub processing_time_seconds: f64,
}

impl PipelineResult {
    /// Returns true if any stage fell back to a skeleton result.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.metrics.degraded_stages.is_empty() || self.references.iter().any(|r| r.degraded)
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        fn value<T: Serialize>(v: &T) -> serde_json::Value {
            serde_json::to_value(v).unwrap_or(serde_json::Value::Null)
        }

        let mut map = HashMap::new();
        map.insert("status".to_string(), serde_json::json!("completed"));
        map.insert("pipeline_id".to_string(), serde_json::json!(self.run_id));
        map.insert("query".to_string(), serde_json::json!(self.query));
        map.insert("papers".to_string(), value(&self.papers));
        map.insert("summaries".to_string(), value(&self.summaries));
        map.insert("citations".to_string(), value(&self.citations));
        map.insert("paper".to_string(), value(&self.draft));
        map.insert("analytics".to_string(), value(&self.analytics));
        map.insert("references".to_string(), value(&self.references));
        map.insert("supervisor_metrics".to_string(), value(&self.metrics));
        map.insert(
            "processing_time".to_string(),
            serde_json::json!(self.processing_time_seconds),
        );
        map
    }
}
