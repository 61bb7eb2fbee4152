//! Run status and process-wide health projections over the [`RunStore`].

use super::run::{ErrorRecord, PipelineRun, StageStatusRecord};
use super::store::RunStore;
use crate::core::{AgentStatus, PipelineStage};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Status of one run at the time of the call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatusReport {
    /// Run identifier.
    pub run_id: String,
    /// Latest status per stage.
    pub stage_statuses: BTreeMap<PipelineStage, StageStatusRecord>,
    /// Metrics snapshot.
    pub metrics: PipelineRun,
    /// Seconds since the run started, or the total once terminated.
    pub elapsed_seconds: f64,
    /// Error history records belonging to this run.
    pub error_history: Vec<ErrorRecord>,
}

impl RunStatusReport {
    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("pipeline_id".to_string(), serde_json::json!(self.run_id));
        map.insert(
            "agent_status".to_string(),
            serde_json::to_value(&self.stage_statuses).unwrap_or(serde_json::Value::Null),
        );
        map.insert(
            "metrics".to_string(),
            serde_json::to_value(&self.metrics).unwrap_or(serde_json::Value::Null),
        );
        map.insert(
            "elapsed_time".to_string(),
            serde_json::json!(self.elapsed_seconds),
        );
        map.insert(
            "error_history".to_string(),
            serde_json::to_value(&self.error_history).unwrap_or(serde_json::Value::Null),
        );
        map
    }
}

/// Aggregates across every run the store has seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemHealth {
    /// Runs ever started.
    pub total_pipelines: usize,
    /// Runs with zero recorded errors.
    pub successful_pipelines: usize,
    /// `successful_pipelines / total_pipelines`, 0.0 with no runs.
    pub success_rate: f64,
    /// Length of the global error history.
    pub total_errors: usize,
    /// Runs with at least one stage currently running.
    pub active_pipelines: usize,
    /// Mean total duration of terminated runs, 0.0 if none.
    pub average_processing_time: f64,
}

impl SystemHealth {
    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert(
            "total_pipelines".to_string(),
            serde_json::json!(self.total_pipelines),
        );
        map.insert(
            "successful_pipelines".to_string(),
            serde_json::json!(self.successful_pipelines),
        );
        map.insert("success_rate".to_string(), serde_json::json!(self.success_rate));
        map.insert("total_errors".to_string(), serde_json::json!(self.total_errors));
        map.insert(
            "active_pipelines".to_string(),
            serde_json::json!(self.active_pipelines),
        );
        map.insert(
            "average_processing_time".to_string(),
            serde_json::json!(self.average_processing_time),
        );
        map
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(numerator: f64, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator / denominator as f64
    }
}

impl RunStore {
    /// Builds the status report for one run.
    #[must_use]
    pub fn run_status(&self, run_id: &str) -> Option<RunStatusReport> {
        let (stage_statuses, metrics, elapsed_seconds) = {
            let entry = self.runs.get(run_id)?;
            (entry.stages.clone(), entry.run.clone(), entry.elapsed_seconds())
        };

        Some(RunStatusReport {
            run_id: run_id.to_string(),
            stage_statuses,
            metrics,
            elapsed_seconds,
            error_history: self.errors_for_run(run_id),
        })
    }

    /// Computes process-wide health.
    #[must_use]
    pub fn system_health(&self) -> SystemHealth {
        let mut health = SystemHealth::default();
        let mut durations = Vec::new();

        for entry in &self.runs {
            health.total_pipelines += 1;
            if entry.run.is_error_free() {
                health.successful_pipelines += 1;
            }
            if entry
                .stages
                .values()
                .any(|record| record.status == AgentStatus::Running)
            {
                health.active_pipelines += 1;
            }
            if let Some(duration) = entry.run.total_duration_seconds {
                durations.push(duration);
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let successful = health.successful_pipelines as f64;
        health.success_rate = ratio(successful, health.total_pipelines);
        health.total_errors = self.history.read().len();
        health.average_processing_time = ratio(durations.iter().sum(), durations.len());
        health
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{ErrorKind, RunOutcome};

    #[test]
    fn test_empty_store_health() {
        let health = RunStore::new().system_health();
        assert_eq!(health, SystemHealth::default());
        assert!(health.success_rate.abs() < f64::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn test_health_aggregates() {
        let store = RunStore::new();
        store.begin_run("clean", "q");
        store.begin_run("broken", "q");
        store.begin_run("active", "q");

        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        store.finish_run("clean", RunOutcome::Succeeded);
        store.record_error("broken", None, ErrorKind::Fatal, None, "no papers");
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        store.finish_run("broken", RunOutcome::Failed);
        store.set_status("active", PipelineStage::Citation, AgentStatus::Running);

        let health = store.system_health();
        assert_eq!(health.total_pipelines, 3);
        assert_eq!(health.successful_pipelines, 2);
        assert_eq!(health.total_errors, 1);
        assert_eq!(health.active_pipelines, 1);
        assert!((health.success_rate - 2.0 / 3.0).abs() < 1e-9);
        assert!((health.average_processing_time - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_run_status_report() {
        let store = RunStore::new();
        store.begin_run("run", "q");
        store.set_status("run", PipelineStage::Retrieval, AgentStatus::Completed);
        store.record_error(
            "run",
            Some(PipelineStage::Summarization),
            ErrorKind::Failure,
            Some(1),
            "boom",
        );

        let report = store.run_status("run").unwrap();
        assert_eq!(
            report.stage_statuses[&PipelineStage::Retrieval].status,
            AgentStatus::Completed
        );
        assert_eq!(report.error_history.len(), 1);
        assert_eq!(report.metrics.errors.len(), 1);

        let dict = report.to_dict();
        assert_eq!(dict["pipeline_id"], "run");
        assert_eq!(dict["agent_status"]["retrieval"]["status"], "completed");
        assert!(store.run_status("unknown").is_none());
    }

    #[test]
    fn test_health_to_dict() {
        let dict = SystemHealth {
            total_pipelines: 4,
            successful_pipelines: 4,
            success_rate: 1.0,
            ..Default::default()
        }
        .to_dict();
        assert_eq!(dict["success_rate"], 1.0);
        assert_eq!(dict["total_pipelines"], 4);
    }
}
