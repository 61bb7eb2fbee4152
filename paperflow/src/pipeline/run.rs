//! Per-run records: metrics, stage statuses and error records.

use crate::core::{AgentStatus, PipelineStage};
use crate::utils::{now_utc, Timestamp};
use serde::{Deserialize, Serialize};

/// How a run ended, or that it has not yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Still executing.
    #[default]
    Running,
    /// Returned a result (possibly with fallback content).
    Succeeded,
    /// Aborted with a fatal error.
    Failed,
}

/// What kind of failure an [`ErrorRecord`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// An attempt exceeded its time budget.
    Timeout,
    /// An attempt raised an error.
    Failure,
    /// The run aborted.
    Fatal,
}

/// A failure recorded for monitoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// When the failure was recorded.
    pub timestamp: Timestamp,
    /// The owning run.
    pub run_id: String,
    /// The stage that failed; `None` if the run had not reached a stage.
    pub stage: Option<PipelineStage>,
    /// Failure kind.
    pub kind: ErrorKind,
    /// 1-based attempt number for attempt failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt: Option<u32>,
    /// Human-readable message.
    pub message: String,
    /// Seconds since the run started.
    pub elapsed_seconds: f64,
}

/// Latest status of one stage of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageStatusRecord {
    /// Current status.
    pub status: AgentStatus,
    /// Time of the last transition.
    pub updated_at: Timestamp,
}

impl StageStatusRecord {
    /// Creates a record stamped now.
    #[must_use]
    pub fn now(status: AgentStatus) -> Self {
        Self {
            status,
            updated_at: now_utc(),
        }
    }
}

/// Metrics for one execution of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRun {
    /// Run identifier.
    pub run_id: String,
    /// The query the run was started with.
    pub query: String,
    /// Wall-clock start time.
    pub started_at: Timestamp,
    /// Total duration, set once the run terminates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration_seconds: Option<f64>,
    /// Stages that returned a result, in order.
    pub stages_completed: Vec<PipelineStage>,
    /// Stages whose result is a fallback skeleton.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded_stages: Vec<PipelineStage>,
    /// Every failure recorded for this run.
    pub errors: Vec<ErrorRecord>,
    /// Retry attempts scheduled across all stages.
    pub retries: u32,
    /// Papers retrieved.
    pub total_papers: usize,
    /// The last stage that began.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_stage: Option<PipelineStage>,
    /// Run outcome.
    pub outcome: RunOutcome,
}

impl PipelineRun {
    /// Creates a fresh run record.
    #[must_use]
    pub fn new(run_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            query: query.into(),
            started_at: now_utc(),
            total_duration_seconds: None,
            stages_completed: Vec::new(),
            degraded_stages: Vec::new(),
            errors: Vec::new(),
            retries: 0,
            total_papers: 0,
            current_stage: None,
            outcome: RunOutcome::Running,
        }
    }

    /// Records a stage as having produced a result. Sub-steps and repeats are ignored.
    pub fn mark_completed(&mut self, stage: PipelineStage) {
        if !stage.is_sub_step() && !self.stages_completed.contains(&stage) {
            self.stages_completed.push(stage);
        }
    }

    /// Records that a stage's output is a fallback.
    pub fn mark_degraded(&mut self, stage: PipelineStage) {
        if !self.degraded_stages.contains(&stage) {
            self.degraded_stages.push(stage);
        }
    }

    /// Returns true once the run has succeeded or failed.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.outcome != RunOutcome::Running
    }

    /// Returns true if no failure was ever recorded for the run.
    #[must_use]
    pub fn is_error_free(&self) -> bool {
        self.errors.is_empty()
    }
}
