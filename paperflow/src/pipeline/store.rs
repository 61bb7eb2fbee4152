//! Concurrent storage for run metrics, stage statuses and the error history.

use super::run::{ErrorKind, ErrorRecord, PipelineRun, RunOutcome, StageStatusRecord};
use crate::core::{AgentStatus, PipelineStage};
use crate::errors::SupervisorError;
use crate::observability::StageTimer;
use crate::utils::now_utc;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::time::Duration;

/// Receives attempt-level notifications from the retry executor.
///
/// Implementations must be cheap and must never block.
pub trait AttemptRecorder: Send + Sync {
    /// A stage is about to run (or run again) for a run.
    fn attempt_started(&self, run_id: &str, stage: PipelineStage, attempt: u32);

    /// An attempt failed or timed out.
    fn attempt_failed(&self, run_id: &str, stage: PipelineStage, error: &SupervisorError);

    /// A retry was scheduled after `delay`.
    fn retry_scheduled(&self, run_id: &str, stage: PipelineStage, attempt: u32, delay: Duration);
}

/// A recorder that discards all notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRecorder;

impl AttemptRecorder for NoopRecorder {
    fn attempt_started(&self, _run_id: &str, _stage: PipelineStage, _attempt: u32) {}

    fn attempt_failed(&self, _run_id: &str, _stage: PipelineStage, _error: &SupervisorError) {}

    fn retry_scheduled(&self, _run_id: &str, _stage: PipelineStage, _attempt: u32, _delay: Duration) {
    }
}

pub(super) struct RunEntry {
    pub(super) run: PipelineRun,
    pub(super) stages: BTreeMap<PipelineStage, StageStatusRecord>,
    pub(super) timer: StageTimer,
}

impl RunEntry {
    pub(super) fn elapsed_seconds(&self) -> f64 {
        self.run
            .total_duration_seconds
            .unwrap_or_else(|| self.timer.elapsed_seconds())
    }
}

/// Shared state for every run a supervisor has started.
///
/// Runs are keyed by id and never evicted. The error history is an
/// append-only log across all runs.
#[derive(Default)]
pub struct RunStore {
    pub(super) runs: DashMap<String, RunEntry>,
    pub(super) history: RwLock<Vec<ErrorRecord>>,
}

impl std::fmt::Debug for RunStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunStore")
            .field("runs", &self.runs.len())
            .field("errors", &self.history.read().len())
            .finish()
    }
}

impl RunStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new run. An existing run with the same id is replaced.
    pub fn begin_run(&self, run_id: &str, query: &str) {
        self.runs.insert(
            run_id.to_string(),
            RunEntry {
                run: PipelineRun::new(run_id, query),
                stages: BTreeMap::new(),
                timer: StageTimer::start(),
            },
        );
    }

    /// Sets a stage's status. Unknown runs are ignored.
    pub fn set_status(&self, run_id: &str, stage: PipelineStage, status: AgentStatus) {
        if let Some(mut entry) = self.runs.get_mut(run_id) {
            if status == AgentStatus::Running && !stage.is_sub_step() {
                entry.run.current_stage = Some(stage);
            }
            entry.stages.insert(stage, StageStatusRecord::now(status));
        }
    }

    /// Returns a stage's current status.
    #[must_use]
    pub fn status_of(&self, run_id: &str, stage: PipelineStage) -> Option<AgentStatus> {
        self.runs
            .get(run_id)
            .and_then(|entry| entry.stages.get(&stage).map(|record| record.status))
    }

    /// Marks a stage as having produced a result.
    pub fn mark_completed(&self, run_id: &str, stage: PipelineStage) {
        if let Some(mut entry) = self.runs.get_mut(run_id) {
            entry.run.mark_completed(stage);
        }
    }

    /// Marks a stage's output as a fallback.
    pub fn mark_degraded(&self, run_id: &str, stage: PipelineStage) {
        if let Some(mut entry) = self.runs.get_mut(run_id) {
            entry.run.mark_degraded(stage);
        }
    }

    /// Records how many papers retrieval produced.
    pub fn set_total_papers(&self, run_id: &str, count: usize) {
        if let Some(mut entry) = self.runs.get_mut(run_id) {
            entry.run.total_papers = count;
        }
    }

    /// Increments the retry counter.
    pub fn increment_retries(&self, run_id: &str) {
        if let Some(mut entry) = self.runs.get_mut(run_id) {
            entry.run.retries += 1;
        }
    }

    /// Appends an error to the run and to the global history.
    pub fn record_error(
        &self,
        run_id: &str,
        stage: Option<PipelineStage>,
        kind: ErrorKind,
        attempt: Option<u32>,
        message: impl Into<String>,
    ) -> ErrorRecord {
        let mut record = ErrorRecord {
            timestamp: now_utc(),
            run_id: run_id.to_string(),
            stage,
            kind,
            attempt,
            message: message.into(),
            elapsed_seconds: 0.0,
        };

        if let Some(mut entry) = self.runs.get_mut(run_id) {
            record.elapsed_seconds = entry.elapsed_seconds();
            entry.run.errors.push(record.clone());
        }
        self.history.write().push(record.clone());
        record
    }

    /// Terminates a run and returns its final metrics.
    pub fn finish_run(&self, run_id: &str, outcome: RunOutcome) -> Option<PipelineRun> {
        let mut entry = self.runs.get_mut(run_id)?;
        if !entry.run.is_terminated() {
            let elapsed = entry.timer.elapsed_seconds();
            entry.run.total_duration_seconds = Some(elapsed);
            entry.run.outcome = outcome;
        }
        Some(entry.run.clone())
    }

    /// Returns a copy of a run's metrics.
    #[must_use]
    pub fn snapshot(&self, run_id: &str) -> Option<PipelineRun> {
        self.runs.get(run_id).map(|entry| entry.run.clone())
    }

    /// Seconds since a run started, or its total duration once terminated.
    #[must_use]
    pub fn elapsed_seconds(&self, run_id: &str) -> Option<f64> {
        self.runs.get(run_id).map(|entry| entry.elapsed_seconds())
    }

    /// Returns every run id in the store.
    #[must_use]
    pub fn run_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.runs.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Returns a copy of the global error history in insertion order.
    #[must_use]
    pub fn error_history(&self) -> Vec<ErrorRecord> {
        self.history.read().clone()
    }

    /// Returns the error history entries for one run.
    #[must_use]
    pub fn errors_for_run(&self, run_id: &str) -> Vec<ErrorRecord> {
        self.history
            .read()
            .iter()
            .filter(|record| record.run_id == run_id)
            .cloned()
            .collect()
    }

    /// Number of runs in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// Returns true if no run was ever started.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

impl AttemptRecorder for RunStore {
    fn attempt_started(&self, run_id: &str, stage: PipelineStage, _attempt: u32) {
        self.set_status(run_id, stage, AgentStatus::Running);
    }

    fn attempt_failed(&self, run_id: &str, stage: PipelineStage, error: &SupervisorError) {
        let (status, kind, attempt, message) = match error {
            SupervisorError::AttemptTimeout {
                attempt,
                timeout_seconds,
                ..
            } => (
                AgentStatus::Timeout,
                ErrorKind::Timeout,
                Some(*attempt),
                format!("Timeout on attempt {attempt} after {timeout_seconds}s"),
            ),
            SupervisorError::AttemptFailure {
                attempt, message, ..
            } => (
                AgentStatus::Failed,
                ErrorKind::Failure,
                Some(*attempt),
                message.clone(),
            ),
            other => (
                AgentStatus::Failed,
                ErrorKind::Failure,
                None,
                other.to_string(),
            ),
        };
        self.set_status(run_id, stage, status);
        self.record_error(run_id, Some(stage), kind, attempt, message);
    }

    fn retry_scheduled(&self, run_id: &str, _stage: PipelineStage, _attempt: u32, _delay: Duration) {
        self.increment_retries(run_id);
    }
}
