//! Error types for the paperflow supervisor.
//!
//! Collaborators report failures as [`AgentError`]. The retry executor wraps
//! each failed attempt in a [`SupervisorError`], and the orchestration layer
//! turns an exhausted retrieval stage into the single [`FatalRunError`] that
//! callers of `Supervisor::run` ever see.

use crate::core::PipelineStage;
use crate::pipeline::PipelineRun;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

/// An error raised by a collaborator agent.
#[derive(Debug, Error)]
pub enum AgentError {
    /// A network or upstream API failure.
    #[error("network error: {0}")]
    Network(String),

    /// A response could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// The agent rejected its input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Any other failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AgentError {
    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates a catch-all error from a message.
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(anyhow::anyhow!(message.into()))
    }
}

/// Errors produced while supervising stage execution.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// A single attempt exceeded its time budget.
    #[error("{stage} timed out on attempt {attempt} after {timeout_seconds}s")]
    AttemptTimeout {
        /// The stage being attempted.
        stage: PipelineStage,
        /// 1-based attempt number.
        attempt: u32,
        /// The per-attempt budget that was exceeded.
        timeout_seconds: f64,
    },

    /// A single attempt raised an error.
    #[error("{stage} failed on attempt {attempt}: {message}")]
    AttemptFailure {
        /// The stage being attempted.
        stage: PipelineStage,
        /// 1-based attempt number.
        attempt: u32,
        /// The collaborator's message, verbatim.
        message: String,
    },

    /// Every attempt for a stage failed or timed out.
    #[error("{stage} exhausted retries after {attempts} attempts: {last_error}")]
    RetryExhausted {
        /// The stage that gave up.
        stage: PipelineStage,
        /// Total attempts made.
        attempts: u32,
        /// Description of the final attempt's failure.
        last_error: String,
        /// Whether the final attempt timed out.
        timed_out: bool,
    },

    /// A stage returned a result with nothing in it.
    #[error("{stage} returned no results")]
    EmptyResult {
        /// The stage that came back empty.
        stage: PipelineStage,
    },

    /// The retry policy failed validation before any attempt ran.
    #[error("{0}")]
    Config(#[from] ConfigError),
}

impl SupervisorError {
    /// Returns the stage this error refers to, if any.
    #[must_use]
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            Self::AttemptTimeout { stage, .. }
            | Self::AttemptFailure { stage, .. }
            | Self::RetryExhausted { stage, .. }
            | Self::EmptyResult { stage } => Some(*stage),
            Self::Config(_) => None,
        }
    }

    /// Returns true if the error came from a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::AttemptTimeout { .. } | Self::RetryExhausted { timed_out: true, .. }
        )
    }
}

/// The error returned when a run aborts.
#[derive(Debug, Clone, Error, Serialize)]
#[error("pipeline {run_id} failed: {message}")]
pub struct FatalRunError {
    /// The run that aborted.
    pub run_id: String,
    /// The query the run was started with.
    pub query: String,
    /// The last stage that began, or `None` if the run never reached one.
    pub furthest_stage: Option<PipelineStage>,
    /// Human-readable cause.
    pub message: String,
    /// Metrics collected up to the failure.
    pub metrics: PipelineRun,
    /// Seconds between run start and the failure.
    pub elapsed_seconds: f64,
}

impl FatalRunError {
    /// Returns the furthest stage name, or `"initialization"`.
    #[must_use]
    pub fn furthest_stage_name(&self) -> &'static str {
        self.furthest_stage
            .map_or("initialization", |stage| stage.as_str())
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("status".to_string(), serde_json::json!("error"));
        map.insert("pipeline_id".to_string(), serde_json::json!(self.run_id));
        map.insert("query".to_string(), serde_json::json!(self.query));
        map.insert("error".to_string(), serde_json::json!(self.message));
        map.insert(
            "stage".to_string(),
            serde_json::json!(self.furthest_stage_name()),
        );
        map.insert(
            "supervisor_metrics".to_string(),
            serde_json::to_value(&self.metrics).unwrap_or(serde_json::Value::Null),
        );
        map.insert(
            "processing_time".to_string(),
            serde_json::json!(self.elapsed_seconds),
        );
        map
    }
}

/// A paper record that cannot be rendered as a reference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    /// A required field is absent from the record.
    #[error("paper record is missing '{0}'")]
    MissingField(&'static str),
}

/// Configuration and setup errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A retry policy value is out of range.
    #[error("invalid retry policy: {0}")]
    InvalidPolicy(String),

    /// A configuration value is out of range.
    #[error("invalid configuration value for '{key}': {reason}")]
    InvalidValue {
        /// The offending key.
        key: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A configuration file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file could not be parsed.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    /// A required collaborator was not supplied to the builder.
    #[error("missing collaborator: {0}")]
    MissingAgent(&'static str),

    /// The tracing subscriber could not be installed.
    #[error("failed to initialize logging: {0}")]
    Logging(String),
}

impl ConfigError {
    /// Creates an invalid value error.
    #[must_use]
    pub fn invalid_value(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
