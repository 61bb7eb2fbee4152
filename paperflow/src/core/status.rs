//! Pipeline stage and agent status enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unit of work the supervisor drives.
///
/// The first five variants are the pipeline stages proper and are the only
/// values that ever appear in a run's `stages_completed` list. The last two
/// are post-processing sub-steps that get status tracking but are not
/// retried as stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Paper retrieval from external literature sources.
    Retrieval,
    /// Summarization of the retrieved papers.
    Summarization,
    /// Citation generation.
    Citation,
    /// Draft generation.
    Generation,
    /// Analytics over the generated draft.
    Analytics,
    /// Rewriting numbered citation markers in the draft.
    CitationReplacement,
    /// Formatting the reference list.
    ReferenceFormatting,
}

impl PipelineStage {
    /// The five retried stages, in execution order.
    pub const SEQUENCE: [Self; 5] = [
        Self::Retrieval,
        Self::Summarization,
        Self::Citation,
        Self::Generation,
        Self::Analytics,
    ];

    /// Returns the stable string name of the stage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Retrieval => "retrieval",
            Self::Summarization => "summarization",
            Self::Citation => "citation",
            Self::Generation => "generation",
            Self::Analytics => "analytics",
            Self::CitationReplacement => "citation_replacement",
            Self::ReferenceFormatting => "reference_formatting",
        }
    }

    /// Returns true for the post-processing sub-steps.
    #[must_use]
    pub const fn is_sub_step(&self) -> bool {
        matches!(self, Self::CitationReplacement | Self::ReferenceFormatting)
    }

    /// Returns true if exhausting retries on this stage aborts the run.
    #[must_use]
    pub const fn is_fatal_on_exhaustion(&self) -> bool {
        matches!(self, Self::Retrieval)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The status of a collaborator agent for one stage of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Not started.
    Idle,
    /// An attempt is in flight or a retry is pending.
    Running,
    /// The stage produced a result.
    Completed,
    /// The last attempt raised an error.
    Failed,
    /// The last attempt exceeded its time budget.
    Timeout,
}

impl Default for AgentStatus {
    fn default() -> Self {
        Self::Idle
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

impl AgentStatus {
    /// Returns true if the status represents a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Timeout)
    }

    /// Returns true if the status indicates failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display() {
        assert_eq!(PipelineStage::Retrieval.to_string(), "retrieval");
        assert_eq!(PipelineStage::Generation.to_string(), "generation");
        assert_eq!(
            PipelineStage::CitationReplacement.to_string(),
            "citation_replacement"
        );
    }

    #[test]
    fn test_stage_sequence_order() {
        let names: Vec<_> = PipelineStage::SEQUENCE.iter().map(PipelineStage::as_str).collect();
        assert_eq!(
            names,
            vec!["retrieval", "summarization", "citation", "generation", "analytics"]
        );
        assert!(PipelineStage::SEQUENCE.iter().all(|s| !s.is_sub_step()));
    }

    #[test]
    fn test_only_retrieval_is_fatal() {
        let fatal: Vec<_> = PipelineStage::SEQUENCE
            .iter()
            .filter(|s| s.is_fatal_on_exhaustion())
            .collect();
        assert_eq!(fatal, vec![&PipelineStage::Retrieval]);
    }

    #[test]
    fn test_agent_status_display() {
        assert_eq!(AgentStatus::Idle.to_string(), "idle");
        assert_eq!(AgentStatus::Timeout.to_string(), "timeout");
        assert_eq!(AgentStatus::default(), AgentStatus::Idle);
    }

    #[test]
    fn test_agent_status_terminal() {
        assert!(AgentStatus::Completed.is_terminal());
        assert!(AgentStatus::Timeout.is_terminal());
        assert!(!AgentStatus::Running.is_terminal());
        assert!(AgentStatus::Timeout.is_failure());
        assert!(!AgentStatus::Completed.is_failure());
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&PipelineStage::ReferenceFormatting).unwrap();
        assert_eq!(json, r#""reference_formatting""#);

        let status: AgentStatus = serde_json::from_str(r#""running""#).unwrap();
        assert_eq!(status, AgentStatus::Running);
    }
}
