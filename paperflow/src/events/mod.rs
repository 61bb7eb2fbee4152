//! Lifecycle event sinks.
//!
//! The supervisor reports run and stage transitions to an [`EventSink`].
//! The default sink discards everything; [`LoggingEventSink`] forwards to
//! `tracing`, and [`CollectingEventSink`] keeps events in memory for tests.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

/// Event type names emitted by the supervisor.
pub mod event_types {
    /// A run began.
    pub const PIPELINE_STARTED: &str = "pipeline.started";
    /// A run finished with a result.
    pub const PIPELINE_COMPLETED: &str = "pipeline.completed";
    /// A run aborted.
    pub const PIPELINE_FAILED: &str = "pipeline.failed";
    /// A stage began its first attempt.
    pub const STAGE_STARTED: &str = "stage.started";
    /// A stage produced a result.
    pub const STAGE_COMPLETED: &str = "stage.completed";
    /// A stage attempt failed and another is scheduled.
    pub const STAGE_RETRY: &str = "stage.retry";
    /// A stage exhausted retries and a fallback was substituted.
    pub const STAGE_FALLBACK: &str = "stage.fallback";
    /// A stage exhausted retries with no fallback.
    pub const STAGE_FAILED: &str = "stage.failed";
}
