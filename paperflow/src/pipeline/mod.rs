//! Pipeline supervision.
//!
//! This module provides:
//! - The retry/timeout executor
//! - The concurrent run store and per-run records
//! - Reference formatting
//! - The supervisor that sequences the stages
//! - Run status and system health reports

mod health;
mod references;
mod result;
mod retry;
mod run;
mod store;
mod supervisor;


pub use health::{RunStatusReport, SystemHealth};
pub use references::{author_label, format_reference, format_references};
pub use result::PipelineResult;
pub use retry::execute_with_policy;
pub use run::{ErrorKind, ErrorRecord, PipelineRun, RunOutcome, StageStatusRecord};
pub use store::{AttemptRecorder, NoopRecorder, RunStore};
pub use supervisor::{Supervisor, SupervisorBuilder};
