//! Core domain enums for paperflow.
//!
//! This module contains the closed set of pipeline stages and the status
//! values a stage moves through while the supervisor drives it.

mod status;

pub use status::{AgentStatus, PipelineStage};
