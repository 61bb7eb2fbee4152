//! # Paperflow
//!
//! Supervised orchestration for a research paper generation pipeline.
//!
//! A [`Supervisor`](pipeline::Supervisor) drives five dependent stages
//! (retrieval, summarization, citation, generation, analytics) plus two
//! post-processing sub-steps, each backed by a pluggable agent. It provides:
//!
//! - **Bounded attempts**: every agent call runs under a per-attempt timeout
//!   and is retried with backoff
//! - **Partial-failure tolerance**: stages after retrieval fall back to a
//!   well-formed skeleton instead of aborting the run
//! - **Monitoring**: per-run stage statuses, metrics and a process-wide
//!   error history, queryable while runs are in flight
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use paperflow::prelude::*;
//! use std::sync::Arc;
//!
//! let supervisor = Supervisor::builder()
//!     .with_retriever(Arc::new(MyRetriever::new()))
//!     .with_summarizer(Arc::new(MySummarizer::new()))
//!     .with_citation_generator(Arc::new(MyCitations::new()))
//!     .with_paper_generator(Arc::new(MyGenerator::new()))
//!     .with_analyzer(Arc::new(MyAnalyzer::new()))
//!     .with_config(SupervisorConfig::load(None)?)
//!     .build()?;
//!
//! let result = supervisor.run("graph neural networks", &Requirements::default()).await?;
//! println!("{} references", result.references.len());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod agents;
pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod models;
pub mod observability;
pub mod pipeline;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::agents::{Analyzer, CitationGenerator, PaperGenerator, Retriever, Summarizer};
    pub use crate::config::{BackoffStrategy, JitterStrategy, RetryPolicy, SupervisorConfig};
    pub use crate::core::{AgentStatus, PipelineStage};
    pub use crate::errors::{AgentError, ConfigError, FatalRunError, SupervisorError};
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::models::{
        Analytics, CitationStyle, Citations, Draft, PaperRecord, ReferenceEntry, Requirements,
        Section, Summaries,
    };
    pub use crate::observability::{init_tracing, LogFormat};
    pub use crate::pipeline::{
        ErrorKind, ErrorRecord, PipelineResult, PipelineRun, RunOutcome, RunStatusReport,
        Supervisor, SupervisorBuilder, SystemHealth,
    };
    pub use crate::utils::{iso_timestamp, Timestamp};
}
