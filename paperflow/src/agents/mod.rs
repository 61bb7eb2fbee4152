//! Collaborator traits the supervisor drives.
//!
//! Each pipeline stage is backed by an "agent" exposing one async
//! capability. The supervisor holds them as trait objects, so any type
//! satisfying the signature can be plugged in.

mod placeholders;

pub use placeholders::{in_text_citation, replace_numbered_markers};

use crate::errors::AgentError;
use crate::models::{
    Analytics, Citations, CitationStyle, Draft, PaperRecord, Requirements, Summaries,
};
use async_trait::async_trait;

/// Retrieves papers for a query.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Queries literature sources and returns matching papers.
    async fn retrieve(
        &self,
        query: &str,
        requirements: &Requirements,
    ) -> Result<Vec<PaperRecord>, AgentError>;
}

/// Summarizes a set of papers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarizes the papers. Must accept an empty slice.
    async fn summarize(&self, papers: &[PaperRecord]) -> Result<Summaries, AgentError>;
}

/// Generates citations and rewrites citation markers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CitationGenerator: Send + Sync {
    /// Builds the citation structures for the papers.
    async fn generate(
        &self,
        papers: &[PaperRecord],
        summaries: &Summaries,
    ) -> Result<Citations, AgentError>;

    /// Rewrites numbered markers such as `[1]` or `[2, 3]` in `text` into
    /// in-text citations for `style`.
    async fn replace_placeholders(
        &self,
        text: &str,
        papers: &[PaperRecord],
        style: CitationStyle,
    ) -> Result<String, AgentError> {
        Ok(replace_numbered_markers(text, papers, style))
    }
}

/// Generates the paper draft.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaperGenerator: Send + Sync {
    /// Drafts a paper from the summaries and citations.
    async fn generate_draft(
        &self,
        query: &str,
        summaries: &Summaries,
        citations: &Citations,
        requirements: &Requirements,
    ) -> Result<Draft, AgentError>;
}

/// Computes analytics over the draft.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Analyzes the draft against its source papers.
    async fn analyze(&self, draft: &Draft, papers: &[PaperRecord]) -> Result<Analytics, AgentError>;
}
