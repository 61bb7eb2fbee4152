//! Test fixtures for supervisor testing.

use std::sync::Arc;

use super::mocks::{
    Script, ScriptedAnalyzer, ScriptedCitationGenerator, ScriptedPaperGenerator,
    ScriptedRetriever, ScriptedSummarizer,
};
use crate::config::RetryPolicy;
use crate::models::PaperRecord;
use crate::pipeline::SupervisorBuilder;

/// A well-formed paper numbered `i`.
#[must_use]
pub fn sample_paper(i: usize) -> PaperRecord {
    let year = 2000 + i32::try_from(i % 25).unwrap_or(0);
    PaperRecord::new(format!("Paper {i}"))
        .with_authors([format!("Author{i}"), format!("Coauthor{i}")])
        .with_year(year)
        .with_journal("Journal of Testing")
        .with_doi(format!("10.1000/test.{i}"))
        .with_relevance_score(0.5)
}

/// `n` well-formed papers numbered from 1.
#[must_use]
pub fn sample_papers(n: usize) -> Vec<PaperRecord> {
    (1..=n).map(sample_paper).collect()
}

/// A paper whose authors field is missing entirely.
#[must_use]
pub fn malformed_paper() -> PaperRecord {
    PaperRecord::new("Untitled Preprint").with_year(2022)
}

/// A policy with short delays: 2 retries, 1s base delay, 5s timeout.
#[must_use]
pub fn fast_policy() -> RetryPolicy {
    RetryPolicy::new()
        .with_max_retries(2)
        .with_base_delay_seconds(1.0)
        .with_timeout_seconds(5.0)
}

/// A full set of scripted agents, kept so tests can inspect call counts.
#[derive(Debug, Clone)]
pub struct TestAgents {
    /// Retrieval agent.
    pub retriever: Arc<ScriptedRetriever>,
    /// Summarization agent.
    pub summarizer: Arc<ScriptedSummarizer>,
    /// Citation agent.
    pub citations: Arc<ScriptedCitationGenerator>,
    /// Paper generation agent.
    pub generator: Arc<ScriptedPaperGenerator>,
    /// Analytics agent.
    pub analyzer: Arc<ScriptedAnalyzer>,
}

impl TestAgents {
    /// Agents that all succeed, with the retriever returning `papers`.
    #[must_use]
    pub fn new(papers: Vec<PaperRecord>) -> Self {
        Self {
            retriever: Arc::new(ScriptedRetriever::new(papers)),
            summarizer: Arc::new(ScriptedSummarizer::default()),
            citations: Arc::new(ScriptedCitationGenerator::default()),
            generator: Arc::new(ScriptedPaperGenerator::default()),
            analyzer: Arc::new(ScriptedAnalyzer::default()),
        }
    }

    /// Replaces the retriever.
    #[must_use]
    pub fn with_retriever(mut self, retriever: ScriptedRetriever) -> Self {
        self.retriever = Arc::new(retriever);
        self
    }

    /// Replaces the summarizer script.
    #[must_use]
    pub fn with_summarizer(mut self, script: Script) -> Self {
        self.summarizer = Arc::new(ScriptedSummarizer::new(script));
        self
    }

    /// Replaces the citation generator.
    #[must_use]
    pub fn with_citations(mut self, citations: ScriptedCitationGenerator) -> Self {
        self.citations = Arc::new(citations);
        self
    }

    /// Replaces the paper generator script.
    #[must_use]
    pub fn with_generator(mut self, script: Script) -> Self {
        self.generator = Arc::new(ScriptedPaperGenerator::new(script));
        self
    }

    /// Replaces the analyzer script.
    #[must_use]
    pub fn with_analyzer(mut self, script: Script) -> Self {
        self.analyzer = Arc::new(ScriptedAnalyzer::new(script));
        self
    }

    /// A supervisor builder wired to these agents and [`fast_policy`].
    #[must_use]
    pub fn builder(&self) -> SupervisorBuilder {
        SupervisorBuilder::new()
            .with_retriever(self.retriever.clone())
            .with_summarizer(self.summarizer.clone())
            .with_citation_generator(self.citations.clone())
            .with_paper_generator(self.generator.clone())
            .with_analyzer(self.analyzer.clone())
            .with_retry_policy(fast_policy())
    }
}
