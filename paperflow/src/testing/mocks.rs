//! Scripted agents for testing the supervisor.
//!
//! Each agent plays a [`Script`]: a queue of [`Behavior`]s consumed one per
//! call, followed by a default behavior once the queue is empty.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

use crate::agents::{
    replace_numbered_markers, Analyzer, CitationGenerator, PaperGenerator, Retriever, Summarizer,
};
use crate::errors::AgentError;
use crate::models::{
    Analytics, CitationStyle, Citations, Draft, DraftMetadata, PaperRecord, Requirements,
    Section, StructuredSection, Summaries,
};

/// What a scripted agent does on one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Behavior {
    /// Return the agent's canned output.
    Succeed,
    /// Return an error with this message.
    Fail(String),
    /// Never complete.
    Hang,
    /// Panic with this message.
    Panic(String),
    /// Sleep, then return the canned output.
    Delay(Duration),
}

impl Behavior {
    /// Shorthand for [`Behavior::Fail`].
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail(message.into())
    }
}

/// A queue of behaviors with a default for calls past its end.
#[derive(Debug)]
pub struct Script {
    queue: Mutex<VecDeque<Behavior>>,
    then: Behavior,
    calls: Mutex<usize>,
}

impl Default for Script {
    fn default() -> Self {
        Self::always(Behavior::Succeed)
    }
}

impl Script {
    /// Every call behaves the same way.
    #[must_use]
    pub fn always(behavior: Behavior) -> Self {
        Self::sequence([], behavior)
    }

    /// Plays `steps` in order, then `then` forever.
    #[must_use]
    pub fn sequence(steps: impl IntoIterator<Item = Behavior>, then: Behavior) -> Self {
        Self {
            queue: Mutex::new(steps.into_iter().collect()),
            then,
            calls: Mutex::new(0),
        }
    }

    /// Fails `times` times with `message`, then succeeds.
    #[must_use]
    pub fn failing_then_ok(times: usize, message: &str) -> Self {
        Self::sequence(
            std::iter::repeat(Behavior::fail(message)).take(times),
            Behavior::Succeed,
        )
    }

    /// Number of calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }

    /// Consumes the next behavior and acts it out.
    pub async fn play(&self) -> Result<(), AgentError> {
        let behavior = {
            *self.calls.lock() += 1;
            self.queue
                .lock()
                .pop_front()
                .unwrap_or_else(|| self.then.clone())
        };

        match behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail(message) => Err(AgentError::other(message)),
            Behavior::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
            Behavior::Panic(message) => panic!("{message}"),
            Behavior::Delay(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }
}

/// A retriever returning a fixed paper list.
#[derive(Debug, Default)]
pub struct ScriptedRetriever {
    papers: Vec<PaperRecord>,
    script: Script,
    queries: Mutex<Vec<String>>,
}

impl ScriptedRetriever {
    /// Creates a retriever that always returns `papers`.
    #[must_use]
    pub fn new(papers: Vec<PaperRecord>) -> Self {
        Self {
            papers,
            ..Default::default()
        }
    }

    /// Replaces the script.
    #[must_use]
    pub fn with_script(mut self, script: Script) -> Self {
        self.script = script;
        self
    }

    /// Number of calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.script.calls()
    }

    /// Queries seen, in call order.
    #[must_use]
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl Retriever for ScriptedRetriever {
    async fn retrieve(
        &self,
        query: &str,
        _requirements: &Requirements,
    ) -> Result<Vec<PaperRecord>, AgentError> {
        self.queries.lock().push(query.to_string());
        self.script.play().await?;
        Ok(self.papers.clone())
    }
}

/// A summarizer producing a one-line thematic summary.
#[derive(Debug, Default)]
pub struct ScriptedSummarizer {
    script: Script,
}

impl ScriptedSummarizer {
    /// Creates a summarizer playing `script`.
    #[must_use]
    pub fn new(script: Script) -> Self {
        Self { script }
    }

    /// Number of calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.script.calls()
    }
}

#[async_trait]
impl Summarizer for ScriptedSummarizer {
    async fn summarize(&self, papers: &[PaperRecord]) -> Result<Summaries, AgentError> {
        self.script.play().await?;
        Ok(Summaries {
            thematic_summary: format!("Themes across {} papers", papers.len()),
            key_findings: papers
                .iter()
                .map(|p| format!("Finding from {}", p.title_or_default()))
                .collect(),
            ..Default::default()
        })
    }
}

/// A citation generator with separate scripts for generation and marker replacement.
#[derive(Debug, Default)]
pub struct ScriptedCitationGenerator {
    script: Script,
    replace_script: Script,
}

impl ScriptedCitationGenerator {
    /// Creates a generator playing `script` for [`CitationGenerator::generate`].
    #[must_use]
    pub fn new(script: Script) -> Self {
        Self {
            script,
            replace_script: Script::default(),
        }
    }

    /// Sets the script played by each marker replacement call.
    #[must_use]
    pub fn with_replace_script(mut self, script: Script) -> Self {
        self.replace_script = script;
        self
    }

    /// Number of generate calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.script.calls()
    }

    /// Number of replacement calls so far.
    #[must_use]
    pub fn replace_calls(&self) -> usize {
        self.replace_script.calls()
    }
}

#[async_trait]
impl CitationGenerator for ScriptedCitationGenerator {
    async fn generate(
        &self,
        papers: &[PaperRecord],
        _summaries: &Summaries,
    ) -> Result<Citations, AgentError> {
        self.script.play().await?;
        Ok(Citations {
            bibliography: papers
                .iter()
                .map(|p| serde_json::json!({ "title": p.title_or_default() }))
                .collect(),
            ..Default::default()
        })
    }

    async fn replace_placeholders(
        &self,
        text: &str,
        papers: &[PaperRecord],
        style: CitationStyle,
    ) -> Result<String, AgentError> {
        self.replace_script.play().await?;
        Ok(replace_numbered_markers(text, papers, style))
    }
}

/// A paper generator producing a short draft with numbered citation markers.
#[derive(Debug, Default)]
pub struct ScriptedPaperGenerator {
    script: Script,
}

impl ScriptedPaperGenerator {
    /// Creates a generator playing `script`.
    #[must_use]
    pub fn new(script: Script) -> Self {
        Self { script }
    }

    /// Number of calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.script.calls()
    }

    /// The draft returned on success.
    #[must_use]
    pub fn draft_for(query: &str) -> Draft {
        let mut draft = Draft {
            title: format!("{query}: A Review"),
            abstract_text: format!("We survey {query} [1]."),
            metadata: DraftMetadata {
                topic: query.to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        draft.sections.insert(
            "introduction".to_string(),
            Section::from("Prior studies [1, 2] motivate this work."),
        );
        draft.sections.insert(
            "conclusion".to_string(),
            Section::Structured(StructuredSection {
                content: "As shown in [2], results hold.".to_string(),
                ..Default::default()
            }),
        );
        draft.metadata.word_count = draft.word_count();
        draft
    }
}

#[async_trait]
impl PaperGenerator for ScriptedPaperGenerator {
    async fn generate_draft(
        &self,
        query: &str,
        _summaries: &Summaries,
        _citations: &Citations,
        _requirements: &Requirements,
    ) -> Result<Draft, AgentError> {
        self.script.play().await?;
        Ok(Self::draft_for(query))
    }
}

/// An analyzer that reports basic counts.
#[derive(Debug, Default)]
pub struct ScriptedAnalyzer {
    script: Script,
}

impl ScriptedAnalyzer {
    /// Creates an analyzer playing `script`.
    #[must_use]
    pub fn new(script: Script) -> Self {
        Self { script }
    }

    /// Number of calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.script.calls()
    }
}

#[async_trait]
impl Analyzer for ScriptedAnalyzer {
    async fn analyze(&self, draft: &Draft, papers: &[PaperRecord]) -> Result<Analytics, AgentError> {
        self.script.play().await?;
        let mut analytics = Analytics::fallback(draft, papers);
        analytics.recommendations = vec!["Expand the methodology section".to_string()];
        Ok(analytics)
    }
}
