//! The supervisor: drives one run through every stage.

use super::health::{RunStatusReport, SystemHealth};
use super::references::format_references;
use super::result::PipelineResult;
use super::retry::{execute_with_policy, panic_message};
use super::run::{ErrorKind, ErrorRecord, PipelineRun, RunOutcome};
use super::store::{AttemptRecorder, RunStore};
use crate::agents::{Analyzer, CitationGenerator, PaperGenerator, Retriever, Summarizer};
use crate::config::{RetryPolicy, SupervisorConfig};
use crate::core::{AgentStatus, PipelineStage};
use crate::errors::{AgentError, ConfigError, FatalRunError, SupervisorError};
use crate::events::{event_types, EventSink, NoOpEventSink};
use crate::models::{
    Analytics, CitationStyle, Citations, Draft, PaperRecord, Requirements, Summaries,
};
use crate::utils::generate_run_id;
use futures::FutureExt;
use serde_json::json;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Builder for [`Supervisor`].
#[derive(Default)]
pub struct SupervisorBuilder {
    retriever: Option<Arc<dyn Retriever>>,
    summarizer: Option<Arc<dyn Summarizer>>,
    citations: Option<Arc<dyn CitationGenerator>>,
    generator: Option<Arc<dyn PaperGenerator>>,
    analyzer: Option<Arc<dyn Analyzer>>,
    config: SupervisorConfig,
    store: Option<Arc<RunStore>>,
    events: Option<Arc<dyn EventSink>>,
}

impl SupervisorBuilder {
    /// Creates an empty builder with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the retrieval agent.
    #[must_use]
    pub fn with_retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Sets the summarization agent.
    #[must_use]
    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Sets the citation agent.
    #[must_use]
    pub fn with_citation_generator(mut self, citations: Arc<dyn CitationGenerator>) -> Self {
        self.citations = Some(citations);
        self
    }

    /// Sets the paper generation agent.
    #[must_use]
    pub fn with_paper_generator(mut self, generator: Arc<dyn PaperGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Sets the analytics agent.
    #[must_use]
    pub fn with_analyzer(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Replaces the whole configuration.
    #[must_use]
    pub fn with_config(mut self, config: SupervisorConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces only the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    /// Uses an existing run store instead of a fresh one.
    #[must_use]
    pub fn with_store(mut self, store: Arc<RunStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the lifecycle event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    /// Validates the configuration and builds the supervisor.
    pub fn build(self) -> Result<Supervisor, ConfigError> {
        self.config.validate()?;
        Ok(Supervisor {
            retriever: self.retriever.ok_or(ConfigError::MissingAgent("retriever"))?,
            summarizer: self
                .summarizer
                .ok_or(ConfigError::MissingAgent("summarizer"))?,
            citations: self
                .citations
                .ok_or(ConfigError::MissingAgent("citation generator"))?,
            generator: self
                .generator
                .ok_or(ConfigError::MissingAgent("paper generator"))?,
            analyzer: self.analyzer.ok_or(ConfigError::MissingAgent("analyzer"))?,
            config: Arc::new(self.config),
            store: self.store.unwrap_or_default(),
            events: self.events.unwrap_or_else(|| Arc::new(NoOpEventSink)),
        })
    }
}

/// Sequences the five pipeline stages and their sub-steps.
///
/// A supervisor is shared across concurrent runs through `&self`. Each run
/// owns its own record in the [`RunStore`]; the configuration is read-only.
///
/// Only a retrieval failure aborts a run. Every later stage that exhausts
/// its retries is replaced by a fallback skeleton so the run always returns
/// a complete [`PipelineResult`].
pub struct Supervisor {
    retriever: Arc<dyn Retriever>,
    summarizer: Arc<dyn Summarizer>,
    citations: Arc<dyn CitationGenerator>,
    generator: Arc<dyn PaperGenerator>,
    analyzer: Arc<dyn Analyzer>,
    config: Arc<SupervisorConfig>,
    store: Arc<RunStore>,
    events: Arc<dyn EventSink>,
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("config", &self.config)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl Supervisor {
    /// Starts building a supervisor.
    #[must_use]
    pub fn builder() -> SupervisorBuilder {
        SupervisorBuilder::new()
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// The run store backing this supervisor.
    #[must_use]
    pub fn store(&self) -> &Arc<RunStore> {
        &self.store
    }

    /// Executes the full pipeline for `query`.
    ///
    /// # Errors
    ///
    /// Returns [`FatalRunError`] if retrieval exhausts its retries, or
    /// returns no papers while `empty_retrieval_is_fatal` is set.
    pub async fn run(
        &self,
        query: &str,
        requirements: &Requirements,
    ) -> Result<PipelineResult, FatalRunError> {
        let run_id = generate_run_id();
        self.store.begin_run(&run_id, query);

        info!(run_id = %run_id, query, "Supervisor starting pipeline");
        self.emit(
            event_types::PIPELINE_STARTED,
            json!({ "run_id": run_id, "query": query }),
        );

        let style = requirements.citation_style_or(self.config.default_citation_style);

        let papers = self.retrieve(&run_id, query, requirements).await?;

        let summaries = self
            .run_or_fallback(
                &run_id,
                PipelineStage::Summarization,
                || self.summarizer.summarize(&papers),
                || Summaries::fallback(papers.len()),
            )
            .await;

        let citations = self
            .run_or_fallback(
                &run_id,
                PipelineStage::Citation,
                || self.citations.generate(&papers, &summaries),
                Citations::default,
            )
            .await;

        let draft = self
            .run_or_fallback(
                &run_id,
                PipelineStage::Generation,
                || {
                    self.generator
                        .generate_draft(query, &summaries, &citations, requirements)
                },
                || Draft::fallback(query),
            )
            .await;

        let draft = self.replace_citations(&run_id, draft, &papers, style).await;

        let analytics = self
            .run_or_fallback(
                &run_id,
                PipelineStage::Analytics,
                || self.analyzer.analyze(&draft, &papers),
                || Analytics::fallback(&draft, &papers),
            )
            .await;

        self.store
            .set_status(&run_id, PipelineStage::ReferenceFormatting, AgentStatus::Running);
        let references =
            format_references(&papers, &citations, style, self.config.max_references);
        let degraded = references.iter().filter(|r| r.degraded).count();
        if degraded > 0 {
            warn!(run_id = %run_id, degraded, "Some references could not be formatted");
        }
        self.store.set_status(
            &run_id,
            PipelineStage::ReferenceFormatting,
            AgentStatus::Completed,
        );

        let metrics = self
            .store
            .finish_run(&run_id, RunOutcome::Succeeded)
            .unwrap_or_else(|| PipelineRun::new(run_id.as_str(), query));
        let processing_time_seconds = metrics.total_duration_seconds.unwrap_or_default();

        info!(
            run_id = %run_id,
            processing_time = processing_time_seconds,
            retries = metrics.retries,
            degraded_stages = metrics.degraded_stages.len(),
            "Pipeline completed"
        );
        self.emit(
            event_types::PIPELINE_COMPLETED,
            json!({
                "run_id": run_id,
                "processing_time": processing_time_seconds,
                "retries": metrics.retries,
            }),
        );

        Ok(PipelineResult {
            run_id,
            query: query.to_string(),
            papers,
            summaries,
            citations,
            draft,
            analytics,
            references,
            metrics,
            processing_time_seconds,
        })
    }

    /// Status of one run, or `None` for an unknown id.
    #[must_use]
    pub fn get_run_status(&self, run_id: &str) -> Option<RunStatusReport> {
        self.store.run_status(run_id)
    }

    /// Aggregates across every run this supervisor's store has seen.
    #[must_use]
    pub fn get_system_health(&self) -> SystemHealth {
        self.store.system_health()
    }

    /// Every run id in the store.
    #[must_use]
    pub fn run_ids(&self) -> Vec<String> {
        self.store.run_ids()
    }

    /// The process-wide error history.
    #[must_use]
    pub fn error_history(&self) -> Vec<ErrorRecord> {
        self.store.error_history()
    }

    async fn retrieve(
        &self,
        run_id: &str,
        query: &str,
        requirements: &Requirements,
    ) -> Result<Vec<PaperRecord>, FatalRunError> {
        let stage = PipelineStage::Retrieval;
        let papers = match self
            .attempt(run_id, stage, || self.retriever.retrieve(query, requirements))
            .await
        {
            Ok(papers) => papers,
            Err(err) => return Err(self.abort(run_id, query, stage, &err)),
        };

        if papers.is_empty() && self.config.empty_retrieval_is_fatal {
            self.store.set_status(run_id, stage, AgentStatus::Failed);
            return Err(self.abort(run_id, query, stage, &SupervisorError::EmptyResult { stage }));
        }

        self.complete(run_id, stage);
        self.store.set_total_papers(run_id, papers.len());
        info!(run_id, papers = papers.len(), "Retrieved papers");
        Ok(papers)
    }

    async fn attempt<T, F, Fut>(
        &self,
        run_id: &str,
        stage: PipelineStage,
        operation: F,
    ) -> Result<T, SupervisorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AgentError>>,
    {
        self.emit(
            event_types::STAGE_STARTED,
            json!({ "run_id": run_id, "stage": stage }),
        );
        let recorder = EventingRecorder {
            store: &self.store,
            events: self.events.as_ref(),
        };
        execute_with_policy(&self.config.retry, stage, run_id, &recorder, operation).await
    }

    async fn run_or_fallback<T, F, Fut>(
        &self,
        run_id: &str,
        stage: PipelineStage,
        operation: F,
        fallback: impl FnOnce() -> T,
    ) -> T
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AgentError>>,
    {
        match self.attempt(run_id, stage, operation).await {
            Ok(value) => {
                self.complete(run_id, stage);
                value
            }
            Err(err) => {
                warn!(run_id, stage = %stage, error = %err, "Stage exhausted retries, using fallback");
                self.store.mark_degraded(run_id, stage);
                self.store.mark_completed(run_id, stage);
                self.emit(
                    event_types::STAGE_FALLBACK,
                    json!({ "run_id": run_id, "stage": stage, "error": err.to_string() }),
                );
                fallback()
            }
        }
    }

    fn complete(&self, run_id: &str, stage: PipelineStage) {
        self.store.set_status(run_id, stage, AgentStatus::Completed);
        self.store.mark_completed(run_id, stage);
        self.emit(
            event_types::STAGE_COMPLETED,
            json!({ "run_id": run_id, "stage": stage }),
        );
    }

    /// Rewrites citation markers in the draft, returning it unchanged on any failure.
    async fn replace_citations(
        &self,
        run_id: &str,
        draft: Draft,
        papers: &[PaperRecord],
        style: CitationStyle,
    ) -> Draft {
        let stage = PipelineStage::CitationReplacement;
        self.store.set_status(run_id, stage, AgentStatus::Running);

        let outcome = tokio::time::timeout(
            self.config.retry.timeout(),
            AssertUnwindSafe(self.rewrite_markers(&draft, papers, style)).catch_unwind(),
        )
        .await;

        let (status, failure) = match outcome {
            Ok(Ok(Ok(updated))) => {
                self.store.set_status(run_id, stage, AgentStatus::Completed);
                return updated;
            }
            Ok(Ok(Err(err))) => (AgentStatus::Failed, err.to_string()),
            Ok(Err(panic)) => (AgentStatus::Failed, panic_message(panic.as_ref())),
            Err(_) => (
                AgentStatus::Timeout,
                format!("timed out after {}s", self.config.retry.timeout_seconds),
            ),
        };

        warn!(run_id, error = %failure, "Error replacing citation placeholders, keeping original draft");
        self.store.set_status(run_id, stage, status);
        draft
    }

    async fn rewrite_markers(
        &self,
        draft: &Draft,
        papers: &[PaperRecord],
        style: CitationStyle,
    ) -> Result<Draft, AgentError> {
        let mut updated = draft.clone();
        if !updated.abstract_text.is_empty() {
            updated.abstract_text = self
                .citations
                .replace_placeholders(&updated.abstract_text, papers, style)
                .await?;
        }
        for section in updated.sections.values_mut() {
            let text = self
                .citations
                .replace_placeholders(section.content(), papers, style)
                .await?;
            section.set_content(text);
        }
        Ok(updated)
    }

    fn abort(
        &self,
        run_id: &str,
        query: &str,
        stage: PipelineStage,
        err: &SupervisorError,
    ) -> FatalRunError {
        let message = err.to_string();
        let furthest_stage = self
            .store
            .snapshot(run_id)
            .and_then(|run| run.current_stage);

        self.emit(
            event_types::STAGE_FAILED,
            json!({ "run_id": run_id, "stage": stage, "error": message }),
        );
        self.store
            .record_error(run_id, furthest_stage, ErrorKind::Fatal, None, message.as_str());
        let metrics = self
            .store
            .finish_run(run_id, RunOutcome::Failed)
            .unwrap_or_else(|| PipelineRun::new(run_id, query));
        let elapsed_seconds = metrics.total_duration_seconds.unwrap_or_default();

        error!(run_id, stage = %stage, error = %message, "Pipeline failed");
        self.emit(
            event_types::PIPELINE_FAILED,
            json!({ "run_id": run_id, "stage": stage, "error": message }),
        );

        FatalRunError {
            run_id: run_id.to_string(),
            query: query.to_string(),
            furthest_stage,
            message,
            metrics,
            elapsed_seconds,
        }
    }

    fn emit(&self, event_type: &str, data: serde_json::Value) {
        self.events.try_emit(event_type, Some(data));
    }
}

/// Forwards attempt notifications to the store and reports retries as events.
struct EventingRecorder<'a> {
    store: &'a RunStore,
    events: &'a dyn EventSink,
}

impl AttemptRecorder for EventingRecorder<'_> {
    fn attempt_started(&self, run_id: &str, stage: PipelineStage, attempt: u32) {
        self.store.attempt_started(run_id, stage, attempt);
    }

    fn attempt_failed(&self, run_id: &str, stage: PipelineStage, error: &SupervisorError) {
        self.store.attempt_failed(run_id, stage, error);
    }

    fn retry_scheduled(&self, run_id: &str, stage: PipelineStage, attempt: u32, delay: Duration) {
        self.store.retry_scheduled(run_id, stage, attempt, delay);
        self.events.try_emit(
            event_types::STAGE_RETRY,
            Some(json!({
                "run_id": run_id,
                "stage": stage,
                "attempt": attempt,
                "delay_ms": u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            })),
        );
    }
}
