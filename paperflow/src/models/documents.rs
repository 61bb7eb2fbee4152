//! Stage outputs: summaries, citations, the draft and its analytics.
//!
//! Each type has a `fallback` (or `Default`) skeleton the supervisor
//! substitutes when the producing stage exhausts its retries.

use super::PaperRecord;
use crate::utils::iso_timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

type Extra = serde_json::Map<String, serde_json::Value>;

/// Output of the summarization stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summaries {
    /// One summary per paper, shape owned by the summarizer.
    #[serde(default)]
    pub individual_summaries: Vec<serde_json::Value>,
    /// Cross-paper thematic summary.
    #[serde(default)]
    pub thematic_summary: String,
    /// Key findings across the corpus.
    #[serde(default)]
    pub key_findings: Vec<String>,
    /// Methodology overview.
    #[serde(default)]
    pub methodology_summary: Extra,
    /// Fields the supervisor does not interpret.
    #[serde(flatten)]
    pub extra: Extra,
}

impl Summaries {
    /// Minimal summaries used when summarization is unavailable.
    #[must_use]
    pub fn fallback(paper_count: usize) -> Self {
        Self {
            thematic_summary: format!(
                "Analysis of {paper_count} papers on the research topic."
            ),
            ..Default::default()
        }
    }
}

/// Output of the citation stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Citations {
    /// Style name to formatted citations, in paper order.
    #[serde(default)]
    pub formatted_citations: BTreeMap<String, Vec<String>>,
    /// In-text citation contexts.
    #[serde(default)]
    pub in_text_citations: Vec<serde_json::Value>,
    /// Bibliography entries.
    #[serde(default)]
    pub bibliography: Vec<serde_json::Value>,
    /// Citation graph between papers.
    #[serde(default)]
    pub citation_network: Extra,
    /// Fields the supervisor does not interpret.
    #[serde(flatten)]
    pub extra: Extra,
}

impl Citations {
    /// Returns the pre-formatted citation for the paper at `index`, if the
    /// citation stage produced one in `style`.
    #[must_use]
    pub fn formatted_for(&self, style: &str, index: usize) -> Option<&str> {
        self.formatted_citations
            .get(style)
            .and_then(|entries| entries.get(index))
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Returns true if nothing was generated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.formatted_citations.is_empty()
            && self.in_text_citations.is_empty()
            && self.bibliography.is_empty()
            && self.citation_network.is_empty()
    }
}

/// A draft section: either plain text or a structured object with `content`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Section {
    /// Plain section text.
    Text(String),
    /// Section with a `content` field plus generator-specific fields.
    Structured(StructuredSection),
}

/// A section object carrying its text in `content`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredSection {
    /// Section text.
    pub content: String,
    /// Fields the supervisor does not interpret.
    #[serde(flatten)]
    pub extra: Extra,
}

impl Section {
    /// Returns the section text.
    #[must_use]
    pub fn content(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Structured(section) => &section.content,
        }
    }

    /// Replaces the section text, keeping any structure.
    pub fn set_content(&mut self, content: String) {
        match self {
            Self::Text(text) => *text = content,
            Self::Structured(section) => section.content = content,
        }
    }
}

impl From<&str> for Section {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Draft metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftMetadata {
    /// The research topic.
    #[serde(default)]
    pub topic: String,
    /// Word count reported by the generator.
    #[serde(default)]
    pub word_count: usize,
    /// ISO 8601 generation time.
    #[serde(default)]
    pub generation_date: String,
    /// Fields the supervisor does not interpret.
    #[serde(flatten)]
    pub extra: Extra,
}

/// Output of the paper generation stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    /// Paper title.
    #[serde(default)]
    pub title: String,
    /// Abstract.
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    /// Section name to section.
    #[serde(default)]
    pub sections: BTreeMap<String, Section>,
    /// Generation metadata.
    #[serde(default)]
    pub metadata: DraftMetadata,
}

impl Draft {
    /// Minimal draft used when generation is unavailable.
    #[must_use]
    pub fn fallback(query: &str) -> Self {
        Self {
            title: format!("{query}: Research Analysis"),
            abstract_text: format!(
                "This paper analyzes {query} based on available research literature."
            ),
            sections: BTreeMap::new(),
            metadata: DraftMetadata {
                topic: query.to_string(),
                word_count: 0,
                generation_date: iso_timestamp(),
                extra: Extra::new(),
            },
        }
    }

    /// Counts whitespace-separated words in the abstract and all sections.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.abstract_text.split_whitespace().count()
            + self
                .sections
                .values()
                .map(|s| s.content().split_whitespace().count())
                .sum::<usize>()
    }
}

/// Size metrics of the draft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaperMetrics {
    /// Total words.
    #[serde(default)]
    pub word_count: usize,
    /// Number of sections.
    #[serde(default)]
    pub section_count: usize,
    /// Citations per hundred words.
    #[serde(default)]
    pub citation_density: f64,
    /// Fields the supervisor does not interpret.
    #[serde(flatten)]
    pub extra: Extra,
}

/// Sentiment proportions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    /// Positive share.
    pub positive: f64,
    /// Negative share.
    pub negative: f64,
    /// Neutral share.
    pub neutral: f64,
}

impl Default for Sentiment {
    fn default() -> Self {
        Self {
            positive: 0.0,
            negative: 0.0,
            neutral: 1.0,
        }
    }
}

/// Content analysis of the draft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentAnalysis {
    /// Extracted keywords.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Detected topics.
    #[serde(default)]
    pub topics: Vec<String>,
    /// Overall sentiment.
    #[serde(default)]
    pub sentiment: Sentiment,
    /// Fields the supervisor does not interpret.
    #[serde(flatten)]
    pub extra: Extra,
}

/// Earliest and latest publication year among sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    /// Earliest year.
    pub earliest: Option<i32>,
    /// Latest year.
    pub latest: Option<i32>,
}

/// Analysis of the source papers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceAnalysis {
    /// Number of source papers.
    #[serde(default)]
    pub total_sources: usize,
    /// Publication year span.
    #[serde(default)]
    pub publication_years: YearRange,
    /// Fields the supervisor does not interpret.
    #[serde(flatten)]
    pub extra: Extra,
}

/// Output of the analytics stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    /// Draft size metrics.
    #[serde(default)]
    pub paper_metrics: PaperMetrics,
    /// Content analysis.
    #[serde(default)]
    pub content_analysis: ContentAnalysis,
    /// Source analysis.
    #[serde(default)]
    pub source_analysis: SourceAnalysis,
    /// Improvement recommendations.
    #[serde(default)]
    pub recommendations: Vec<String>,
    /// Fields the supervisor does not interpret.
    #[serde(flatten)]
    pub extra: Extra,
}

impl Analytics {
    /// Minimal analytics built only from counts the supervisor already has.
    #[must_use]
    pub fn fallback(draft: &Draft, papers: &[PaperRecord]) -> Self {
        let years = papers.iter().filter_map(|p| p.year);
        let publication_years = YearRange {
            earliest: years.clone().min(),
            latest: years.max(),
        };

        Self {
            paper_metrics: PaperMetrics {
                word_count: draft.word_count(),
                section_count: draft.sections.len(),
                citation_density: 0.0,
                extra: Extra::new(),
            },
            content_analysis: ContentAnalysis::default(),
            source_analysis: SourceAnalysis {
                total_sources: papers.len(),
                publication_years,
                extra: Extra::new(),
            },
            recommendations: vec![
                "Pipeline completed with supervisor monitoring".to_string(),
                format!("Analyzed {} papers successfully", papers.len()),
            ],
            extra: Extra::new(),
        }
    }
}
