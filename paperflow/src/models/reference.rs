//! Reference list entries.

use super::PaperRecord;
use serde::{Deserialize, Serialize};

/// One entry of the formatted reference list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    /// Stable id, `ref1`, `ref2`, ...
    pub id: String,
    /// 1-based position in the list.
    pub number: usize,
    /// Paper title.
    pub title: String,
    /// Author names.
    pub authors: Vec<String>,
    /// Journal or venue.
    pub journal: String,
    /// Publication year, or "Unknown".
    pub year: String,
    /// DOI.
    pub doi: String,
    /// URL.
    pub url: String,
    /// Citation string shown to readers.
    pub formatted_citation: String,
    /// Relevance score carried over from retrieval.
    pub relevance_score: f64,
    /// Citation count carried over from retrieval.
    pub citations_count: u64,
    /// True when the paper record was malformed and this is a minimal entry.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

impl ReferenceEntry {
    /// Builds the minimal entry used when a paper cannot be formatted.
    #[must_use]
    pub fn fallback(number: usize, paper: &PaperRecord) -> Self {
        let title = paper.title_or_default().to_string();
        Self {
            id: format!("ref{number}"),
            number,
            formatted_citation: format!("Reference {number}: {title}"),
            title,
            authors: paper
                .authors
                .clone()
                .unwrap_or_else(|| vec!["Unknown Author".to_string()]),
            journal: paper
                .journal
                .clone()
                .unwrap_or_else(|| "Unknown Journal".to_string()),
            year: paper.year_label(),
            doi: paper.doi.clone().unwrap_or_default(),
            url: paper.url.clone().unwrap_or_default(),
            relevance_score: paper.relevance_score,
            citations_count: paper.citations_count,
            degraded: true,
        }
    }
}
