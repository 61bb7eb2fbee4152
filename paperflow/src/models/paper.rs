//! Paper records produced by retrieval.

use serde::{Deserialize, Serialize};

/// A paper returned by a retriever.
///
/// `authors` is `None` when the source omitted the field entirely, which
/// reference formatting treats as a malformed record. An empty list or
/// blank names are tolerated and rendered as "Unknown Author".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaperRecord {
    /// Paper title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Author names, first author first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    /// Publication year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Journal or venue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
    /// DOI without the resolver prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    /// Landing page URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Abstract text.
    #[serde(rename = "abstract", default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    /// Source the record came from (e.g. "arxiv").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Publication date as reported by the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    /// Relevance to the query, 0.0 to 1.0.
    #[serde(default)]
    pub relevance_score: f64,
    /// Citation count reported by the source.
    #[serde(default)]
    pub citations_count: u64,
    /// Fields the supervisor does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PaperRecord {
    /// Creates a paper with a title and nothing else.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Sets the authors.
    #[must_use]
    pub fn with_authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = Some(authors.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the year.
    #[must_use]
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Sets the journal.
    #[must_use]
    pub fn with_journal(mut self, journal: impl Into<String>) -> Self {
        self.journal = Some(journal.into());
        self
    }

    /// Sets the DOI.
    #[must_use]
    pub fn with_doi(mut self, doi: impl Into<String>) -> Self {
        self.doi = Some(doi.into());
        self
    }

    /// Sets the URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the relevance score.
    #[must_use]
    pub fn with_relevance_score(mut self, score: f64) -> Self {
        self.relevance_score = score;
        self
    }

    /// Returns the title or `"Unknown Title"`.
    #[must_use]
    pub fn title_or_default(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or("Unknown Title")
    }

    /// Returns the year as a string or `"Unknown"`.
    #[must_use]
    pub fn year_label(&self) -> String {
        self.year
            .map_or_else(|| "Unknown".to_string(), |y| y.to_string())
    }

    /// Returns the non-blank author names.
    #[must_use]
    pub fn named_authors(&self) -> Vec<&str> {
        self.authors
            .iter()
            .flatten()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let paper = PaperRecord::new("Attention Is All You Need")
            .with_authors(["Ashish Vaswani", "Noam Shazeer"])
            .with_year(2017)
            .with_doi("10.5555/3295222.3295349");

        assert_eq!(paper.title_or_default(), "Attention Is All You Need");
        assert_eq!(paper.year_label(), "2017");
        assert_eq!(paper.named_authors(), vec!["Ashish Vaswani", "Noam Shazeer"]);
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let paper = PaperRecord::default();
        assert_eq!(paper.title_or_default(), "Unknown Title");
        assert_eq!(paper.year_label(), "Unknown");
        assert!(paper.named_authors().is_empty());
    }

    #[test]
    fn test_blank_authors_skipped() {
        let paper = PaperRecord::new("t").with_authors(["", "  ", "Ada Lovelace"]);
        assert_eq!(paper.named_authors(), vec!["Ada Lovelace"]);
    }

    #[test]
    fn test_deserialize_keeps_extra_fields() {
        let paper: PaperRecord = serde_json::from_str(
            r#"{"title": "X", "abstract": "about x", "venue_rank": "A*"}"#,
        )
        .unwrap();

        assert_eq!(paper.abstract_text.as_deref(), Some("about x"));
        assert!(paper.authors.is_none());
        assert_eq!(paper.extra.get("venue_rank").unwrap(), "A*");
    }
}
