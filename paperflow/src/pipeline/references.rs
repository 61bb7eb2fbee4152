//! Reference list formatting.

use crate::errors::ReferenceError;
use crate::models::{CitationStyle, Citations, PaperRecord, ReferenceEntry};
use tracing::warn;

/// Formats the first `max` papers into reference entries.
///
/// Each paper is formatted independently. A malformed record becomes a
/// minimal entry flagged `degraded` and never affects its neighbours.
#[must_use]
pub fn format_references(
    papers: &[PaperRecord],
    citations: &Citations,
    style: CitationStyle,
    max: usize,
) -> Vec<ReferenceEntry> {
    papers
        .iter()
        .take(max)
        .enumerate()
        .map(|(index, paper)| {
            let number = index + 1;
            format_reference(number, paper, citations, style).unwrap_or_else(|err| {
                warn!(reference = number, error = %err, "Error formatting reference");
                ReferenceEntry::fallback(number, paper)
            })
        })
        .collect()
}

/// Formats one paper as reference `number` (1-based).
pub fn format_reference(
    number: usize,
    paper: &PaperRecord,
    citations: &Citations,
    style: CitationStyle,
) -> Result<ReferenceEntry, ReferenceError> {
    let authors = paper
        .authors
        .as_ref()
        .ok_or(ReferenceError::MissingField("authors"))?;

    let formatted_citation = match citations.formatted_for(style.as_str(), number - 1) {
        Some(text) => text.to_string(),
        None => citation_string(paper),
    };

    Ok(ReferenceEntry {
        id: format!("ref{number}"),
        number,
        title: paper.title_or_default().to_string(),
        authors: authors.clone(),
        journal: paper.journal.clone().unwrap_or_default(),
        year: paper.year_label(),
        doi: paper.doi.clone().unwrap_or_default(),
        url: paper.url.clone().unwrap_or_default(),
        formatted_citation,
        relevance_score: paper.relevance_score,
        citations_count: paper.citations_count,
        degraded: false,
    })
}

/// Renders "A", "A & B" or "A et al.", or "Unknown Author".
#[must_use]
pub fn author_label(paper: &PaperRecord) -> String {
    match paper.named_authors().as_slice() {
        [] => "Unknown Author".to_string(),
        [only] => (*only).to_string(),
        [first, second] => format!("{first} & {second}"),
        [first, ..] => format!("{first} et al."),
    }
}

fn citation_string(paper: &PaperRecord) -> String {
    let mut citation = format!(
        "{} ({}). {}.",
        author_label(paper),
        paper.year_label(),
        paper.title_or_default()
    );

    if let Some(journal) = paper.journal.as_deref().filter(|j| !j.is_empty()) {
        citation.push_str(&format!(" {journal}."));
    }

    if let Some(doi) = paper.doi.as_deref().filter(|d| !d.is_empty()) {
        citation.push_str(&format!(" https://doi.org/{doi}"));
    } else if let Some(url) = paper.url.as_deref().filter(|u| !u.is_empty()) {
        citation.push_str(&format!(" Retrieved from {url}"));
    }

    citation
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn paper(title: &str, authors: &[&str]) -> PaperRecord {
        PaperRecord::new(title)
            .with_authors(authors.iter().copied())
            .with_year(2021)
    }

    #[test]
    fn test_author_labels() {
        assert_eq!(author_label(&paper("t", &[])), "Unknown Author");
        assert_eq!(author_label(&paper("t", &["Lee"])), "Lee");
        assert_eq!(author_label(&paper("t", &["Lee", "Kim"])), "Lee & Kim");
        assert_eq!(author_label(&paper("t", &["Lee", "Kim", "Park"])), "Lee et al.");
        assert_eq!(author_label(&paper("t", &["  ", "Kim"])), "Kim");
    }

    #[test]
    fn test_citation_with_doi() {
        let p = paper("Graph Attention Networks", &["Velickovic", "Cucurull"])
            .with_journal("ICLR")
            .with_doi("10.48550/arXiv.1710.10903")
            .with_url("https://arxiv.org/abs/1710.10903");

        let entry = format_reference(1, &p, &Citations::default(), CitationStyle::Apa).unwrap();
        assert_eq!(
            entry.formatted_citation,
            "Velickovic & Cucurull (2021). Graph Attention Networks. ICLR. https://doi.org/10.48550/arXiv.1710.10903"
        );
        assert_eq!(entry.id, "ref1");
        assert!(!entry.degraded);
    }

    #[test]
    fn test_citation_with_url_only() {
        let p = paper("Paper", &["Ng"]).with_url("https://example.org/p");
        let entry = format_reference(2, &p, &Citations::default(), CitationStyle::Apa).unwrap();
        assert_eq!(
            entry.formatted_citation,
            "Ng (2021). Paper. Retrieved from https://example.org/p"
        );
    }

    #[test]
    fn test_prefers_generated_citation_for_style() {
        let mut citations = Citations::default();
        citations.formatted_citations.insert(
            "ieee".to_string(),
            vec!["[1] A. Ng, \"Paper,\" 2021.".to_string()],
        );
        let p = paper("Paper", &["Ng"]);

        let ieee = format_reference(1, &p, &citations, CitationStyle::Ieee).unwrap();
        assert_eq!(ieee.formatted_citation, "[1] A. Ng, \"Paper,\" 2021.");

        let apa = format_reference(1, &p, &citations, CitationStyle::Apa).unwrap();
        assert_eq!(apa.formatted_citation, "Ng (2021). Paper.");
    }

    #[test]
    fn test_missing_authors_is_an_error() {
        let err = format_reference(
            1,
            &PaperRecord::new("Orphan"),
            &Citations::default(),
            CitationStyle::Apa,
        )
        .unwrap_err();
        assert_eq!(err, ReferenceError::MissingField("authors"));
    }

    #[test]
    fn test_malformed_record_degrades_alone() {
        let papers = vec![
            paper("First", &["A"]),
            PaperRecord::new("Second"),
            paper("Third", &["C"]),
        ];

        let refs = format_references(&papers, &Citations::default(), CitationStyle::Apa, 15);

        assert_eq!(refs.len(), 3);
        assert_eq!(refs.iter().filter(|r| r.degraded).count(), 1);
        assert_eq!(refs[1].formatted_citation, "Reference 2: Second");
        assert_eq!(refs[2].formatted_citation, "C (2021). Third.");
    }

    #[test]
    fn test_limit_and_order() {
        let papers: Vec<_> = (1..=20)
            .map(|i| paper(&format!("Paper {i}"), &["X"]))
            .collect();

        let refs = format_references(&papers, &Citations::default(), CitationStyle::Apa, 15);

        assert_eq!(refs.len(), 15);
        assert_eq!(
            refs.iter().map(|r| r.number).collect::<Vec<_>>(),
            (1..=15).collect::<Vec<_>>()
        );
        assert_eq!(refs[14].title, "Paper 15");
    }
}
