//! Numbered citation marker rewriting.

use crate::models::{CitationStyle, PaperRecord};
use regex::{Captures, Regex};
use std::sync::LazyLock;

static MARKER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(\d+(?:,\s*\d+)*)\]").expect("citation marker pattern is valid")
});

fn surname(author: &str) -> &str {
    author.split_whitespace().last().unwrap_or("Unknown")
}

/// Formats the in-text citation body for one paper (without brackets).
///
/// `number` is the 1-based marker number, used by IEEE.
#[must_use]
pub fn in_text_citation(paper: &PaperRecord, number: usize, style: CitationStyle) -> String {
    let authors = paper.named_authors();
    let year = paper
        .year
        .map_or_else(|| "n.d.".to_string(), |y| y.to_string());
    let first = authors.first().map_or("Unknown", |a| surname(a));

    match style {
        CitationStyle::Apa => match authors.as_slice() {
            [_, second] => format!("{first} & {}, {year}", surname(second)),
            [_, _, _, ..] => format!("{first} et al., {year}"),
            _ => format!("{first}, {year}"),
        },
        CitationStyle::Mla => first.to_string(),
        CitationStyle::Chicago => format!("{first} {year}"),
        CitationStyle::Ieee => number.to_string(),
    }
}

/// Rewrites every `[n]` / `[n, m, ...]` marker in `text` using `papers`.
///
/// Numbers without a matching paper are kept as-is inside the citation.
/// IEEE keeps square brackets; the author-date styles use parentheses and
/// separate multiple works with `; `.
#[must_use]
pub fn replace_numbered_markers(text: &str, papers: &[PaperRecord], style: CitationStyle) -> String {
    MARKER_PATTERN
        .replace_all(text, |caps: &Captures<'_>| {
            let parts: Vec<String> = caps[1]
                .split(',')
                .map(str::trim)
                .map(|num| {
                    num.parse::<usize>()
                        .ok()
                        .filter(|n| *n >= 1)
                        .and_then(|n| papers.get(n - 1).map(|p| in_text_citation(p, n, style)))
                        .unwrap_or_else(|| num.to_string())
                })
                .collect();

            match style {
                CitationStyle::Ieee => format!("[{}]", parts.join(", ")),
                _ => format!("({})", parts.join("; ")),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn papers() -> Vec<PaperRecord> {
        vec![
            PaperRecord::new("A").with_authors(["Jane Smith"]).with_year(2020),
            PaperRecord::new("B")
                .with_authors(["Ada Lovelace", "Charles Babbage"])
                .with_year(1843),
            PaperRecord::new("C")
                .with_authors(["Alan Turing", "Alonzo Church", "Kurt Godel"])
                .with_year(1936),
        ]
    }

    #[test]
    fn test_apa_markers() {
        let out = replace_numbered_markers(
            "Prior work [1] and [2, 3] disagree.",
            &papers(),
            CitationStyle::Apa,
        );
        assert_eq!(
            out,
            "Prior work (Smith, 2020) and (Lovelace & Babbage, 1843; Turing et al., 1936) disagree."
        );
    }

    #[test]
    fn test_mla_and_chicago() {
        assert_eq!(
            replace_numbered_markers("see [1]", &papers(), CitationStyle::Mla),
            "see (Smith)"
        );
        assert_eq!(
            replace_numbered_markers("see [3]", &papers(), CitationStyle::Chicago),
            "see (Turing 1936)"
        );
    }

    #[test]
    fn test_ieee_keeps_numbers() {
        assert_eq!(
            replace_numbered_markers("as shown [1,2]", &papers(), CitationStyle::Ieee),
            "as shown [1, 2]"
        );
    }

    #[test]
    fn test_out_of_range_kept() {
        assert_eq!(
            replace_numbered_markers("[9] and [0]", &papers(), CitationStyle::Apa),
            "(9) and (0)"
        );
    }

    #[test]
    fn test_no_markers_unchanged() {
        let text = "No citations here [a].";
        assert_eq!(replace_numbered_markers(text, &papers(), CitationStyle::Apa), text);
    }

    #[test]
    fn test_missing_authors_and_year() {
        let paper = PaperRecord::new("Anonymous");
        assert_eq!(in_text_citation(&paper, 1, CitationStyle::Apa), "Unknown, n.d.");
    }
}
