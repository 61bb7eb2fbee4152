//! Caller-supplied requirements for a run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Citation style for in-text citations and references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CitationStyle {
    /// American Psychological Association.
    #[default]
    Apa,
    /// Modern Language Association.
    Mla,
    /// Chicago author-date.
    Chicago,
    /// IEEE numeric.
    Ieee,
}

impl CitationStyle {
    /// Returns the lowercase style name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Apa => "apa",
            Self::Mla => "mla",
            Self::Chicago => "chicago",
            Self::Ieee => "ieee",
        }
    }
}

impl fmt::Display for CitationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown citation style name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown citation style: {0}")]
pub struct UnknownCitationStyle(pub String);

impl FromStr for CitationStyle {
    type Err = UnknownCitationStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apa" => Ok(Self::Apa),
            "mla" => Ok(Self::Mla),
            "chicago" => Ok(Self::Chicago),
            "ieee" => Ok(Self::Ieee),
            _ => Err(UnknownCitationStyle(s.to_string())),
        }
    }
}

/// Requirements passed through to retrieval and draft generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Requirements {
    /// Requested citation style; the supervisor default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_style: Option<CitationStyle>,
    /// Requested paper length ("short", "medium", "long").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
    /// Areas the draft should focus on.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub focus_areas: Vec<String>,
    /// Upper bound on papers to retrieve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_papers: Option<usize>,
    /// Requirements the supervisor does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Requirements {
    /// Creates empty requirements.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the citation style.
    #[must_use]
    pub fn with_citation_style(mut self, style: CitationStyle) -> Self {
        self.citation_style = Some(style);
        self
    }

    /// Sets the maximum number of papers.
    #[must_use]
    pub fn with_max_papers(mut self, max: usize) -> Self {
        self.max_papers = Some(max);
        self
    }

    /// Adds a focus area.
    #[must_use]
    pub fn with_focus_area(mut self, area: impl Into<String>) -> Self {
        self.focus_areas.push(area.into());
        self
    }

    /// Returns the requested style, or `default` if none was requested.
    #[must_use]
    pub fn citation_style_or(&self, default: CitationStyle) -> CitationStyle {
        self.citation_style.unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_parse() {
        assert_eq!("APA".parse::<CitationStyle>().unwrap(), CitationStyle::Apa);
        assert_eq!(" ieee ".parse::<CitationStyle>().unwrap(), CitationStyle::Ieee);
        assert!("harvard".parse::<CitationStyle>().is_err());
    }

    #[test]
    fn test_style_serialize() {
        assert_eq!(serde_json::to_string(&CitationStyle::Chicago).unwrap(), r#""chicago""#);
    }

    #[test]
    fn test_requirements_style_fallback() {
        let req = Requirements::new();
        assert_eq!(req.citation_style_or(CitationStyle::Mla), CitationStyle::Mla);

        let req = req.with_citation_style(CitationStyle::Ieee);
        assert_eq!(req.citation_style_or(CitationStyle::Mla), CitationStyle::Ieee);
    }

    #[test]
    fn test_requirements_deserialize() {
        let req: Requirements = serde_json::from_str(
            r#"{"citation_style": "mla", "length": "short", "focus_areas": ["ethics"], "audience": "students"}"#,
        )
        .unwrap();

        assert_eq!(req.citation_style, Some(CitationStyle::Mla));
        assert_eq!(req.focus_areas, vec!["ethics".to_string()]);
        assert_eq!(req.extra.get("audience").unwrap(), "students");
    }
}
