//! Records exchanged between the supervisor and its collaborators.
//!
//! Every record is serde-serialisable and keeps unknown fields in a
//! flattened `extra` map, so collaborator output survives a round trip even
//! when it carries more than the supervisor looks at.

mod documents;
mod paper;
mod reference;
mod requirements;

pub use documents::{
    Analytics, Citations, ContentAnalysis, Draft, DraftMetadata, PaperMetrics, Section,
    Sentiment, SourceAnalysis, StructuredSection, Summaries, YearRange,
};
pub use paper::PaperRecord;
pub use reference::ReferenceEntry;
pub use requirements::{CitationStyle, Requirements, UnknownCitationStyle};
