use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A news item, normalized from either wire shape (ticker search results or
/// live feed items). Identity is positional within its owning result set;
/// neither endpoint provides a stable content key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub image: Option<String>,
    /// Source outlet for live items, byline author for ticker results.
    pub source: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SentimentLabel::Positive => write!(f, "Positive"),
            SentimentLabel::Negative => write!(f, "Negative"),
            SentimentLabel::Neutral => write!(f, "Neutral"),
        }
    }
}

/// Transient classification attached to a displayed article. Keyed by the
/// article's position in the current ticker results; the whole mapping is
/// cleared on expiry or whenever the result set is replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentimentAnnotation {
    pub label: SentimentLabel,
    /// Percentage with two fractional digits, e.g. "90.00%".
    pub confidence: String,
}
