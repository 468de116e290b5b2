//! Reduction of a multi-class sentiment probability vector to the single
//! label the news panel displays.

use serde::{Deserialize, Serialize};

use crate::models::SentimentLabel;

/// One class score as returned by the classifier endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub label: SentimentClass,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentimentClass {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub label: SentimentLabel,
    /// Percentage with two fractional digits, e.g. "90.00%".
    pub confidence: String,
}

/// Collapse an unordered score vector into a display verdict.
///
/// Neutral is the default, at the neutral class's score (0 when absent).
/// Positive wins only when it strictly beats both other classes; Negative
/// symmetrically. Ties fall through to the Neutral default. Absent classes
/// count as 0 in the comparisons.
pub fn reduce(scores: &[SentimentScore]) -> Verdict {
    let score_of = |class: SentimentClass| {
        scores
            .iter()
            .find(|s| s.label == class)
            .map(|s| s.score)
            .unwrap_or(0.0)
    };

    let positive = score_of(SentimentClass::Positive);
    let negative = score_of(SentimentClass::Negative);
    let neutral = score_of(SentimentClass::Neutral);

    let (label, score) = if positive > negative && positive > neutral {
        (SentimentLabel::Positive, positive)
    } else if negative > positive && negative > neutral {
        (SentimentLabel::Negative, negative)
    } else {
        (SentimentLabel::Neutral, neutral)
    };

    Verdict {
        label,
        confidence: format!("{:.2}%", score * 100.0),
    }
}
