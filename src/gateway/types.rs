use chrono::DateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Article, Message};
use crate::sentiment::SentimentScore;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request failed: HTTP {status}")]
    Http {
        status: u16,
        /// Server-supplied substitute text from the error body, consumed by
        /// the assistant path.
        fallback: Option<String>,
    },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    pub fn fallback(&self) -> Option<&str> {
        match self {
            GatewayError::Http { fallback, .. } => fallback.as_deref(),
            _ => None,
        }
    }
}

/// Outbound assistant turn. `context` is the bounded slice of prior turns;
/// the request is self-contained, the backend holds no session state.
#[derive(Debug, Clone, Serialize)]
pub struct AssistantTurnRequest {
    pub message: String,
    pub context: Vec<Message>,
    #[serde(rename = "isAuthenticated")]
    pub is_authenticated: bool,
    #[serde(rename = "currentPage")]
    pub current_page: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantTurnResponse {
    pub response: String,
    pub timestamp: String,
}

// --- Wire shapes ---

#[derive(Debug, Deserialize)]
pub(crate) struct TickerNewsResponse {
    #[serde(default)]
    pub results: Vec<TickerArticle>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TickerArticle {
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub image: Option<String>,
    pub author: Option<String>,
}

impl From<TickerArticle> for Article {
    fn from(wire: TickerArticle) -> Self {
        Article {
            title: wire.title,
            description: wire.description,
            url: wire.url,
            image: wire.image,
            source: wire.author,
            published_at: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LiveNewsResponse {
    #[serde(default)]
    pub news: Vec<LiveArticle>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LiveArticle {
    pub headline: String,
    #[serde(default)]
    pub summary: Option<String>,
    pub url: String,
    pub image: Option<String>,
    pub source: Option<String>,
    /// Unix seconds.
    pub datetime: i64,
}

impl From<LiveArticle> for Article {
    fn from(wire: LiveArticle) -> Self {
        Article {
            title: wire.headline,
            description: wire.summary,
            url: wire.url,
            image: wire.image,
            source: wire.source,
            published_at: DateTime::from_timestamp(wire.datetime, 0),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SentimentRequest<'a> {
    pub text: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SentimentResponse {
    #[serde(default)]
    pub sentiment: Vec<SentimentScore>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub fallback: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_article_converts_unix_seconds() {
        let wire: LiveArticle = serde_json::from_str(
            r#"{"headline":"Markets rally","summary":"Broad gains","url":"https://x/y",
                "image":null,"source":"Newswire","datetime":1709294400}"#,
        )
        .unwrap();
        let article = Article::from(wire);
        assert_eq!(article.title, "Markets rally");
        assert_eq!(
            article.published_at.unwrap().to_rfc3339(),
            "2024-03-01T12:00:00+00:00"
        );
    }

    #[test]
    fn ticker_article_maps_author_to_source() {
        let wire: TickerArticle = serde_json::from_str(
            r#"{"title":"AAPL beats","url":"https://x/z","author":"J. Doe"}"#,
        )
        .unwrap();
        let article = Article::from(wire);
        assert_eq!(article.source.as_deref(), Some("J. Doe"));
        assert!(article.description.is_none());
        assert!(article.published_at.is_none());
    }

    #[test]
    fn assistant_request_uses_camel_case_flags() {
        let req = AssistantTurnRequest {
            message: "hi".into(),
            context: Vec::new(),
            is_authenticated: true,
            current_page: "/news".into(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["isAuthenticated"], true);
        assert_eq!(json["currentPage"], "/news");
    }

    #[test]
    fn missing_results_field_defaults_to_empty() {
        let parsed: TickerNewsResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.results.is_empty());
    }
}
