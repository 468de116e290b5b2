use async_trait::async_trait;
use reqwest::Client;

use super::traits::RemoteGateway;
use super::types::*;
use crate::models::Article;
use crate::sentiment::SentimentScore;

/// Gateway implementation over the app's HTTP backend.
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check_status(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let fallback = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.fallback);
        Err(GatewayError::Http {
            status: status.as_u16(),
            fallback,
        })
    }
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn assistant_turn(
        &self,
        request: AssistantTurnRequest,
    ) -> Result<AssistantTurnResponse, GatewayError> {
        let response = self
            .client
            .post(self.url("/api/chatbot"))
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }

    async fn ticker_news(&self, ticker: &str) -> Result<Vec<Article>, GatewayError> {
        let response = self
            .client
            .get(self.url("/api/news"))
            .query(&[("ticker", ticker)])
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let parsed: TickerNewsResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        Ok(parsed.results.into_iter().map(Article::from).collect())
    }

    async fn live_news(&self) -> Result<Vec<Article>, GatewayError> {
        let response = self
            .client
            .get(self.url("/api/live-news"))
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let parsed: LiveNewsResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        Ok(parsed.news.into_iter().map(Article::from).collect())
    }

    async fn classify_sentiment(&self, text: &str) -> Result<Vec<SentimentScore>, GatewayError> {
        let response = self
            .client
            .post(self.url("/api/sentiment"))
            .json(&SentimentRequest { text })
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let parsed: SentimentResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        Ok(parsed.sentiment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let gateway = HttpGateway::new("http://localhost:5000/");
        assert_eq!(gateway.url("/api/news"), "http://localhost:5000/api/news");
    }
}
