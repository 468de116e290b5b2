use async_trait::async_trait;

use super::types::{AssistantTurnRequest, AssistantTurnResponse, GatewayError};
use crate::models::Article;
use crate::sentiment::SentimentScore;

/// The remote service boundary: assistant endpoint, the two news endpoints
/// and the sentiment classifier. Controllers only ever talk to this trait.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    async fn assistant_turn(
        &self,
        request: AssistantTurnRequest,
    ) -> Result<AssistantTurnResponse, GatewayError>;

    async fn ticker_news(&self, ticker: &str) -> Result<Vec<Article>, GatewayError>;

    async fn live_news(&self) -> Result<Vec<Article>, GatewayError>;

    async fn classify_sentiment(&self, text: &str) -> Result<Vec<SentimentScore>, GatewayError>;
}
