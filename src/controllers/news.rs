//! News surface: the periodically polled live market feed, the per-ticker
//! search, and the ephemeral positional sentiment annotations.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::config::{ANNOTATION_TTL, LIVE_POLL_INTERVAL};
use crate::gateway::RemoteGateway;
use crate::models::{Article, SentimentAnnotation};
use crate::sentiment;

pub const EMPTY_TICKER_ERROR: &str = "Please enter a valid stock ticker.";
pub const NO_TICKER_NEWS_ERROR: &str = "No news available for this stock ticker.";
pub const TICKER_FETCH_ERROR: &str = "Failed to fetch news. Please try again later.";
pub const NO_ARTICLE_FOR_SENTIMENT_ERROR: &str = "No news available for sentiment analysis.";
pub const INVALID_SENTIMENT_ERROR: &str = "Invalid sentiment data received.";
pub const SENTIMENT_FETCH_ERROR: &str = "Failed to analyze sentiment. Please try again.";
pub const NO_LIVE_NEWS_ERROR: &str = "No live market news available right now.";
pub const LIVE_FETCH_ERROR: &str = "Failed to fetch live news. Please try again later.";

/// The polled, non-ticker-scoped collection. Replaced wholesale on every
/// successful refresh.
#[derive(Debug, Clone, Default)]
pub struct LiveFeedState {
    pub articles: Vec<Article>,
    pub loading: bool,
    pub last_refreshed: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

/// The on-demand, single-ticker result set.
#[derive(Debug, Clone, Default)]
pub struct TickerSearchState {
    pub ticker: String,
    pub results: Vec<Article>,
    pub error: Option<String>,
}

#[derive(Default)]
struct NewsState {
    live: LiveFeedState,
    search: TickerSearchState,
    annotations: HashMap<usize, SentimentAnnotation>,
    /// Token for the pending annotation-expiry timer, if one is armed.
    expiry: Option<CancellationToken>,
}

/// Owns both news collections and their timers. All background work hangs
/// off `shutdown`, so dropping the controller tears everything down.
pub struct NewsFeedController {
    state: Arc<Mutex<NewsState>>,
    gateway: Arc<dyn RemoteGateway>,
    clock: Arc<dyn Clock>,
    shutdown: CancellationToken,
}

impl NewsFeedController {
    pub fn new(gateway: Arc<dyn RemoteGateway>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(NewsState::default())),
            gateway,
            clock,
            shutdown: CancellationToken::new(),
        }
    }

    /// Fetch the live feed now and keep refreshing it on the poll cadence
    /// until the controller is dropped.
    pub fn start_live_poll(&self) {
        let state = Arc::clone(&self.state);
        let gateway = Arc::clone(&self.gateway);
        let clock = Arc::clone(&self.clock);
        let token = self.shutdown.child_token();

        tokio::spawn(async move {
            let mut ticks = tokio::time::interval(LIVE_POLL_INTERVAL);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticks.tick() => {
                        run_live_refresh(&state, gateway.as_ref(), clock.as_ref()).await;
                    }
                }
            }
        });
    }

    /// Manual refresh. Shares the loading flag with the poll; an overlapping
    /// poll is allowed to race and whichever settles last wins.
    pub async fn refresh_live(&self) {
        run_live_refresh(&self.state, self.gateway.as_ref(), self.clock.as_ref()).await;
    }

    /// Ticker-scoped search. A successful replacement invalidates every
    /// positional annotation, so the mapping and its timer go with it.
    pub async fn search(&self, ticker: &str) {
        let ticker = ticker.trim();
        if ticker.is_empty() {
            let mut state = self.state.lock().await;
            state.search.error = Some(EMPTY_TICKER_ERROR.to_string());
            return;
        }

        {
            let mut state = self.state.lock().await;
            state.search.ticker = ticker.to_string();
        }

        let outcome = self.gateway.ticker_news(ticker).await;

        let mut state = self.state.lock().await;
        match outcome {
            Ok(results) if results.is_empty() => {
                state.search.results.clear();
                state.search.error = Some(NO_TICKER_NEWS_ERROR.to_string());
            }
            Ok(results) => {
                state.search.results = results;
                state.search.error = None;
                state.annotations.clear();
                if let Some(timer) = state.expiry.take() {
                    timer.cancel();
                }
            }
            Err(error) => {
                tracing::warn!(%ticker, error = %error, "ticker news fetch failed");
                state.search.error = Some(TICKER_FETCH_ERROR.to_string());
            }
        }
    }

    /// Classify the article at `index` in the current results. A missing
    /// index fails locally without touching the network.
    pub async fn analyze_sentiment(&self, index: usize) {
        let title = {
            let mut state = self.state.lock().await;
            match state.search.results.get(index) {
                Some(article) => article.title.clone(),
                None => {
                    state.search.error = Some(NO_ARTICLE_FOR_SENTIMENT_ERROR.to_string());
                    return;
                }
            }
        };

        let outcome = self.gateway.classify_sentiment(&title).await;

        let mut state = self.state.lock().await;
        match outcome {
            Ok(scores) if scores.is_empty() => {
                state.search.error = Some(INVALID_SENTIMENT_ERROR.to_string());
            }
            Ok(scores) => {
                let verdict = sentiment::reduce(&scores);
                let was_empty = state.annotations.is_empty();
                state.annotations.insert(
                    index,
                    SentimentAnnotation {
                        label: verdict.label,
                        confidence: verdict.confidence,
                    },
                );
                if was_empty {
                    self.arm_annotation_expiry(&mut state);
                }
            }
            Err(error) => {
                tracing::warn!(index, error = %error, "sentiment classification failed");
                state.search.error = Some(SENTIMENT_FETCH_ERROR.to_string());
            }
        }
    }

    /// One timer per dwell window: armed on the empty→non-empty transition,
    /// it clears the whole mapping after the TTL. Later inserts ride the
    /// same window and do not extend it.
    fn arm_annotation_expiry(&self, state: &mut NewsState) {
        let token = self.shutdown.child_token();
        if let Some(previous) = state.expiry.replace(token.clone()) {
            previous.cancel();
        }

        let shared = Arc::clone(&self.state);
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(ANNOTATION_TTL) => {
                    let mut state = shared.lock().await;
                    state.annotations.clear();
                    state.expiry = None;
                }
            }
        });
    }

    pub async fn live_feed(&self) -> LiveFeedState {
        self.state.lock().await.live.clone()
    }

    pub async fn ticker_search(&self) -> TickerSearchState {
        self.state.lock().await.search.clone()
    }

    pub async fn annotations(&self) -> HashMap<usize, SentimentAnnotation> {
        self.state.lock().await.annotations.clone()
    }
}

impl Drop for NewsFeedController {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn run_live_refresh(
    state: &Mutex<NewsState>,
    gateway: &dyn RemoteGateway,
    clock: &dyn Clock,
) {
    {
        let mut state = state.lock().await;
        state.live.loading = true;
    }

    let outcome = gateway.live_news().await;

    let mut state = state.lock().await;
    match outcome {
        Ok(articles) if articles.is_empty() => {
            state.live.articles.clear();
            state.live.error = Some(NO_LIVE_NEWS_ERROR.to_string());
        }
        Ok(articles) => {
            state.live.articles = articles;
            state.live.last_refreshed = Some(clock.now());
            state.live.error = None;
        }
        Err(error) => {
            tracing::warn!(error = %error, "live news refresh failed");
            state.live.error = Some(LIVE_FETCH_ERROR.to_string());
        }
    }
    state.live.loading = false;
}
