use std::env;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://localhost:5000";

/// How many prior turns ride along with each assistant request.
pub const CONTEXT_WINDOW: usize = 5;

/// Cadence of the automatic live-feed poll.
pub const LIVE_POLL_INTERVAL: Duration = Duration::from_secs(600);

/// How long sentiment annotations stay on screen before the whole mapping
/// is cleared.
pub const ANNOTATION_TTL: Duration = Duration::from_secs(10);

const API_BASE_VAR: &str = "STOCKDESK_API_BASE";
const AUTH_TOKEN_VAR: &str = "STOCKDESK_AUTH_TOKEN";

/// Host-level configuration for the shell binary. The presence of a stored
/// token is all the client ever learns about authentication; validity is the
/// backend's problem.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base: String,
    pub auth_token: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let api_base = env::var(API_BASE_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let auth_token = env::var(AUTH_TOKEN_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty());
        Self {
            api_base,
            auth_token,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_token.is_some()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            auth_token: None,
        }
    }
}
