//! Chat widget state and orchestration: a bounded-context conversation with
//! the remote assistant, optimistic local appends and error fallback.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::config::CONTEXT_WINDOW;
use crate::gateway::{AssistantTurnRequest, AssistantTurnResponse, GatewayError, RemoteGateway};
use crate::models::{Message, MessageIdGen, Sender};

pub const WELCOME_MESSAGE: &str = "Hi! I'm the StockDesk assistant. I can help you with stock \
    predictions, using the app, understanding features, and answering questions about the \
    platform. How can I assist you today?";

pub const CONNECTION_APOLOGY: &str =
    "I'm having trouble connecting right now. Please try again in a moment.";

/// Canned prompts for signed-in viewers: how to use what they already have.
pub const AUTHENTICATED_QUICK_QUESTIONS: &[&str] = &[
    "How do I make a stock prediction?",
    "How do I add stocks to my watchlist?",
    "How do I read the sentiment badge on a news article?",
];

/// Canned prompts for anonymous viewers: what the platform offers.
pub const ANONYMOUS_QUICK_QUESTIONS: &[&str] = &[
    "What can this assistant help me with?",
    "How does sentiment analysis work?",
    "What data sources do you use?",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Closed,
    Open,
    Minimized,
}

/// Presentation side effects, returned as data so the state machine stays
/// free of any UI binding. The host decides what scrolling or focusing means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEffect {
    ScrollToLatest,
    FocusInput,
}

/// The session's whole chat state. Transitions are synchronous and pure with
/// respect to I/O; [`ConversationController`] drives the async edges.
#[derive(Debug)]
pub struct ChatState {
    pub messages: Vec<Message>,
    pub visibility: Visibility,
    pub pending_input: String,
    pub in_flight: bool,
    pub authenticated: bool,
    pub current_route: String,
    ids: MessageIdGen,
}

impl ChatState {
    pub fn new(authenticated: bool, current_route: impl Into<String>, now: DateTime<Utc>) -> Self {
        let mut state = Self {
            messages: Vec::new(),
            visibility: Visibility::Closed,
            pending_input: String::new(),
            in_flight: false,
            authenticated,
            current_route: current_route.into(),
            ids: MessageIdGen::new(),
        };
        state.seed_welcome(now);
        state
    }

    fn seed_welcome(&mut self, now: DateTime<Utc>) {
        let id = self.ids.next(now);
        self.messages
            .push(Message::new(id, WELCOME_MESSAGE, Sender::Assistant, now));
    }

    /// Discard the log and start over with exactly the welcome message.
    pub fn reseed(&mut self, now: DateTime<Utc>) {
        self.messages.clear();
        self.seed_welcome(now);
    }

    pub fn toggle_widget(&mut self) -> Vec<UiEffect> {
        match self.visibility {
            Visibility::Closed => {
                self.visibility = Visibility::Open;
                vec![UiEffect::FocusInput]
            }
            Visibility::Open | Visibility::Minimized => {
                self.visibility = Visibility::Closed;
                Vec::new()
            }
        }
    }

    pub fn toggle_minimize(&mut self) -> Vec<UiEffect> {
        match self.visibility {
            Visibility::Open => {
                self.visibility = Visibility::Minimized;
                Vec::new()
            }
            Visibility::Minimized => {
                self.visibility = Visibility::Open;
                vec![UiEffect::FocusInput]
            }
            Visibility::Closed => Vec::new(),
        }
    }

    pub fn close(&mut self) {
        self.visibility = Visibility::Closed;
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.pending_input = text.into();
    }

    /// Latest auth/route snapshot from the host, re-derived on navigation.
    pub fn refresh_environment(&mut self, authenticated: bool, current_route: impl Into<String>) {
        self.authenticated = authenticated;
        self.current_route = current_route.into();
    }

    /// Canned prompts, offered only before the first real exchange.
    pub fn quick_questions(&self) -> Option<&'static [&'static str]> {
        if self.messages.len() != 1 {
            return None;
        }
        Some(if self.authenticated {
            AUTHENTICATED_QUICK_QUESTIONS
        } else {
            ANONYMOUS_QUICK_QUESTIONS
        })
    }

    /// The bounded slice of recent turns that rides along with a submission.
    pub fn context_window(&self) -> Vec<Message> {
        let skip = self.messages.len().saturating_sub(CONTEXT_WINDOW);
        self.messages[skip..].to_vec()
    }

    /// Start a submission: append the user turn, clear the input, raise
    /// `in_flight`, and hand back the outbound request. `None` means the
    /// submission was a silent no-op (blank input or a turn already in
    /// flight).
    ///
    /// The context is captured *before* the new user message is appended.
    pub fn begin_submit(
        &mut self,
        now: DateTime<Utc>,
    ) -> Option<(AssistantTurnRequest, Vec<UiEffect>)> {
        if self.pending_input.trim().is_empty() || self.in_flight {
            return None;
        }

        let text = std::mem::take(&mut self.pending_input);
        let context = self.context_window();
        let id = self.ids.next(now);
        self.messages
            .push(Message::new(id, text.clone(), Sender::User, now));
        self.in_flight = true;

        let request = AssistantTurnRequest {
            message: text,
            context,
            is_authenticated: self.authenticated,
            current_page: self.current_route.clone(),
        };
        Some((request, vec![UiEffect::ScrollToLatest]))
    }

    /// Fold the settled outcome back into the log. `in_flight` drops on every
    /// path so the input control never stays disabled.
    pub fn settle_submit(
        &mut self,
        outcome: Result<AssistantTurnResponse, GatewayError>,
        now: DateTime<Utc>,
    ) -> Vec<UiEffect> {
        let id = self.ids.next(now);
        let message = match outcome {
            Ok(response) => Message {
                id,
                text: response.response,
                sender: Sender::Assistant,
                timestamp: response.timestamp,
            },
            Err(error) => {
                let text = error
                    .fallback()
                    .unwrap_or(CONNECTION_APOLOGY)
                    .to_string();
                Message::new(id, text, Sender::Assistant, now)
            }
        };
        self.messages.push(message);
        self.in_flight = false;
        vec![UiEffect::ScrollToLatest]
    }
}

/// Owns the chat session and talks to the assistant endpoint. Constructed
/// per hosting view; dropping it discards the conversation.
pub struct ConversationController {
    state: Mutex<ChatState>,
    gateway: Arc<dyn RemoteGateway>,
    clock: Arc<dyn Clock>,
}

impl ConversationController {
    pub fn new(
        gateway: Arc<dyn RemoteGateway>,
        clock: Arc<dyn Clock>,
        authenticated: bool,
        current_route: impl Into<String>,
    ) -> Self {
        let state = ChatState::new(authenticated, current_route, clock.now());
        Self {
            state: Mutex::new(state),
            gateway,
            clock,
        }
    }

    /// Dispatch the pending input as a turn. Returns the UI effects from both
    /// the optimistic append and the settlement. Silent no-op when the input
    /// is blank or another turn is in flight.
    pub async fn submit(&self) -> Vec<UiEffect> {
        let begun = {
            let mut state = self.state.lock().await;
            state.begin_submit(self.clock.now())
        };
        let Some((request, mut effects)) = begun else {
            return Vec::new();
        };

        let outcome = self.gateway.assistant_turn(request).await;
        if let Err(error) = &outcome {
            tracing::warn!(error = %error, "assistant turn failed");
        }

        let mut state = self.state.lock().await;
        effects.extend(state.settle_submit(outcome, self.clock.now()));
        effects
    }

    /// Populate the input and submit in one step (quick questions and any
    /// host that doesn't track a draft buffer).
    pub async fn submit_text(&self, text: impl Into<String>) -> Vec<UiEffect> {
        {
            let mut state = self.state.lock().await;
            state.set_input(text);
        }
        self.submit().await
    }

    pub async fn set_input(&self, text: impl Into<String>) {
        self.state.lock().await.set_input(text);
    }

    pub async fn toggle_widget(&self) -> Vec<UiEffect> {
        self.state.lock().await.toggle_widget()
    }

    pub async fn toggle_minimize(&self) -> Vec<UiEffect> {
        self.state.lock().await.toggle_minimize()
    }

    pub async fn close(&self) {
        self.state.lock().await.close()
    }

    pub async fn refresh_environment(&self, authenticated: bool, route: impl Into<String>) {
        self.state
            .lock()
            .await
            .refresh_environment(authenticated, route);
    }

    pub async fn reset(&self) {
        self.state.lock().await.reseed(self.clock.now());
    }

    pub async fn quick_questions(&self) -> Option<&'static [&'static str]> {
        self.state.lock().await.quick_questions()
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.state.lock().await.messages.clone()
    }

    pub async fn visibility(&self) -> Visibility {
        self.state.lock().await.visibility
    }

    pub async fn in_flight(&self) -> bool {
        self.state.lock().await.in_flight
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::clock::testing::ManualClock;
    use crate::controllers::testing::MockGateway;

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn state() -> ChatState {
        ChatState::new(false, "/dashboard", now())
    }

    #[test]
    fn starts_closed_with_one_welcome_message() {
        let state = state();
        assert_eq!(state.visibility, Visibility::Closed);
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].sender, Sender::Assistant);
        assert_eq!(state.messages[0].text, WELCOME_MESSAGE);
        assert!(!state.in_flight);
    }

    #[test]
    fn context_window_holds_at_most_five_recent_messages_in_order() {
        for log_len in 0..8usize {
            let mut state = state();
            state.messages.clear();
            for i in 0..log_len {
                state
                    .messages
                    .push(Message::new(i as u64, format!("m{i}"), Sender::User, now()));
            }

            let context = state.context_window();
            assert_eq!(context.len(), log_len.min(5));
            let expected: Vec<_> = state.messages[log_len.saturating_sub(5)..].to_vec();
            assert_eq!(context, expected);
        }
    }

    #[test]
    fn begin_submit_appends_user_turn_and_excludes_it_from_context() {
        let mut state = state();
        state.set_input("What moved AAPL today?");
        let (request, effects) = state.begin_submit(now()).expect("should dispatch");

        assert_eq!(request.message, "What moved AAPL today?");
        assert_eq!(request.context.len(), 1);
        assert_eq!(request.context[0].text, WELCOME_MESSAGE);
        assert_eq!(request.current_page, "/dashboard");
        assert!(!request.is_authenticated);

        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[1].sender, Sender::User);
        assert!(state.pending_input.is_empty());
        assert!(state.in_flight);
        assert_eq!(effects, vec![UiEffect::ScrollToLatest]);
    }

    #[test]
    fn blank_input_and_in_flight_submissions_are_silent_noops() {
        let mut state = state();
        state.set_input("   ");
        assert!(state.begin_submit(now()).is_none());
        assert_eq!(state.messages.len(), 1);
        assert!(!state.in_flight);

        state.set_input("real question");
        assert!(state.begin_submit(now()).is_some());
        state.set_input("second while first in flight");
        assert!(state.begin_submit(now()).is_none());
        assert_eq!(state.messages.len(), 2);
    }

    #[test]
    fn settle_success_uses_server_text_and_timestamp() {
        let mut state = state();
        state.set_input("hello");
        state.begin_submit(now());

        state.settle_submit(
            Ok(AssistantTurnResponse {
                response: "Here's what I found.".into(),
                timestamp: "2024-03-01T12:00:05+00:00".into(),
            }),
            now(),
        );

        let last = state.messages.last().unwrap();
        assert_eq!(last.sender, Sender::Assistant);
        assert_eq!(last.text, "Here's what I found.");
        assert_eq!(last.timestamp, "2024-03-01T12:00:05+00:00");
        assert!(!state.in_flight);
    }

    #[test]
    fn settle_failure_prefers_server_fallback_over_apology() {
        let mut state = state();
        state.set_input("hello");
        state.begin_submit(now());
        state.settle_submit(
            Err(GatewayError::Http {
                status: 503,
                fallback: Some("The assistant is over capacity.".into()),
            }),
            now(),
        );
        assert_eq!(
            state.messages.last().unwrap().text,
            "The assistant is over capacity."
        );
        assert!(!state.in_flight);

        state.set_input("again");
        state.begin_submit(now());
        state.settle_submit(Err(GatewayError::Network("timed out".into())), now());
        assert_eq!(state.messages.last().unwrap().text, CONNECTION_APOLOGY);
        assert!(!state.in_flight);
    }

    #[test]
    fn visibility_machine_and_focus_effects() {
        let mut state = state();

        assert_eq!(state.toggle_widget(), vec![UiEffect::FocusInput]);
        assert_eq!(state.visibility, Visibility::Open);

        assert!(state.toggle_minimize().is_empty());
        assert_eq!(state.visibility, Visibility::Minimized);

        assert_eq!(state.toggle_minimize(), vec![UiEffect::FocusInput]);
        assert_eq!(state.visibility, Visibility::Open);

        state.toggle_minimize();
        assert!(state.toggle_widget().is_empty());
        assert_eq!(state.visibility, Visibility::Closed);

        // minimize does nothing while closed
        assert!(state.toggle_minimize().is_empty());
        assert_eq!(state.visibility, Visibility::Closed);

        state.toggle_widget();
        state.close();
        assert_eq!(state.visibility, Visibility::Closed);
    }

    #[test]
    fn quick_questions_gate_on_pristine_log_and_auth() {
        let mut state = state();
        assert_eq!(state.quick_questions(), Some(ANONYMOUS_QUICK_QUESTIONS));

        state.refresh_environment(true, "/predict");
        assert_eq!(state.quick_questions(), Some(AUTHENTICATED_QUICK_QUESTIONS));
        assert_eq!(state.current_route, "/predict");

        state.set_input("first exchange");
        state.begin_submit(now());
        assert_eq!(state.quick_questions(), None);
    }

    #[test]
    fn reseed_is_idempotent_regardless_of_log_length() {
        let mut state = state();
        for i in 0..10 {
            state
                .messages
                .push(Message::new(100 + i, "turn", Sender::User, now()));
        }
        state.reseed(now());
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].text, WELCOME_MESSAGE);

        state.reseed(now());
        assert_eq!(state.messages.len(), 1);
    }

    #[tokio::test]
    async fn submit_settles_in_flight_false_on_success_and_failure() {
        let gateway = Arc::new(MockGateway::new());
        let clock = Arc::new(ManualClock::new());
        let controller =
            ConversationController::new(gateway.clone(), clock, false, "/news");

        gateway.assistant.lock().unwrap().push_back(Ok(AssistantTurnResponse {
            response: "answer".into(),
            timestamp: "2024-03-01T12:00:01+00:00".into(),
        }));
        controller.submit_text("works?").await;
        assert!(!controller.in_flight().await);
        assert_eq!(controller.messages().await.last().unwrap().text, "answer");

        gateway
            .assistant
            .lock()
            .unwrap()
            .push_back(Err(GatewayError::Network("down".into())));
        controller.submit_text("and now?").await;
        assert!(!controller.in_flight().await);
        assert_eq!(
            controller.messages().await.last().unwrap().text,
            CONNECTION_APOLOGY
        );
        assert_eq!(gateway.calls().assistant, 2);
    }

    #[tokio::test]
    async fn blank_submission_never_reaches_the_gateway() {
        let gateway = Arc::new(MockGateway::new());
        let clock = Arc::new(ManualClock::new());
        let controller = ConversationController::new(gateway.clone(), clock, false, "/");

        let effects = controller.submit_text("   ").await;
        assert!(effects.is_empty());
        assert_eq!(gateway.calls().assistant, 0);
    }
}
