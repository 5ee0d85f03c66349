//! The AI assistant chat session.
//!
//! [ChatSession] owns a chat transcript and the small state machine around
//! it: it turns user input into an [AssistantRequest], blocks further input
//! while one is outstanding, and lands the reply (or a fallback) back in the
//! transcript. The session never talks to the network itself; callers pass
//! the request to a [PromptService] and hand the outcome back.

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    prompt::{AssistantRequest, PromptService, TransactionFetch},
};

/// The assistant's opening message in every new session.
pub const GREETING: &str = "Hello! I'm BizSmart AI. How can I help you today?";

/// Shown in place of a reply when the prompt service fails.
pub const FALLBACK_REPLY: &str = "Sorry, something went wrong. Please try again.";

/// How many trailing messages are replayed to the model for context.
const HISTORY_WINDOW: usize = 10;

/// The persona and ground rules sent with every chat turn.
pub const SYSTEM_PROMPT: &str = r#"You are BizSmart AI, a friendly and expert financial assistant for small business owners.
Your goal is to provide helpful answers about the user's finances and guide them through the app.

## Application Features:
- **Dashboard**: The main overview of finances, showing total income, expenses, profit, and cash on hand.
- **Transactions**: A page to view and filter all financial transactions.
- **AI Insights**: A page that provides AI-generated financial summaries, burn rate, and suggestions.
- **Settings**: A page to manage company info, finance settings, and notifications.

## Your Capabilities:
- You can answer questions about the app's features.
- You can analyze the user's financial data to answer specific questions.
- **IMPORTANT**: When the user asks a question about their transactions, income, expenses, or any financial calculation, you MUST use the `getTransactionsTool` to fetch their data. Do not make up financial information. Base your answers on the data returned by the tool.

## Response Style:
- Be concise, friendly, and professional.
- Use markdown for formatting when it improves readability (e.g., lists, bold text).
"#;

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// The business owner.
    User,
    /// The assistant.
    Assistant,
}

impl ChatRole {
    /// The role's name as it appears in prompt transcripts.
    pub fn as_str(self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// One message in a chat transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who authored the message.
    pub role: ChatRole,
    /// The message text.
    pub content: String,
}

impl ChatMessage {
    /// A message authored by the business owner.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// A message authored by the assistant.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Idle,
    AwaitingResponse,
}

/// A chat transcript and the turn-taking rules around it.
///
/// At most one request is in flight at a time: [ChatSession::submit] returns
/// `None` until the previous turn is resolved, mirroring a disabled input
/// box. Messages are stored exactly as typed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    state: SessionState,
}

impl ChatSession {
    /// Start a session opened by the assistant's greeting.
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(GREETING)],
            state: SessionState::Idle,
        }
    }

    /// The transcript so far, oldest message first.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Whether a request is in flight and input is blocked.
    pub fn is_busy(&self) -> bool {
        self.state == SessionState::AwaitingResponse
    }

    /// Accept a user message and produce the request to answer it.
    ///
    /// The request's history holds the last ten messages as they stood
    /// before `text` was appended. Returns `None`, leaving the transcript
    /// untouched, when `text` is blank or a request is already in flight.
    pub fn submit(&mut self, text: &str) -> Option<AssistantRequest> {
        if self.is_busy() || text.trim().is_empty() {
            return None;
        }

        let history_start = self.messages.len().saturating_sub(HISTORY_WINDOW);
        let history = self.messages[history_start..].to_vec();

        self.messages.push(ChatMessage::user(text));
        self.state = SessionState::AwaitingResponse;

        Some(AssistantRequest {
            system_prompt: SYSTEM_PROMPT.to_owned(),
            history,
            message: text.to_owned(),
        })
    }

    /// Land the outcome of the in-flight request in the transcript.
    ///
    /// A successful outcome appends the reply; a failed one appends
    /// [FALLBACK_REPLY] so the conversation can continue. Does nothing when
    /// no request is in flight.
    pub fn resolve(&mut self, outcome: Result<String, Error>) {
        if self.state == SessionState::Idle {
            return;
        }

        match outcome {
            Ok(reply) => self.messages.push(ChatMessage::assistant(reply)),
            Err(error) => {
                tracing::warn!("The prompt service failed to answer: {error}");
                self.messages.push(ChatMessage::assistant(FALLBACK_REPLY));
            }
        }

        self.state = SessionState::Idle;
    }

    /// Run one full chat turn against `service`.
    ///
    /// Combines [ChatSession::submit] and [ChatSession::resolve], so the
    /// transcript always gains a reply or the fallback. Returns the
    /// assistant's new message, or `None` when the input was rejected.
    pub async fn send(
        &mut self,
        text: &str,
        service: &dyn PromptService,
        transactions: &dyn TransactionFetch,
    ) -> Option<&ChatMessage> {
        let request = self.submit(text)?;
        let outcome = service.answer(&request, transactions).await;
        self.resolve(outcome);

        self.messages.last()
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use crate::{
        Error,
        assistant::{ChatMessage, ChatSession, FALLBACK_REPLY, GREETING},
        insight::{FinancialInsight, InsightRequest},
        prompt::{AssistantRequest, PromptService, TransactionFetch},
        transaction::Transaction,
    };

    struct CannedService {
        reply: Result<String, Error>,
    }

    #[async_trait]
    impl PromptService for CannedService {
        async fn generate_insight(
            &self,
            _request: &InsightRequest,
        ) -> Result<FinancialInsight, Error> {
            unreachable!("chat turns must not request insights")
        }

        async fn answer(
            &self,
            _request: &AssistantRequest,
            _transactions: &dyn TransactionFetch,
        ) -> Result<String, Error> {
            self.reply.clone()
        }
    }

    struct EmptyLedger;

    #[async_trait]
    impl TransactionFetch for EmptyLedger {
        async fn fetch_all(&self) -> Result<Vec<Transaction>, Error> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn new_session_opens_with_the_greeting() {
        let session = ChatSession::new();

        assert_eq!(session.messages(), [ChatMessage::assistant(GREETING)]);
        assert!(!session.is_busy());
    }

    #[test]
    fn submit_captures_history_before_the_new_message() {
        let mut session = ChatSession::new();

        let request = session
            .submit("What did I spend on rent?")
            .expect("Could not submit message");

        assert_eq!(request.history, vec![ChatMessage::assistant(GREETING)]);
        assert_eq!(request.message, "What did I spend on rent?");
        assert_eq!(session.messages().len(), 2);
        assert_eq!(
            session.messages()[1],
            ChatMessage::user("What did I spend on rent?")
        );
        assert!(session.is_busy());
    }

    #[test]
    fn submit_keeps_messages_exactly_as_typed() {
        let mut session = ChatSession::new();

        let request = session
            .submit("  how much profit?  ")
            .expect("Could not submit");

        assert_eq!(request.message, "  how much profit?  ");
        assert_eq!(session.messages()[1].content, "  how much profit?  ");
    }

    #[test]
    fn submit_rejects_blank_messages() {
        let mut session = ChatSession::new();

        assert_eq!(session.submit("   "), None);
        assert_eq!(session.messages().len(), 1);
        assert!(!session.is_busy());
    }

    #[test]
    fn submit_rejects_input_while_a_request_is_in_flight() {
        let mut session = ChatSession::new();
        session.submit("first").expect("Could not submit");

        assert_eq!(session.submit("second"), None);
        assert_eq!(session.messages().len(), 2);
    }

    #[test]
    fn history_is_limited_to_the_last_ten_messages() {
        let mut session = ChatSession::new();
        for i in 0..6 {
            session.submit(&format!("q{i}")).expect("Could not submit");
            session.resolve(Ok(format!("a{i}")));
        }

        // Transcript is now greeting + 12 messages.
        let request = session.submit("next").expect("Could not submit");

        assert_eq!(request.history.len(), 10);
        assert_eq!(request.history[0], ChatMessage::user("q1"));
        assert_eq!(request.history[9], ChatMessage::assistant("a5"));
    }

    #[test]
    fn resolve_appends_the_reply_and_unblocks_input() {
        let mut session = ChatSession::new();
        session.submit("hello").expect("Could not submit");

        session.resolve(Ok("Hi! How can I help?".to_owned()));

        assert_eq!(
            session.messages().last(),
            Some(&ChatMessage::assistant("Hi! How can I help?"))
        );
        assert!(!session.is_busy());
    }

    #[test]
    fn resolve_falls_back_when_the_service_fails() {
        let mut session = ChatSession::new();
        session.submit("hello").expect("Could not submit");

        session.resolve(Err(Error::PromptTransport("connection reset".to_owned())));

        assert_eq!(
            session.messages().last(),
            Some(&ChatMessage::assistant(FALLBACK_REPLY))
        );
        assert!(!session.is_busy());
    }

    #[test]
    fn resolve_without_a_pending_request_is_ignored() {
        let mut session = ChatSession::new();

        session.resolve(Ok("stray reply".to_owned()));

        assert_eq!(session.messages(), [ChatMessage::assistant(GREETING)]);
    }

    #[tokio::test]
    async fn send_runs_a_full_turn() {
        let mut session = ChatSession::new();
        let service = CannedService {
            reply: Ok("You spent $300 on rent.".to_owned()),
        };

        let reply = session
            .send("What did I spend on rent?", &service, &EmptyLedger)
            .await
            .expect("No reply message");

        assert_eq!(reply, &ChatMessage::assistant("You spent $300 on rent."));
        assert_eq!(session.messages().len(), 3);
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn send_lands_the_fallback_when_the_service_fails() {
        let mut session = ChatSession::new();
        let service = CannedService {
            reply: Err(Error::PromptStatus {
                status: 503,
                message: "overloaded".to_owned(),
            }),
        };

        let reply = session
            .send("hello", &service, &EmptyLedger)
            .await
            .expect("No reply message");

        assert_eq!(reply, &ChatMessage::assistant(FALLBACK_REPLY));
    }

    #[tokio::test]
    async fn send_returns_none_for_rejected_input() {
        let mut session = ChatSession::new();
        let service = CannedService {
            reply: Ok("unused".to_owned()),
        };

        let reply = session.send("   ", &service, &EmptyLedger).await;

        assert_eq!(reply, None);
        assert_eq!(session.messages().len(), 1);
    }
}
