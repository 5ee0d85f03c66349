//! The prompt service boundary.
//!
//! [PromptService] is the seam between the finance core and whichever LLM
//! backend answers for it. Production code uses [GeminiPromptService]; tests
//! substitute canned implementations so nothing in the crate needs a network
//! to be exercised.

mod gemini;
mod wire;

pub use gemini::{DEFAULT_MODEL, GeminiConfig, GeminiPromptService};

use async_trait::async_trait;

use crate::{
    Error,
    assistant::ChatMessage,
    insight::{FinancialInsight, InsightRequest},
    transaction::{InMemoryTransactionStore, Transaction, TransactionStore},
};

/// One chat turn, ready to send to the prompt service.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantRequest {
    /// The persona and ground rules for the reply.
    pub system_prompt: String,
    /// Recent messages, oldest first, for conversational context.
    pub history: Vec<ChatMessage>,
    /// The user's new message.
    pub message: String,
}

/// Read access to the ledger for the assistant's transaction tool.
#[async_trait]
pub trait TransactionFetch: Send + Sync {
    /// Every transaction visible to the current session.
    ///
    /// # Errors
    /// This function will return a [Error::StoreLock] if the ledger could
    /// not be read.
    async fn fetch_all(&self) -> Result<Vec<Transaction>, Error>;
}

#[async_trait]
impl TransactionFetch for InMemoryTransactionStore {
    async fn fetch_all(&self) -> Result<Vec<Transaction>, Error> {
        self.all()
    }
}

/// An LLM backend that writes insight reports and answers chat messages.
#[async_trait]
pub trait PromptService: Send + Sync {
    /// Produce a structured financial insight for `request`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::PromptTransport] if the backend could not be reached,
    /// - [Error::PromptStatus] if the backend rejected the request,
    /// - [Error::PromptSchema] if the reply did not match [FinancialInsight].
    async fn generate_insight(&self, request: &InsightRequest) -> Result<FinancialInsight, Error>;

    /// Answer one chat turn, consulting `transactions` when the model asks
    /// for ledger data.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::PromptTransport] if the backend could not be reached,
    /// - [Error::PromptStatus] if the backend rejected the request,
    /// - [Error::PromptSchema] if the reply carried no usable text,
    /// - [Error::ToolRoundsExceeded] if the model kept requesting data past
    ///   the configured limit,
    /// - [Error::UnknownTool] if the model called a tool this crate does not
    ///   provide.
    async fn answer(
        &self,
        request: &AssistantRequest,
        transactions: &dyn TransactionFetch,
    ) -> Result<String, Error>;
}
