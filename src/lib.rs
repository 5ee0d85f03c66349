//! BizSmart is the finance core of a small-business dashboard.
//!
//! This library keeps a session's transaction ledger in memory, answers the
//! dashboard's filter/sort/aggregate queries with pure functions, and drives
//! the two AI features built on top of the ledger: monthly insight reports
//! and a chat assistant that can pull transaction data through a tool call.

#![warn(missing_docs)]

use time::Date;

pub mod assistant;
pub mod dashboard;
pub mod insight;
pub mod prompt;
pub mod transaction;

/// The errors that may occur in the application.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum Error {
    /// A zero or negative amount was used to create an entry.
    ///
    /// Amounts are stored positive; direction comes from the transaction
    /// type, so a non-positive amount has no meaning.
    #[error("the amount must be greater than zero, got {0}")]
    NonPositiveAmount(f64),

    /// An entry description was outside the accepted length range.
    ///
    /// Length is measured in graphemes so multi-byte text is not penalised.
    #[error("the description must be between 2 and 100 characters, got {0}")]
    DescriptionLength(usize),

    /// A date in the future was used to create an entry.
    ///
    /// Transactions record events that have already happened, therefore
    /// future dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// An income or expense entry was created without a category.
    #[error("a category is required for income and expense entries")]
    MissingCategory,

    /// An income or expense entry was created without an account.
    #[error("an account is required for income and expense entries")]
    MissingAccount,

    /// A transfer entry was missing its source or destination account.
    #[error("both a source and a destination account are required for a transfer")]
    MissingTransferAccount,

    /// A transfer entry named the same account on both sides.
    #[error("cannot transfer from the account \"{0}\" to itself")]
    SameTransferAccount(String),

    /// A report month string could not be parsed.
    #[error("could not parse \"{0}\" as a report month, expected YYYY-MM")]
    InvalidMonth(String),

    /// Could not acquire the transaction store lock.
    #[error("could not acquire the transaction store lock")]
    StoreLock,

    /// The prompt service was configured with unusable settings, such as a
    /// missing API key.
    #[error("invalid prompt service configuration: {0}")]
    PromptConfig(String),

    /// The prompt service could not be reached, or the request timed out.
    #[error("could not reach the prompt service: {0}")]
    PromptTransport(String),

    /// The prompt service answered with a non-success HTTP status.
    #[error("the prompt service returned status {status}: {message}")]
    PromptStatus {
        /// The HTTP status code of the response.
        status: u16,
        /// A snippet of the response body for debugging.
        message: String,
    },

    /// The prompt service produced output that did not match the expected
    /// schema.
    ///
    /// Insight reports are parsed all-or-nothing, so this error never comes
    /// with partially populated fields.
    #[error("the prompt service response did not match the expected schema: {0}")]
    PromptSchema(String),

    /// The model kept requesting tool calls past the configured limit.
    #[error("the prompt service exceeded {0} tool call rounds")]
    ToolRoundsExceeded(usize),

    /// The model requested a tool this crate does not provide.
    #[error("the model requested an unknown tool: {0}")]
    UnknownTool(String),
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            return Error::PromptTransport(format!("the request timed out: {value}"));
        }

        Error::PromptTransport(value.to_string())
    }
}
