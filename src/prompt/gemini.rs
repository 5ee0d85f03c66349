//! The Gemini-backed [PromptService] implementation.
//!
//! Talks to the `generateContent` REST endpoint. Insight requests use a
//! response schema so the reply parses straight into [FinancialInsight];
//! chat requests declare the transaction tool and drive the call/response
//! loop until the model produces text.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use time::format_description::well_known::Rfc3339;

use crate::{
    Error,
    insight::{FinancialInsight, InsightRequest},
    prompt::{
        AssistantRequest, PromptService, TransactionFetch,
        wire::{
            Content, FunctionCall, FunctionDeclaration, GenerateContentRequest,
            GenerateContentResponse, GenerationConfig, Tool,
        },
    },
};

/// The model used when `GEMINI_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_TOOL_ROUNDS: usize = 4;

/// The tool the model calls to read the ledger. The name is baked into the
/// assistant's system prompt.
const GET_TRANSACTIONS_TOOL: &str = "getTransactionsTool";

const GET_TRANSACTIONS_DESCRIPTION: &str = "Retrieves the user's list of financial transactions. \
    Use this tool to answer any questions about their income, expenses, or specific transaction \
    details.";

/// How many characters of an error body are kept in [Error::PromptStatus].
const STATUS_MESSAGE_LIMIT: usize = 300;

/// Configuration for the Gemini client.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key sent with every request.
    pub api_key: String,
    /// The model that answers requests.
    pub model: String,
    /// Base URL of the API.
    ///
    /// Useful for proxies or local test servers.
    pub base_url: String,
    /// HTTP timeout for each request.
    pub timeout: Duration,
    /// How many tool call rounds one chat turn may use.
    pub max_tool_rounds: usize,
}

impl GeminiConfig {
    /// Creates a config with default settings and the provided API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_owned(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    /// Builds a config from `GEMINI_API_KEY`, honouring `GEMINI_MODEL` when
    /// set.
    ///
    /// # Errors
    /// This function will return a [Error::PromptConfig] if `GEMINI_API_KEY`
    /// is missing or blank.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = std::env::var("GEMINI_API_KEY").unwrap_or_default();
        if api_key.trim().is_empty() {
            return Err(Error::PromptConfig(
                "missing GEMINI_API_KEY for the Gemini prompt service".to_owned(),
            ));
        }

        let mut config = Self::new(api_key);
        if let Ok(model) = std::env::var("GEMINI_MODEL")
            && !model.trim().is_empty()
        {
            config = config.model(model);
        }

        Ok(config)
    }

    /// Overrides the model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Overrides the API base URL (for proxies or test servers).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the default HTTP timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides how many tool call rounds one chat turn may use.
    pub fn max_tool_rounds(mut self, max_tool_rounds: usize) -> Self {
        self.max_tool_rounds = max_tool_rounds;
        self
    }

    fn generate_content_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

/// A [PromptService] backed by the Gemini API.
pub struct GeminiPromptService {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiPromptService {
    /// Creates a service from explicit configuration.
    ///
    /// # Errors
    /// This function will return a [Error::PromptConfig] if the API key is
    /// blank or the HTTP client could not be built.
    pub fn new(config: GeminiConfig) -> Result<Self, Error> {
        if config.api_key.trim().is_empty() {
            return Err(Error::PromptConfig(
                "the Gemini API key must not be empty".to_owned(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|error| {
                Error::PromptConfig(format!("failed to build the Gemini HTTP client: {error}"))
            })?;

        Ok(Self { client, config })
    }

    /// Creates a service using `GEMINI_API_KEY`.
    ///
    /// # Errors
    /// This function will return a [Error::PromptConfig] if `GEMINI_API_KEY`
    /// is missing or blank.
    pub fn from_env() -> Result<Self, Error> {
        Self::new(GeminiConfig::from_env()?)
    }

    async fn generate(
        &self,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, Error> {
        let response = self
            .client
            .post(self.config.generate_content_url())
            .header("x-goog-api-key", &self.config.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());

            return Err(Error::PromptStatus {
                status: status.as_u16(),
                message: truncate_body(&body),
            });
        }

        response.json().await.map_err(|error| {
            Error::PromptSchema(format!("could not parse the response body: {error}"))
        })
    }
}

#[async_trait]
impl PromptService for GeminiPromptService {
    async fn generate_insight(&self, request: &InsightRequest) -> Result<FinancialInsight, Error> {
        let body = GenerateContentRequest {
            system_instruction: None,
            contents: vec![Content::user_text(render_insight_prompt(request))],
            tools: None,
            generation_config: Some(GenerationConfig {
                response_mime_type: "application/json".to_owned(),
                response_schema: Some(insight_response_schema()),
            }),
        };

        let response = self.generate(&body).await?;

        let Some(text) = response.text() else {
            return Err(Error::PromptSchema(
                "the model returned no insight text".to_owned(),
            ));
        };

        serde_json::from_str(text).map_err(|error| {
            Error::PromptSchema(format!(
                "the insight reply did not match the expected shape: {error}"
            ))
        })
    }

    async fn answer(
        &self,
        request: &AssistantRequest,
        transactions: &dyn TransactionFetch,
    ) -> Result<String, Error> {
        let tools = vec![transactions_tool()];
        let mut contents = vec![Content::user_text(render_chat_prompt(request))];
        let mut rounds = 0;

        loop {
            let body = GenerateContentRequest {
                system_instruction: Some(Content::system_text(request.system_prompt.as_str())),
                contents: contents.clone(),
                tools: Some(tools.clone()),
                generation_config: None,
            };

            let response = self.generate(&body).await?;

            match interpret_round(&response)? {
                RoundOutcome::Reply(text) => return Ok(text),
                RoundOutcome::ToolCall { call, turn } => {
                    rounds += 1;
                    if rounds > self.config.max_tool_rounds {
                        return Err(Error::ToolRoundsExceeded(self.config.max_tool_rounds));
                    }
                    if call.name != GET_TRANSACTIONS_TOOL {
                        return Err(Error::UnknownTool(call.name));
                    }

                    tracing::debug!("tool round {rounds}: fetching transactions for the model");

                    let rows = transactions.fetch_all().await?;
                    let payload = serde_json::to_value(&rows).map_err(|error| {
                        Error::PromptSchema(format!("could not encode transactions: {error}"))
                    })?;

                    contents.push(turn);
                    contents.push(Content::function_response(
                        GET_TRANSACTIONS_TOOL,
                        json!({ "transactions": payload }),
                    ));
                }
            }
        }
    }
}

/// What the model did with one round of the chat loop.
enum RoundOutcome {
    /// The model answered with text; the turn is over.
    Reply(String),
    /// The model asked for a tool. `turn` is the model's whole content,
    /// replayed into the conversation ahead of the tool response.
    ToolCall { call: FunctionCall, turn: Content },
}

fn interpret_round(response: &GenerateContentResponse) -> Result<RoundOutcome, Error> {
    let Some(content) = response.content() else {
        return Err(Error::PromptSchema(
            "the model returned no candidates".to_owned(),
        ));
    };

    if let Some(call) = response.function_call() {
        return Ok(RoundOutcome::ToolCall {
            call: call.clone(),
            turn: content.clone(),
        });
    }

    match response.text() {
        Some(text) => Ok(RoundOutcome::Reply(text.to_owned())),
        None => Err(Error::PromptSchema(
            "the model reply had no text part".to_owned(),
        )),
    }
}

/// Render the chat history and new message into one prompt body.
///
/// Turns are labelled `### user` and `### assistant` so the model sees the
/// conversation without the request having to satisfy strict role
/// alternation.
fn render_chat_prompt(request: &AssistantRequest) -> String {
    let mut prompt = String::new();

    for message in &request.history {
        prompt.push_str(&format!(
            "### {}\n{}\n",
            message.role.as_str(),
            message.content
        ));
    }

    prompt.push_str(&format!("\n### user\n{}\n", request.message));

    prompt
}

/// Render an insight request into the advisor prompt.
///
/// The burn rate and top expense category arrive precomputed; the prompt
/// tells the model to report them rather than redo the arithmetic.
fn render_insight_prompt(request: &InsightRequest) -> String {
    let mut prompt = format!(
        "You are an AI financial advisor providing insights to small business owners.\n\n\
         Analyze the following transaction data for the month of {} and provide a financial \
         summary, burn rate, top expense category, and suggestions for the user.\n\n\
         Transactions:\n",
        request.month
    );

    for record in &request.transactions {
        let date = record
            .date
            .format(&Rfc3339)
            .unwrap_or_else(|_| record.date.to_string());

        prompt.push_str(&format!(
            "- Amount: {}, Type: {}, Category: {}, Date: {}, Payment Method: {}\n",
            record.amount,
            record.kind.as_str(),
            record.category,
            date,
            record.payment_method
        ));
    }

    let top_expense_category = if request.top_expense_category.is_empty() {
        "none"
    } else {
        request.top_expense_category.as_str()
    };

    prompt.push_str(&format!(
        "\nFigures already computed from this data:\n\
         *   Burn rate (total expenses minus total income): {}\n\
         *   Top expense category: {}\n\n\
         Constraints:\n\
         *   The summary should be concise and easy to understand.\n\
         *   Report the burn rate and top expense category given above rather than recalculating them.\n\
         *   Suggestions should be actionable and relevant to the user's situation.\n\
         *   All monetary values in USD.\n",
        request.burn_rate, top_expense_category
    ));

    prompt
}

/// The schema a [FinancialInsight] reply must satisfy.
fn insight_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": { "type": "STRING" },
            "burnRate": { "type": "NUMBER" },
            "topExpenseCategory": { "type": "STRING" },
            "suggestions": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": ["summary", "burnRate", "topExpenseCategory", "suggestions"]
    })
}

/// The transaction tool declaration sent with every chat request.
fn transactions_tool() -> Tool {
    Tool {
        function_declarations: vec![FunctionDeclaration {
            name: GET_TRANSACTIONS_TOOL.to_owned(),
            description: GET_TRANSACTIONS_DESCRIPTION.to_owned(),
            parameters: json!({ "type": "OBJECT", "properties": {} }),
        }],
    }
}

fn truncate_body(body: &str) -> String {
    let mut message: String = body.chars().take(STATUS_MESSAGE_LIMIT).collect();
    if message.len() < body.len() {
        message.push_str("...");
    }

    message
}
