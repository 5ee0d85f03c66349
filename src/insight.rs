//! Monthly AI insight reports.
//!
//! Assembles the request for a month's financial review and hands it to a
//! [PromptService]. The burn rate and top expense category are computed here
//! with the same aggregation the dashboard uses, so the model comments on
//! figures instead of doing arithmetic.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::{Month, OffsetDateTime};

use crate::{
    Error,
    dashboard::{burn_rate, top_expense_category},
    prompt::PromptService,
    transaction::{DateRange, Transaction, TransactionType, UserId, month_bounds},
};

/// The calendar month an insight report covers, e.g. `2024-05`.
///
/// Serializes as its `YYYY-MM` string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReportMonth {
    year: i32,
    month: Month,
}

impl ReportMonth {
    /// Create a report month for `month` of `year`.
    pub fn new(year: i32, month: Month) -> Self {
        Self { year, month }
    }

    /// The report month containing `instant`.
    pub fn containing(instant: OffsetDateTime) -> Self {
        Self {
            year: instant.year(),
            month: instant.month(),
        }
    }

    /// The full range of dates in this month.
    pub fn date_range(self) -> DateRange {
        month_bounds(self.year, self.month)
    }
}

impl fmt::Display for ReportMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, u8::from(self.month))
    }
}

impl FromStr for ReportMonth {
    type Err = Error;

    /// Parse a `YYYY-MM` string such as `2024-05`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidMonth(s.to_owned());

        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }

        let year = year.parse().map_err(|_| invalid())?;
        let month = month
            .parse::<u8>()
            .ok()
            .and_then(|number| Month::try_from(number).ok())
            .ok_or_else(invalid)?;

        Ok(Self { year, month })
    }
}

impl Serialize for ReportMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ReportMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;

        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The transaction fields shared with the prompt service.
///
/// IDs and free-text descriptions stay inside the crate; the model only
/// needs the figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// The amount of money that moved.
    pub amount: f64,
    /// Whether the transaction is income or an expense.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// The category the transaction belongs to.
    pub category: String,
    /// When the transaction happened.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// How the money moved.
    pub payment_method: String,
}

impl From<&Transaction> for TransactionRecord {
    fn from(transaction: &Transaction) -> Self {
        Self {
            amount: transaction.amount,
            kind: transaction.kind,
            category: transaction.category.clone(),
            date: transaction.date,
            payment_method: transaction.payment_method.clone(),
        }
    }
}

/// A fully-prepared monthly insight request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightRequest {
    /// The user the report is for.
    pub user_id: UserId,
    /// The month's transactions.
    pub transactions: Vec<TransactionRecord>,
    /// The month the report covers.
    pub month: ReportMonth,
    /// Expenses minus income across `transactions`.
    pub burn_rate: f64,
    /// The category with the highest expense total, or empty when the month
    /// had no expenses.
    pub top_expense_category: String,
}

impl InsightRequest {
    /// Assemble a request from one month of transactions.
    ///
    /// `transactions` should already be narrowed to `month`; the request
    /// reports on whatever it is given.
    pub fn new(user_id: UserId, transactions: &[Transaction], month: ReportMonth) -> Self {
        Self {
            user_id,
            transactions: transactions.iter().map(TransactionRecord::from).collect(),
            month,
            burn_rate: burn_rate(transactions),
            top_expense_category: top_expense_category(transactions).unwrap_or_default(),
        }
    }
}

/// The structured advice returned for an [InsightRequest].
///
/// Every field is required. A response missing any of them is rejected
/// whole rather than patched up, so callers never see a partial insight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialInsight {
    /// A short narrative of the month's financial performance.
    pub summary: String,
    /// The month's burn rate in USD.
    pub burn_rate: f64,
    /// The category with the highest expenses for the month.
    pub top_expense_category: String,
    /// Actionable suggestions for the business owner.
    pub suggestions: Vec<String>,
}

/// Generate an insight report for one month of transactions.
///
/// The request is sent to `service` exactly once; a failed call surfaces as
/// an error rather than being retried.
///
/// # Errors
/// This function will return a [Error::PromptTransport], [Error::PromptStatus],
/// or [Error::PromptSchema] if the prompt service call fails.
pub async fn generate_financial_insights(
    user_id: UserId,
    transactions: &[Transaction],
    month: ReportMonth,
    service: &dyn PromptService,
) -> Result<FinancialInsight, Error> {
    let request = InsightRequest::new(user_id, transactions, month);

    tracing::debug!(
        "requesting insights for {} over {} transactions",
        request.month,
        request.transactions.len()
    );

    service.generate_insight(&request).await
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use time::{
        Month,
        macros::{date, datetime},
    };

    use crate::{
        Error,
        insight::{FinancialInsight, InsightRequest, ReportMonth, generate_financial_insights},
        prompt::{AssistantRequest, PromptService, TransactionFetch},
        transaction::{DateRange, Transaction, TransactionId, TransactionType, UserId},
    };

    fn transaction(amount: f64, kind: TransactionType, category: &str) -> Transaction {
        Transaction {
            id: TransactionId::generate(),
            user_id: UserId::new("user_1"),
            amount,
            kind,
            category: category.to_owned(),
            date: datetime!(2024-05-10 08:00:00 UTC),
            payment_method: "Cash".to_owned(),
            description: "test".to_owned(),
        }
    }

    fn sample_insight() -> FinancialInsight {
        FinancialInsight {
            summary: "A quiet month.".to_owned(),
            burn_rate: 120.0,
            top_expense_category: "Rent".to_owned(),
            suggestions: vec!["Review subscriptions".to_owned()],
        }
    }

    struct RecordingService {
        seen: Mutex<Option<InsightRequest>>,
    }

    #[async_trait]
    impl PromptService for RecordingService {
        async fn generate_insight(
            &self,
            request: &InsightRequest,
        ) -> Result<FinancialInsight, Error> {
            *self.seen.lock().unwrap() = Some(request.clone());

            Ok(sample_insight())
        }

        async fn answer(
            &self,
            _request: &AssistantRequest,
            _transactions: &dyn TransactionFetch,
        ) -> Result<String, Error> {
            unreachable!("insight generation must not call the chat entry point")
        }
    }

    #[test]
    fn report_month_round_trips_through_its_string_form() {
        let month: ReportMonth = "2024-05".parse().expect("Could not parse month");

        assert_eq!(month, ReportMonth::new(2024, Month::May));
        assert_eq!(month.to_string(), "2024-05");
    }

    #[test]
    fn report_month_rejects_malformed_strings() {
        for raw in ["2024", "2024-13", "2024-00", "24-05", "2024-5", "abcd-ef"] {
            assert_eq!(
                raw.parse::<ReportMonth>(),
                Err(Error::InvalidMonth(raw.to_owned())),
                "{raw} should not parse"
            );
        }
    }

    #[test]
    fn report_month_date_range_covers_the_calendar_month() {
        let month = ReportMonth::new(2024, Month::February);

        assert_eq!(
            month.date_range(),
            DateRange {
                from: date!(2024 - 02 - 01),
                to: Some(date!(2024 - 02 - 29)),
            }
        );
    }

    #[test]
    fn report_month_containing_uses_the_instants_calendar_month() {
        let month = ReportMonth::containing(datetime!(2024-05-31 23:00:00 UTC));

        assert_eq!(month, ReportMonth::new(2024, Month::May));
    }

    #[test]
    fn insight_request_computes_burn_rate_and_top_category() {
        let transactions = vec![
            transaction(1000.0, TransactionType::Income, "Sales"),
            transaction(300.0, TransactionType::Expense, "Rent"),
            transaction(450.0, TransactionType::Expense, "Marketing"),
        ];

        let request = InsightRequest::new(
            UserId::new("user_1"),
            &transactions,
            ReportMonth::new(2024, Month::May),
        );

        assert_eq!(request.burn_rate, -250.0);
        assert_eq!(request.top_expense_category, "Marketing");
        assert_eq!(request.transactions.len(), 3);
    }

    #[test]
    fn insight_request_leaves_top_category_empty_without_expenses() {
        let transactions = vec![transaction(1000.0, TransactionType::Income, "Sales")];

        let request = InsightRequest::new(
            UserId::new("user_1"),
            &transactions,
            ReportMonth::new(2024, Month::May),
        );

        assert_eq!(request.top_expense_category, "");
    }

    #[test]
    fn insight_request_serializes_with_wire_names() {
        let transactions = vec![transaction(300.0, TransactionType::Expense, "Rent")];
        let request = InsightRequest::new(
            UserId::new("user_1"),
            &transactions,
            ReportMonth::new(2024, Month::May),
        );

        let value = serde_json::to_value(&request).expect("Could not serialize request");

        assert_eq!(value["userId"], "user_1");
        assert_eq!(value["month"], "2024-05");
        assert_eq!(value["burnRate"], 300.0);
        assert_eq!(value["topExpenseCategory"], "Rent");
        assert_eq!(value["transactions"][0]["type"], "expense");
        assert_eq!(value["transactions"][0]["paymentMethod"], "Cash");
        assert!(value["transactions"][0].get("description").is_none());
    }

    #[test]
    fn financial_insight_requires_every_field() {
        let missing_suggestions = r#"{
            "summary": "A quiet month.",
            "burnRate": 120.0,
            "topExpenseCategory": "Rent"
        }"#;

        let result = serde_json::from_str::<FinancialInsight>(missing_suggestions);

        assert!(result.is_err());
    }

    #[test]
    fn financial_insight_ignores_unknown_fields() {
        let with_extra = r#"{
            "summary": "A quiet month.",
            "burnRate": 120.0,
            "topExpenseCategory": "Rent",
            "suggestions": ["Review subscriptions"],
            "confidence": 0.9
        }"#;

        let insight =
            serde_json::from_str::<FinancialInsight>(with_extra).expect("Could not parse insight");

        assert_eq!(insight, sample_insight());
    }

    #[tokio::test]
    async fn generate_financial_insights_sends_the_prepared_request() {
        let transactions = vec![
            transaction(100.0, TransactionType::Income, "Sales"),
            transaction(300.0, TransactionType::Expense, "Rent"),
        ];
        let service = RecordingService {
            seen: Mutex::new(None),
        };

        let insight = generate_financial_insights(
            UserId::new("user_1"),
            &transactions,
            ReportMonth::new(2024, Month::May),
            &service,
        )
        .await
        .expect("Could not generate insights");

        assert_eq!(insight, sample_insight());

        let seen = service
            .seen
            .lock()
            .unwrap()
            .clone()
            .expect("No request sent");
        assert_eq!(seen.burn_rate, 200.0);
        assert_eq!(seen.top_expense_category, "Rent");
        assert_eq!(seen.month.to_string(), "2024-05");
    }
}
