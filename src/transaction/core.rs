//! Defines the core data models for the transaction ledger.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// The ID of a [Transaction], minted by the store on append.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(String);

impl TransactionId {
    /// Mint a fresh, unique transaction ID.
    pub(crate) fn generate() -> Self {
        Self(format!("txn_{}", Uuid::new_v4()))
    }

    /// The ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies the business owner a ledger belongs to.
///
/// The authentication boundary resolves this outside the crate; the store
/// stamps it onto every transaction it accepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Wrap a resolved user identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether money flowed into or out of the business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money earned by the business.
    Income,
    /// Money spent by the business.
    Expense,
}

impl TransactionType {
    /// The type's name as it appears on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

/// A single money movement in the ledger.
///
/// The amount is always stored positive; its meaning comes from the
/// transaction type. Transactions are never mutated or deleted, and live for
/// the session.
///
/// The serialized form uses the dashboard's wire names, with the type under
/// the `"type"` key, so the assistant's transaction tool returns the shape
/// the model was taught.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The owner of the ledger this transaction belongs to.
    pub user_id: UserId,
    /// The amount of money that moved, always positive.
    pub amount: f64,
    /// Whether the transaction is income or an expense.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// The category the transaction belongs to, e.g. "Rent" or "Sales".
    pub category: String,
    /// When the transaction happened.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// How the money moved, e.g. "Cash" or "Bank Transfer".
    pub payment_method: String,
    /// A text description of what the transaction was for.
    pub description: String,
}

/// The caller-supplied fields of a [Transaction].
///
/// The store mints the ID and stamps the session user on append.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// The amount of money that moved, always positive.
    pub amount: f64,
    /// Whether the transaction is income or an expense.
    pub kind: TransactionType,
    /// The category the transaction belongs to.
    pub category: String,
    /// When the transaction happened.
    pub date: OffsetDateTime,
    /// How the money moved.
    pub payment_method: String,
    /// A text description of what the transaction was for.
    pub description: String,
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::{Transaction, TransactionId, TransactionType, UserId};

    fn sample_transaction() -> Transaction {
        Transaction {
            id: TransactionId::generate(),
            user_id: UserId::new("user_123"),
            amount: 49.99,
            kind: TransactionType::Expense,
            category: "Supplies".to_owned(),
            date: datetime!(2024-05-01 09:30:00 UTC),
            payment_method: "Credit Card".to_owned(),
            description: "Printer paper".to_owned(),
        }
    }

    #[test]
    fn generated_ids_are_unique_and_prefixed() {
        let first = TransactionId::generate();
        let second = TransactionId::generate();

        assert!(first.as_str().starts_with("txn_"));
        assert!(second.as_str().starts_with("txn_"));
        assert_ne!(first, second);
    }

    #[test]
    fn transaction_serializes_with_wire_field_names() {
        let transaction = sample_transaction();

        let value = serde_json::to_value(&transaction).expect("Could not serialize transaction");

        assert_eq!(value["userId"], "user_123");
        assert_eq!(value["type"], "expense");
        assert_eq!(value["paymentMethod"], "Credit Card");
        assert_eq!(value["date"], "2024-05-01T09:30:00Z");
        assert!(value.get("kind").is_none());
    }

    #[test]
    fn transaction_round_trips_through_json() {
        let transaction = sample_transaction();

        let json = serde_json::to_string(&transaction).expect("Could not serialize transaction");
        let parsed: Transaction =
            serde_json::from_str(&json).expect("Could not deserialize transaction");

        assert_eq!(parsed, transaction);
    }
}
