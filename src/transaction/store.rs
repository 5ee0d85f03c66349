//! Defines the transaction store trait and its in-memory implementation.

use std::sync::Mutex;

use time::OffsetDateTime;

use crate::{
    Error,
    transaction::{Entry, NewTransaction, Transaction, TransactionId, UserId},
};

/// Handles the creation and retrieval of transactions.
///
/// Stores take `&self` and synchronise internally so that one store can be
/// shared between the dashboard and the assistant's tool calls.
pub trait TransactionStore: Send + Sync {
    /// Stamp `new_transaction` with a fresh ID and the store's user, then
    /// append it to the ledger.
    ///
    /// # Errors
    /// This function will return a [Error::StoreLock] if the ledger lock was
    /// poisoned.
    fn append(&self, new_transaction: NewTransaction) -> Result<Transaction, Error>;

    /// Retrieve every transaction in the ledger, oldest appended first.
    ///
    /// # Errors
    /// This function will return a [Error::StoreLock] if the ledger lock was
    /// poisoned.
    fn all(&self) -> Result<Vec<Transaction>, Error>;
}

/// A [TransactionStore] that keeps the ledger in a mutex-guarded vector.
#[derive(Debug)]
pub struct InMemoryTransactionStore {
    user_id: UserId,
    transactions: Mutex<Vec<Transaction>>,
}

impl InMemoryTransactionStore {
    /// Create an empty store whose transactions belong to `user_id`.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            transactions: Mutex::new(Vec::new()),
        }
    }

    /// Create a store pre-populated with `transactions`.
    pub fn with_transactions(user_id: UserId, transactions: Vec<Transaction>) -> Self {
        Self {
            user_id,
            transactions: Mutex::new(transactions),
        }
    }

    /// The user that owns every transaction in this store.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }
}

impl TransactionStore for InMemoryTransactionStore {
    fn append(&self, new_transaction: NewTransaction) -> Result<Transaction, Error> {
        let transaction = Transaction {
            id: TransactionId::generate(),
            user_id: self.user_id.clone(),
            amount: new_transaction.amount,
            kind: new_transaction.kind,
            category: new_transaction.category,
            date: new_transaction.date,
            payment_method: new_transaction.payment_method,
            description: new_transaction.description,
        };

        let mut transactions = self.transactions.lock().map_err(|_| Error::StoreLock)?;
        transactions.push(transaction.clone());

        Ok(transaction)
    }

    fn all(&self) -> Result<Vec<Transaction>, Error> {
        let transactions = self.transactions.lock().map_err(|_| Error::StoreLock)?;

        Ok(transactions.clone())
    }
}

/// Validate `entry` and append the transactions it expands to.
///
/// Returns the stored transactions in the order they were appended, which for
/// a transfer is the expense leg followed by the income leg. Nothing is
/// appended when validation fails.
///
/// # Errors
/// This function will return a:
/// - validation error from [Entry::into_new_transactions],
/// - [Error::StoreLock] if the ledger lock was poisoned.
pub fn record_entry(
    store: &dyn TransactionStore,
    entry: Entry,
    now: OffsetDateTime,
) -> Result<Vec<Transaction>, Error> {
    entry
        .into_new_transactions(now)?
        .into_iter()
        .map(|new_transaction| store.append(new_transaction))
        .collect()
}
