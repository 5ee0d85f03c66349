//! Transaction management for the finance dashboard.
//!
//! This module contains everything related to the ledger:
//! - The [Transaction] model and the [Entry] forms that expand into transactions
//! - The [TransactionStore] trait and its in-memory implementation
//! - Filtering, sorting, and date-range presets for ledger views

mod core;
mod entry;
mod period;
mod query;
mod store;

pub use core::{NewTransaction, Transaction, TransactionId, TransactionType, UserId};
pub use entry::{Entry, TRANSFER_CATEGORY};
pub use period::PeriodPreset;
pub use query::{
    DateRange, FILTER_ALL, SortKey, TransactionFilter, query_transactions, sort_transactions,
};
pub use store::{InMemoryTransactionStore, TransactionStore, record_entry};

pub(crate) use period::month_bounds;
