//! Validated entry forms for recording money movements.
//!
//! An [Entry] is what the add-entry flow collects: an income, an expense, or
//! a transfer between two of the business's own accounts. Each variant
//! carries exactly the fields its type requires and is validated as a whole
//! before anything reaches the store. A transfer expands into two linked
//! transactions so both sides of the movement show up in the ledger.

use time::OffsetDateTime;
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    Error,
    transaction::{NewTransaction, TransactionType},
};

/// The category stamped on both legs of an expanded transfer.
pub const TRANSFER_CATEGORY: &str = "Transfer";

/// The minimum entry description length, in graphemes.
const DESCRIPTION_MIN_GRAPHEMES: usize = 2;

/// The maximum entry description length, in graphemes.
const DESCRIPTION_MAX_GRAPHEMES: usize = 100;

/// A validated request to record money movement in the ledger.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// Money earned by the business, e.g. a client payment.
    Income {
        /// The amount earned, greater than zero.
        amount: f64,
        /// When the money arrived. Must not be in the future.
        date: OffsetDateTime,
        /// What the income was for.
        description: String,
        /// The income category, e.g. "Sales".
        category: String,
        /// The account the money arrived in.
        account: String,
    },
    /// Money spent by the business, e.g. a supplier invoice.
    Expense {
        /// The amount spent, greater than zero.
        amount: f64,
        /// When the money left. Must not be in the future.
        date: OffsetDateTime,
        /// What the expense was for.
        description: String,
        /// The expense category, e.g. "Rent".
        category: String,
        /// The account the money was paid from.
        account: String,
    },
    /// Money moved between two of the business's own accounts.
    Transfer {
        /// The amount moved, greater than zero.
        amount: f64,
        /// When the transfer happened. Must not be in the future.
        date: OffsetDateTime,
        /// What the transfer was for.
        description: String,
        /// The account the money left.
        from_account: String,
        /// The account the money arrived in.
        to_account: String,
    },
}

impl Entry {
    /// Validate the entry and expand it into the transactions to store.
    ///
    /// Income and expense entries become a single transaction whose payment
    /// method is the entry's account. A transfer becomes two transactions
    /// sharing the entry's amount and date: the expense leg out of the
    /// source account first, then the income leg into the destination, with
    /// descriptions cross-referencing the counter-account and the category
    /// set to [TRANSFER_CATEGORY].
    ///
    /// `now` anchors the future-date check.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NonPositiveAmount] if the amount is zero or negative,
    /// - [Error::DescriptionLength] if the description is shorter than 2 or
    ///   longer than 100 graphemes,
    /// - [Error::FutureDate] if the date is after `now`,
    /// - [Error::MissingCategory] or [Error::MissingAccount] for incomplete
    ///   income and expense entries,
    /// - [Error::MissingTransferAccount] or [Error::SameTransferAccount] for
    ///   incomplete or self-referential transfers.
    pub fn into_new_transactions(self, now: OffsetDateTime) -> Result<Vec<NewTransaction>, Error> {
        self.validate(now)?;

        let transactions = match self {
            Entry::Income {
                amount,
                date,
                description,
                category,
                account,
            } => vec![NewTransaction {
                amount,
                kind: TransactionType::Income,
                category,
                date,
                payment_method: account,
                description,
            }],
            Entry::Expense {
                amount,
                date,
                description,
                category,
                account,
            } => vec![NewTransaction {
                amount,
                kind: TransactionType::Expense,
                category,
                date,
                payment_method: account,
                description,
            }],
            Entry::Transfer {
                amount,
                date,
                description,
                from_account,
                to_account,
            } => vec![
                NewTransaction {
                    amount,
                    kind: TransactionType::Expense,
                    category: TRANSFER_CATEGORY.to_owned(),
                    date,
                    payment_method: from_account.clone(),
                    description: format!("Transfer to {to_account}: {description}"),
                },
                NewTransaction {
                    amount,
                    kind: TransactionType::Income,
                    category: TRANSFER_CATEGORY.to_owned(),
                    date,
                    payment_method: to_account,
                    description: format!("Transfer from {from_account}: {description}"),
                },
            ],
        };

        Ok(transactions)
    }

    fn validate(&self, now: OffsetDateTime) -> Result<(), Error> {
        let amount = self.amount();
        if amount <= 0.0 {
            return Err(Error::NonPositiveAmount(amount));
        }

        let description_length = self.description().graphemes(true).count();
        if !(DESCRIPTION_MIN_GRAPHEMES..=DESCRIPTION_MAX_GRAPHEMES).contains(&description_length) {
            return Err(Error::DescriptionLength(description_length));
        }

        let date = self.date();
        if date > now {
            return Err(Error::FutureDate(date.date()));
        }

        match self {
            Entry::Income {
                category, account, ..
            }
            | Entry::Expense {
                category, account, ..
            } => {
                if category.trim().is_empty() {
                    return Err(Error::MissingCategory);
                }
                if account.trim().is_empty() {
                    return Err(Error::MissingAccount);
                }
            }
            Entry::Transfer {
                from_account,
                to_account,
                ..
            } => {
                if from_account.trim().is_empty() || to_account.trim().is_empty() {
                    return Err(Error::MissingTransferAccount);
                }
                if from_account == to_account {
                    return Err(Error::SameTransferAccount(from_account.clone()));
                }
            }
        }

        Ok(())
    }

    fn amount(&self) -> f64 {
        match self {
            Entry::Income { amount, .. }
            | Entry::Expense { amount, .. }
            | Entry::Transfer { amount, .. } => *amount,
        }
    }

    fn date(&self) -> OffsetDateTime {
        match self {
            Entry::Income { date, .. }
            | Entry::Expense { date, .. }
            | Entry::Transfer { date, .. } => *date,
        }
    }

    fn description(&self) -> &str {
        match self {
            Entry::Income { description, .. }
            | Entry::Expense { description, .. }
            | Entry::Transfer { description, .. } => description,
        }
    }
}
