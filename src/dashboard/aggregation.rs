//! Ledger aggregation for the dashboard summary cards.
//!
//! Provides functions to total income and expenses, derive net profit and
//! burn rate, and rank expense categories by spend.

use crate::transaction::{Transaction, TransactionType};

/// The headline figures shown on the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialSummary {
    /// The sum of all income amounts.
    pub total_income: f64,
    /// The sum of all expense amounts.
    pub total_expense: f64,
    /// Income minus expenses.
    pub net_profit: f64,
    /// Expenses minus income. Positive while the business spends more than
    /// it earns.
    pub burn_rate: f64,
    /// The category with the highest expense total, if any expenses exist.
    pub top_expense_category: Option<String>,
}

/// Compute every dashboard figure from one snapshot of the ledger.
pub fn summarize(transactions: &[Transaction]) -> FinancialSummary {
    FinancialSummary {
        total_income: total_income(transactions),
        total_expense: total_expense(transactions),
        net_profit: net_profit(transactions),
        burn_rate: burn_rate(transactions),
        top_expense_category: top_expense_category(transactions),
    }
}

/// Sums the amounts of all income transactions.
pub fn total_income(transactions: &[Transaction]) -> f64 {
    total_of_kind(transactions, TransactionType::Income)
}

/// Sums the amounts of all expense transactions.
pub fn total_expense(transactions: &[Transaction]) -> f64 {
    total_of_kind(transactions, TransactionType::Expense)
}

/// Income minus expenses.
pub fn net_profit(transactions: &[Transaction]) -> f64 {
    total_income(transactions) - total_expense(transactions)
}

/// Expenses minus income.
///
/// The sign is kept as-is: a profitable period produces a negative burn
/// rate rather than being clamped to zero.
pub fn burn_rate(transactions: &[Transaction]) -> f64 {
    total_expense(transactions) - total_income(transactions)
}

/// Totals expense amounts per category.
///
/// # Returns
/// Vector of (category, total) pairs ordered by each category's first
/// appearance in `transactions`.
pub fn expense_totals_by_category(transactions: &[Transaction]) -> Vec<(String, f64)> {
    let mut totals: Vec<(String, f64)> = Vec::new();

    for transaction in transactions
        .iter()
        .filter(|transaction| transaction.kind == TransactionType::Expense)
    {
        match totals
            .iter_mut()
            .find(|(category, _)| *category == transaction.category)
        {
            Some((_, total)) => *total += transaction.amount,
            None => totals.push((transaction.category.clone(), transaction.amount)),
        }
    }

    totals
}

/// The category with the highest expense total.
///
/// Ties go to the category that appeared first in the ledger. Returns `None`
/// when there are no expenses.
pub fn top_expense_category(transactions: &[Transaction]) -> Option<String> {
    let mut top: Option<(String, f64)> = None;

    for (category, total) in expense_totals_by_category(transactions) {
        let replace = match &top {
            Some((_, top_total)) => total > *top_total,
            None => true,
        };

        if replace {
            top = Some((category, total));
        }
    }

    top.map(|(category, _)| category)
}

fn total_of_kind(transactions: &[Transaction], kind: TransactionType) -> f64 {
    transactions
        .iter()
        .filter(|transaction| transaction.kind == kind)
        .map(|transaction| transaction.amount)
        .sum()
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::{
        dashboard::{
            burn_rate, expense_totals_by_category, net_profit, summarize, top_expense_category,
            total_expense, total_income,
        },
        transaction::{Transaction, TransactionId, TransactionType, UserId},
    };

    fn create_test_transaction(amount: f64, kind: TransactionType, category: &str) -> Transaction {
        Transaction {
            id: TransactionId::generate(),
            user_id: UserId::new("user_1"),
            amount,
            kind,
            category: category.to_owned(),
            date: datetime!(2024-05-01 09:00:00 UTC),
            payment_method: "Cash".to_owned(),
            description: "test".to_owned(),
        }
    }

    fn income(amount: f64) -> Transaction {
        create_test_transaction(amount, TransactionType::Income, "Sales")
    }

    fn expense(amount: f64, category: &str) -> Transaction {
        create_test_transaction(amount, TransactionType::Expense, category)
    }

    #[test]
    fn totals_split_by_transaction_type() {
        let transactions = vec![income(1000.0), expense(300.0, "Rent"), income(250.0)];

        assert_eq!(total_income(&transactions), 1250.0);
        assert_eq!(total_expense(&transactions), 300.0);
    }

    #[test]
    fn totals_together_cover_every_amount() {
        let transactions = vec![
            income(1000.0),
            expense(300.0, "Rent"),
            income(250.0),
            expense(86.5, "Supplies"),
        ];

        let sum_of_amounts: f64 = transactions
            .iter()
            .map(|transaction| transaction.amount)
            .sum();

        assert_eq!(
            total_income(&transactions) + total_expense(&transactions),
            sum_of_amounts
        );
    }

    #[test]
    fn net_profit_is_income_minus_expenses() {
        let transactions = vec![income(1000.0), expense(300.0, "Rent")];

        assert_eq!(net_profit(&transactions), 700.0);
    }

    #[test]
    fn burn_rate_is_expenses_minus_income() {
        let transactions = vec![income(100.0), expense(300.0, "Rent")];

        assert_eq!(burn_rate(&transactions), 200.0);
    }

    #[test]
    fn burn_rate_goes_negative_when_profitable() {
        // Expenses minus income, not a profit figure: a profitable month
        // reads negative.
        const WANT_BURN_RATE: f64 = -4300.0;

        let transactions = vec![income(12_500.0), expense(8_200.0, "Rent")];

        assert_eq!(burn_rate(&transactions), WANT_BURN_RATE);
    }

    #[test]
    fn expense_totals_keep_first_seen_category_order() {
        let transactions = vec![
            expense(100.0, "Rent"),
            expense(20.0, "Supplies"),
            expense(50.0, "Rent"),
            income(500.0),
        ];

        let totals = expense_totals_by_category(&transactions);

        assert_eq!(
            totals,
            vec![("Rent".to_owned(), 150.0), ("Supplies".to_owned(), 20.0)]
        );
    }

    #[test]
    fn top_expense_category_ranks_whole_categories() {
        let transactions = vec![
            expense(1_200.0, "Rent"),
            expense(2_100.0, "Utilities"),
            expense(2_300.0, "Supplies"),
        ];

        assert_eq!(
            top_expense_category(&transactions),
            Some("Supplies".to_owned())
        );
    }

    #[test]
    fn top_expense_category_picks_largest_total() {
        let transactions = vec![
            expense(100.0, "Rent"),
            expense(80.0, "Marketing"),
            expense(90.0, "Marketing"),
        ];

        assert_eq!(
            top_expense_category(&transactions),
            Some("Marketing".to_owned())
        );
    }

    #[test]
    fn top_expense_category_keeps_first_seen_on_tie() {
        let transactions = vec![expense(100.0, "Rent"), expense(100.0, "Marketing")];

        assert_eq!(top_expense_category(&transactions), Some("Rent".to_owned()));
    }

    #[test]
    fn top_expense_category_is_none_without_expenses() {
        let transactions = vec![income(1000.0)];

        assert_eq!(top_expense_category(&transactions), None);
    }

    #[test]
    fn summarize_handles_an_empty_ledger() {
        let summary = summarize(&[]);

        assert_eq!(summary.total_income, 0.0);
        assert_eq!(summary.total_expense, 0.0);
        assert_eq!(summary.net_profit, 0.0);
        assert_eq!(summary.burn_rate, 0.0);
        assert_eq!(summary.top_expense_category, None);
    }

    #[test]
    fn summarize_collects_every_figure() {
        let transactions = vec![
            income(1000.0),
            expense(300.0, "Rent"),
            expense(150.0, "Supplies"),
        ];

        let summary = summarize(&transactions);

        assert_eq!(summary.total_income, 1000.0);
        assert_eq!(summary.total_expense, 450.0);
        assert_eq!(summary.net_profit, 550.0);
        assert_eq!(summary.burn_rate, -550.0);
        assert_eq!(summary.top_expense_category, Some("Rent".to_owned()));
    }
}
