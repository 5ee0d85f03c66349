//! Dashboard module
//!
//! Aggregates the ledger into the headline figures shown on the overview
//! page and formats them for display.

mod aggregation;
mod currency;

pub use aggregation::{
    FinancialSummary, burn_rate, expense_totals_by_category, net_profit, summarize,
    top_expense_category, total_expense, total_income,
};
pub use currency::format_currency;
