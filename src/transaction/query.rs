//! In-memory filtering and sorting for ledger views.

use serde::Deserialize;
use time::{Date, OffsetDateTime, Time, macros::time};

use crate::transaction::{PeriodPreset, Transaction};

/// The sentinel value meaning "do not filter on this field".
///
/// Filter dropdowns send this for their unselected state, so it is treated
/// the same as leaving the field unset.
pub const FILTER_ALL: &str = "all";

/// The last instant of a calendar day, to millisecond precision.
const END_OF_DAY: Time = time!(23:59:59.999);

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DateRange {
    /// The first date in the range.
    pub from: Date,
    /// The last date in the range. Treated as `from` when absent, narrowing
    /// the range to a single day.
    pub to: Option<Date>,
}

impl DateRange {
    /// The UTC instants bounding this range: midnight at the start of `from`
    /// through the last millisecond of `to`.
    pub fn bounds(&self) -> (OffsetDateTime, OffsetDateTime) {
        let start = self.from.midnight().assume_utc();
        let end = self
            .to
            .unwrap_or(self.from)
            .with_time(END_OF_DAY)
            .assume_utc();

        (start, end)
    }

    /// Whether `instant` falls within this range.
    pub fn contains(&self, instant: OffsetDateTime) -> bool {
        let (start, end) = self.bounds();

        start <= instant && instant <= end
    }
}

/// Criteria for narrowing the ledger before display or aggregation.
///
/// Every field is optional and inactive by default, so the default filter
/// selects the whole ledger. String fields treat [FILTER_ALL] like `None`.
/// When both are set, the explicit `date_range` wins over `period`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    /// Keep transactions in this category.
    pub category: Option<String>,
    /// Keep transactions paid via this method.
    pub payment_method: Option<String>,
    /// Keep transactions dated within this range.
    pub date_range: Option<DateRange>,
    /// Keep transactions dated within this preset, resolved against the
    /// current date.
    pub period: Option<PeriodPreset>,
}

impl TransactionFilter {
    /// Select the transactions matching every active criterion.
    ///
    /// `today` anchors the `period` preset when no explicit date range is
    /// set. Selected transactions keep their input order.
    pub fn apply(&self, transactions: &[Transaction], today: Date) -> Vec<Transaction> {
        let category = active(&self.category);
        let payment_method = active(&self.payment_method);
        let date_range = self
            .date_range
            .or_else(|| self.period.map(|period| period.date_range(today)));

        transactions
            .iter()
            .filter(|transaction| {
                category.is_none_or(|category| transaction.category == category)
                    && payment_method
                        .is_none_or(|payment_method| transaction.payment_method == payment_method)
                    && date_range.is_none_or(|date_range| date_range.contains(transaction.date))
            })
            .cloned()
            .collect()
    }
}

fn active(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| *value != FILTER_ALL)
}

/// The order to present transactions in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Oldest transactions first.
    DateAsc,
    /// Newest transactions first.
    #[default]
    DateDesc,
    /// Smallest amounts first.
    AmountAsc,
    /// Largest amounts first.
    AmountDesc,
}

/// Sort `transactions` in place by `sort_key`.
///
/// The sort is stable, so transactions that compare equal keep the order
/// they arrived in.
pub fn sort_transactions(transactions: &mut [Transaction], sort_key: SortKey) {
    match sort_key {
        SortKey::DateAsc => transactions.sort_by(|a, b| a.date.cmp(&b.date)),
        SortKey::DateDesc => transactions.sort_by(|a, b| b.date.cmp(&a.date)),
        SortKey::AmountAsc => transactions.sort_by(|a, b| a.amount.total_cmp(&b.amount)),
        SortKey::AmountDesc => transactions.sort_by(|a, b| b.amount.total_cmp(&a.amount)),
    }
}

/// Filter a snapshot of the ledger and sort the result.
pub fn query_transactions(
    transactions: &[Transaction],
    filter: &TransactionFilter,
    sort_key: SortKey,
    today: Date,
) -> Vec<Transaction> {
    let mut selected = filter.apply(transactions, today);
    sort_transactions(&mut selected, sort_key);

    selected
}
