use crate::schema::{CanonicalColumn, Ledger, Transaction, TransactionType};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A column transactions can be rolled up by.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Category,
    Department,
    Vendor,
    PaymentMethod,
    Employee,
    Status,
}

impl Dimension {
    pub const ALL: [Dimension; 6] = [
        Dimension::Category,
        Dimension::Department,
        Dimension::Vendor,
        Dimension::PaymentMethod,
        Dimension::Employee,
        Dimension::Status,
    ];

    pub fn column(&self) -> CanonicalColumn {
        match self {
            Self::Category => CanonicalColumn::Category,
            Self::Department => CanonicalColumn::Department,
            Self::Vendor => CanonicalColumn::Vendor,
            Self::PaymentMethod => CanonicalColumn::PaymentMethod,
            Self::Employee => CanonicalColumn::Employee,
            Self::Status => CanonicalColumn::Status,
        }
    }

    pub fn value<'a>(&self, transaction: &'a Transaction) -> &'a str {
        match self {
            Self::Category => &transaction.category,
            Self::Department => &transaction.department,
            Self::Vendor => &transaction.vendor,
            Self::PaymentMethod => &transaction.payment_method,
            Self::Employee => &transaction.employee,
            Self::Status => &transaction.status,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column().name())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DimensionStats {
    pub total: f64,
    pub mean: f64,
    pub count: usize,
}

impl DimensionStats {
    fn add(&mut self, amount: f64) {
        self.total += amount;
        self.count += 1;
        self.mean = self.total / self.count as f64;
    }
}

/// Total, mean and count of amounts per distinct value of `dimension`.
///
/// A dimension whose column was not in the source table yields an empty map.
pub fn summarize(ledger: &Ledger, dimension: Dimension) -> BTreeMap<String, DimensionStats> {
    let mut summary: BTreeMap<String, DimensionStats> = BTreeMap::new();
    if !ledger.has_column(dimension.column()) {
        return summary;
    }

    for transaction in ledger.transactions() {
        summary
            .entry(dimension.value(transaction).to_string())
            .or_default()
            .add(transaction.amount);
    }
    summary
}

/// Income and expense magnitudes. `net = income - expenses`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CashFlowTotals {
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
}

impl CashFlowTotals {
    pub fn from_ledger(ledger: &Ledger) -> Self {
        let mut totals = Self::default();
        for transaction in ledger.transactions() {
            match transaction.transaction_type {
                TransactionType::Income => totals.income += transaction.amount.abs(),
                TransactionType::Expense => totals.expenses += transaction.amount.abs(),
                TransactionType::Other(_) => {}
            }
        }
        totals.net = totals.income - totals.expenses;
        totals
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SummaryMetrics {
    pub transaction_count: usize,
    pub total_amount: f64,
    pub average_amount: f64,
    pub cash_flow: CashFlowTotals,
    pub by_dimension: BTreeMap<Dimension, BTreeMap<String, DimensionStats>>,
}

/// Every rollup in one pass over the ledger.
pub fn summarize_all(ledger: &Ledger) -> SummaryMetrics {
    let total_amount: f64 = ledger.transactions().iter().map(|t| t.amount).sum();
    let by_dimension = Dimension::ALL
        .iter()
        .map(|&d| (d, summarize(ledger, d)))
        .collect();

    SummaryMetrics {
        transaction_count: ledger.len(),
        total_amount,
        average_amount: if ledger.is_empty() {
            0.0
        } else {
            total_amount / ledger.len() as f64
        },
        cash_flow: CashFlowTotals::from_ledger(ledger),
        by_dimension,
    }
}

/// The `n` largest entries of a summary by total, ties broken by name.
pub fn top_n(
    summary: &BTreeMap<String, DimensionStats>,
    n: usize,
) -> Vec<(String, DimensionStats)> {
    let mut entries: Vec<(String, DimensionStats)> = summary
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    entries.sort_by(|a, b| b.1.total.total_cmp(&a.1.total).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(n);
    entries
}

/// Totals per month bucket and dimension value.
pub fn monthly_breakdown(
    ledger: &Ledger,
    dimension: Dimension,
) -> BTreeMap<NaiveDate, BTreeMap<String, f64>> {
    let mut breakdown: BTreeMap<NaiveDate, BTreeMap<String, f64>> = BTreeMap::new();
    if !ledger.has_column(dimension.column()) {
        return breakdown;
    }

    for transaction in ledger.transactions() {
        *breakdown
            .entry(transaction.calendar.month_bucket)
            .or_default()
            .entry(dimension.value(transaction).to_string())
            .or_insert(0.0) += transaction.amount;
    }
    breakdown
}
