use crate::utils::{month_start, quarter_of};
use chrono::{Datelike, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const UNKNOWN_VENDOR: &str = "Unknown Vendor";
pub const UNASSIGNED: &str = "Unassigned";
pub const UNCATEGORIZED: &str = "Uncategorized";
pub const UNSPECIFIED: &str = "Unspecified";

/// The fixed field set every input table is normalized into.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalColumn {
    Id,
    Date,
    Amount,
    TransactionType,
    Category,
    Vendor,
    Department,
    Employee,
    PaymentMethod,
    Status,
    Notes,
}

impl CanonicalColumn {
    pub const ALL: [CanonicalColumn; 11] = [
        CanonicalColumn::Id,
        CanonicalColumn::Date,
        CanonicalColumn::Amount,
        CanonicalColumn::TransactionType,
        CanonicalColumn::Category,
        CanonicalColumn::Vendor,
        CanonicalColumn::Department,
        CanonicalColumn::Employee,
        CanonicalColumn::PaymentMethod,
        CanonicalColumn::Status,
        CanonicalColumn::Notes,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Date => "date",
            Self::Amount => "amount",
            Self::TransactionType => "transaction_type",
            Self::Category => "category",
            Self::Vendor => "vendor",
            Self::Department => "department",
            Self::Employee => "employee",
            Self::PaymentMethod => "payment_method",
            Self::Status => "status",
            Self::Notes => "notes",
        }
    }
}

impl fmt::Display for CanonicalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where the values of a canonical column came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ColumnOrigin {
    /// Read from a column of the input table
    Source,
    /// Computed from other columns (transaction type from the amount sign)
    Derived,
    /// Absent from the input; every row holds the sentinel value
    Defaulted,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Income,
    Expense,
    /// An explicit value outside {income, expense}; kept so validation can reject it.
    Other(String),
}

impl TransactionType {
    /// Ledger amounts record spend, so a negative amount is money coming back in.
    pub fn from_amount(amount: f64) -> Self {
        if amount < 0.0 {
            Self::Income
        } else {
            Self::Expense
        }
    }

    /// Parses an explicit type cell. Returns `None` for a blank cell.
    pub fn parse(raw: &str) -> Option<Self> {
        let value = raw.trim().to_lowercase();
        match value.as_str() {
            "" => None,
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => Some(Self::Other(value)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Other(value) => value,
        }
    }

    pub fn is_expense(&self) -> bool {
        matches!(self, Self::Expense)
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Calendar fields derived from a transaction date, computed once at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CalendarFields {
    pub month: u32,
    pub year: i32,
    /// e.g. "Mar 2024"
    pub month_year: String,
    /// First day of the transaction's month, used for time-series bucketing
    pub month_bucket: NaiveDate,
    pub quarter: u32,
    /// e.g. "2024-Q1"
    pub quarter_year: String,
}

impl CalendarFields {
    pub fn from_date(date: NaiveDate) -> Self {
        let quarter = quarter_of(date.month());
        Self {
            month: date.month(),
            year: date.year(),
            month_year: date.format("%b %Y").to_string(),
            month_bucket: month_start(date),
            quarter,
            quarter_year: format!("{}-Q{}", date.year(), quarter),
        }
    }
}

/// One canonical ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    pub amount: f64,
    pub transaction_type: TransactionType,
    pub category: String,
    pub vendor: String,
    pub department: String,
    pub employee: String,
    pub payment_method: String,
    pub status: String,
    pub notes: String,
    pub calendar: CalendarFields,
}

impl Transaction {
    /// Builds a row with sentinel values for every optional field.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        date: NaiveDate,
        amount: f64,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            date,
            amount,
            transaction_type: TransactionType::from_amount(amount),
            category: category.into(),
            vendor: UNKNOWN_VENDOR.to_string(),
            department: UNASSIGNED.to_string(),
            employee: UNASSIGNED.to_string(),
            payment_method: UNSPECIFIED.to_string(),
            status: UNSPECIFIED.to_string(),
            notes: String::new(),
            calendar: CalendarFields::from_date(date),
        }
    }

    #[must_use]
    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = vendor.into();
        self
    }

    #[must_use]
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = department.into();
        self
    }

    #[must_use]
    pub fn with_employee(mut self, employee: impl Into<String>) -> Self {
        self.employee = employee.into();
        self
    }

    #[must_use]
    pub fn with_payment_method(mut self, payment_method: impl Into<String>) -> Self {
        self.payment_method = payment_method.into();
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    #[must_use]
    pub fn with_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = transaction_type;
        self
    }

    /// Signed spend: positive for money out, negative for money in. An explicit type wins
    /// over the sign of the amount; a derived type gives back the amount unchanged.
    pub fn outflow(&self) -> f64 {
        match self.transaction_type {
            TransactionType::Expense => self.amount.abs(),
            TransactionType::Income => -self.amount.abs(),
            TransactionType::Other(_) => self.amount,
        }
    }
}

/// The normalized transaction table: ordered rows plus a registry of which canonical
/// columns the rows were actually built from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Ledger {
    transactions: Vec<Transaction>,
    columns: BTreeMap<CanonicalColumn, ColumnOrigin>,
}

impl Ledger {
    pub fn new(
        transactions: Vec<Transaction>,
        columns: BTreeMap<CanonicalColumn, ColumnOrigin>,
    ) -> Self {
        Self {
            transactions,
            columns,
        }
    }

    /// Wraps rows built in memory; every canonical column counts as present.
    pub fn from_transactions(transactions: Vec<Transaction>) -> Self {
        let columns = CanonicalColumn::ALL
            .iter()
            .map(|&c| (c, ColumnOrigin::Source))
            .collect();
        Self::new(transactions, columns)
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn columns(&self) -> &BTreeMap<CanonicalColumn, ColumnOrigin> {
        &self.columns
    }

    pub fn column_origin(&self, column: CanonicalColumn) -> Option<ColumnOrigin> {
        self.columns.get(&column).copied()
    }

    /// True when the column was read from the input or derived from it.
    pub fn has_column(&self, column: CanonicalColumn) -> bool {
        matches!(
            self.column_origin(column),
            Some(ColumnOrigin::Source) | Some(ColumnOrigin::Derived)
        )
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// Bucket width for time-series aggregation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Day,
    Week,
    Month,
}

impl Default for Granularity {
    fn default() -> Self {
        Self::Month
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        };
        f.write_str(label)
    }
}
