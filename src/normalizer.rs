use crate::error::{LedgerError, Result};
use crate::ingestion::RawTable;
use crate::schema::*;
use crate::utils::parse_date;
use log::{debug, info, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Alias table mapping each canonical column to the header names accepted for it,
/// tried in order. Supporting a new export format is a data change here.
///
/// Deserialized tables extend the default aliases rather than replacing them.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ColumnAliases {
    pub aliases: BTreeMap<CanonicalColumn, Vec<String>>,
}

impl<'de> Deserialize<'de> for ColumnAliases {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ExtraAliases {
            #[serde(default)]
            aliases: BTreeMap<CanonicalColumn, Vec<String>>,
        }

        let extra = ExtraAliases::deserialize(deserializer)?;
        let mut merged = Self::default();
        for (column, names) in extra.aliases {
            for name in names {
                merged = merged.with_alias(column, name);
            }
        }
        Ok(merged)
    }
}

impl Default for ColumnAliases {
    fn default() -> Self {
        let table: [(CanonicalColumn, &[&str]); 11] = [
            (CanonicalColumn::Id, &["id", "Expense ID", "Transaction ID", "ID"]),
            (CanonicalColumn::Date, &["date", "Date"]),
            (CanonicalColumn::Amount, &["amount", "Amount"]),
            (
                CanonicalColumn::TransactionType,
                &["transaction_type", "Transaction Type", "Type"],
            ),
            (CanonicalColumn::Category, &["category", "Category"]),
            (CanonicalColumn::Vendor, &["vendor", "Vendor"]),
            (CanonicalColumn::Department, &["department", "Department"]),
            (
                CanonicalColumn::Employee,
                &["employee", "Employee", "Employee Name"],
            ),
            (
                CanonicalColumn::PaymentMethod,
                &["payment_method", "Payment Method"],
            ),
            (CanonicalColumn::Status, &["status", "Status"]),
            (CanonicalColumn::Notes, &["notes", "Notes"]),
        ];

        let aliases = table
            .iter()
            .map(|(column, names)| (*column, names.iter().map(|n| n.to_string()).collect()))
            .collect();

        Self { aliases }
    }
}

impl ColumnAliases {
    /// Adds an accepted header for `column`, tried after the existing ones. Known headers
    /// are not added twice.
    #[must_use]
    pub fn with_alias(mut self, column: CanonicalColumn, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        let names = self.aliases.entry(column).or_default();
        if !names.contains(&alias) {
            names.push(alias);
        }
        self
    }

    pub fn candidates(&self, column: CanonicalColumn) -> Vec<&str> {
        let mut names = vec![column.name()];
        if let Some(aliases) = self.aliases.get(&column) {
            names.extend(aliases.iter().map(String::as_str).filter(|a| *a != column.name()));
        }
        names
    }

    /// Index of the first header in `table` accepted for `column`.
    pub fn resolve(&self, table: &RawTable, column: CanonicalColumn) -> Option<usize> {
        self.candidates(column)
            .into_iter()
            .find_map(|name| table.column_index(name))
    }
}

/// Parses an amount cell, tolerating currency symbols, thousands separators and
/// accounting-style parentheses for negatives. Non-finite values are rejected.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | '"' | '$' | '₹' | '€' | '£') && !c.is_whitespace())
        .collect();

    let value = if let Some(inner) = cleaned
        .strip_prefix('(')
        .and_then(|v| v.strip_suffix(')'))
    {
        -inner.parse::<f64>().ok()?
    } else {
        cleaned.parse::<f64>().ok()?
    };

    value.is_finite().then_some(value)
}

pub struct Normalizer {
    aliases: ColumnAliases,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(ColumnAliases::default())
    }
}

impl Normalizer {
    pub fn new(aliases: ColumnAliases) -> Self {
        Self { aliases }
    }

    /// Maps a raw table onto the canonical schema.
    ///
    /// Missing `date`/`amount` columns fail with `SchemaError`. A blank or unparseable
    /// date fails the whole load with `FormatError`; ledger totals must be exact, so rows
    /// are never dropped. Unparseable amounts become 0 to keep rows aligned.
    pub fn normalize(&self, table: &RawTable) -> Result<Ledger> {
        let resolved: BTreeMap<CanonicalColumn, usize> = CanonicalColumn::ALL
            .iter()
            .filter_map(|&c| self.aliases.resolve(table, c).map(|idx| (c, idx)))
            .collect();

        for required in [CanonicalColumn::Date, CanonicalColumn::Amount] {
            if !resolved.contains_key(&required) {
                return Err(LedgerError::SchemaError {
                    column: required.name().to_string(),
                    accepted: self.aliases.candidates(required).join(", "),
                });
            }
        }

        let columns: BTreeMap<CanonicalColumn, ColumnOrigin> = CanonicalColumn::ALL
            .iter()
            .map(|&c| {
                let origin = if resolved.contains_key(&c) {
                    ColumnOrigin::Source
                } else if c == CanonicalColumn::TransactionType {
                    ColumnOrigin::Derived
                } else {
                    ColumnOrigin::Defaulted
                };
                (c, origin)
            })
            .collect();

        debug!(
            "Resolved {} of {} canonical columns from headers {:?}",
            resolved.len(),
            CanonicalColumn::ALL.len(),
            table.headers
        );

        let cell = |row: usize, column: CanonicalColumn| -> Option<&str> {
            resolved.get(&column).and_then(|&idx| table.cell(row, idx))
        };
        let text = |row: usize, column: CanonicalColumn, sentinel: &str| -> String {
            cell(row, column).unwrap_or(sentinel).to_string()
        };

        let mut transactions = Vec::with_capacity(table.len());
        let mut coerced_amounts = 0usize;

        for row in 0..table.len() {
            let raw_date = cell(row, CanonicalColumn::Date).unwrap_or_default();
            let date = parse_date(raw_date).ok_or_else(|| LedgerError::FormatError {
                row: row + 1,
                field: CanonicalColumn::Date.name().to_string(),
                value: raw_date.to_string(),
            })?;

            let amount = match cell(row, CanonicalColumn::Amount).map(|raw| (raw, parse_amount(raw))) {
                Some((_, Some(value))) => value,
                Some((raw, None)) => {
                    warn!("Row {}: amount '{}' is not numeric, using 0", row + 1, raw);
                    coerced_amounts += 1;
                    0.0
                }
                None => {
                    coerced_amounts += 1;
                    0.0
                }
            };

            let transaction_type = cell(row, CanonicalColumn::TransactionType)
                .and_then(TransactionType::parse)
                .unwrap_or_else(|| TransactionType::from_amount(amount));

            let id = cell(row, CanonicalColumn::Id)
                .map(str::to_string)
                .unwrap_or_else(|| format!("row-{}", row + 1));

            transactions.push(Transaction {
                id,
                date,
                amount,
                transaction_type,
                category: text(row, CanonicalColumn::Category, UNCATEGORIZED),
                vendor: text(row, CanonicalColumn::Vendor, UNKNOWN_VENDOR),
                department: text(row, CanonicalColumn::Department, UNASSIGNED),
                employee: text(row, CanonicalColumn::Employee, UNASSIGNED),
                payment_method: text(row, CanonicalColumn::PaymentMethod, UNSPECIFIED),
                status: text(row, CanonicalColumn::Status, UNSPECIFIED),
                notes: text(row, CanonicalColumn::Notes, ""),
                calendar: CalendarFields::from_date(date),
            });
        }

        info!(
            "Normalized {} rows ({} amounts coerced to zero)",
            transactions.len(),
            coerced_amounts
        );

        Ok(Ledger::new(transactions, columns))
    }
}

/// Normalizes with the default alias table.
pub fn normalize(table: &RawTable) -> Result<Ledger> {
    Normalizer::default().normalize(table)
}
