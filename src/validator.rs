use crate::error::{LedgerError, Result};
use crate::schema::{CalendarFields, CanonicalColumn, Ledger, TransactionType};
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const REQUIRED_COLUMNS: [CanonicalColumn; 4] = [
    CanonicalColumn::Date,
    CanonicalColumn::Amount,
    CanonicalColumn::Category,
    CanonicalColumn::TransactionType,
];

/// Pass/fail result of validating a ledger. A failed validation is a value, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub message: String,
}

impl ValidationOutcome {
    pub fn pass() -> Self {
        Self {
            valid: true,
            message: "Data validation successful".to_string(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}

/// Checks a ledger and reports the first rule it violates.
///
/// Returns `Err(InternalError)` only when the ledger cannot be introspected at all.
pub fn validate(ledger: &Ledger) -> Result<ValidationOutcome> {
    if !ledger.is_empty() && ledger.columns().is_empty() {
        return Err(LedgerError::InternalError(format!(
            "ledger holds {} rows but no column registry",
            ledger.len()
        )));
    }

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .filter(|&&c| !ledger.has_column(c))
        .map(|c| c.name())
        .collect();
    if !missing.is_empty() {
        return Ok(ValidationOutcome::fail(format!(
            "Missing required columns: {}",
            missing.join(", ")
        )));
    }

    for (idx, transaction) in ledger.transactions().iter().enumerate() {
        if transaction.calendar != CalendarFields::from_date(transaction.date) {
            return Ok(ValidationOutcome::fail(format!(
                "Date column must hold calendar dates: row {} has calendar fields that do not match {}",
                idx + 1,
                transaction.date
            )));
        }
    }

    if let Some((idx, transaction)) = ledger
        .transactions()
        .iter()
        .enumerate()
        .find(|(_, t)| !t.amount.is_finite())
    {
        return Ok(ValidationOutcome::fail(format!(
            "Amount column must be numeric: row {} holds {}",
            idx + 1,
            transaction.amount
        )));
    }

    if ledger
        .transactions()
        .iter()
        .any(|t| matches!(t.transaction_type, TransactionType::Other(_)))
    {
        return Ok(ValidationOutcome::fail(
            "Transaction type must be one of: income, expense",
        ));
    }

    debug!("Validated {} rows", ledger.len());
    Ok(ValidationOutcome::pass())
}
