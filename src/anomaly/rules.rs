use super::{AnomalyRecord, AnomalyType};
use crate::config::AnalysisConfig;
use crate::schema::{CanonicalColumn, ColumnOrigin, Ledger, Transaction, UNKNOWN_VENDOR};
use crate::stats::{mean, std_dev};
use chrono::{Local, NaiveDate};
use log::{debug, warn};
use std::collections::BTreeSet;

const RULE_ORDER: [AnomalyType; 4] = [
    AnomalyType::UnusuallyHighAmount,
    AnomalyType::FutureDate,
    AnomalyType::MissingVendor,
    AnomalyType::FlaggedInNotes,
];

/// Flags transactions that break simple, explainable rules.
///
/// Rules run in a fixed order (high amount, future date, missing vendor, flagged notes) and
/// the output lists every hit of the first rule before any hit of the second. A transaction
/// that trips several rules appears once per rule.
#[derive(Debug, Clone)]
pub struct RuleBasedDetector {
    high_amount_sigma: f64,
    note_terms: Vec<String>,
    reference_date: NaiveDate,
}

impl RuleBasedDetector {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            high_amount_sigma: config.high_amount_sigma,
            note_terms: config
                .flagged_note_terms
                .iter()
                .map(|term| term.to_lowercase())
                .filter(|term| !term.is_empty())
                .collect(),
            reference_date: Local::now().date_naive(),
        }
    }

    /// Dates after `date` count as "in the future".
    #[must_use]
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = date;
        self
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    pub fn detect(&self, ledger: &Ledger) -> Vec<AnomalyRecord> {
        if ledger.is_empty() {
            return Vec::new();
        }

        let mut seen: BTreeSet<(usize, AnomalyType)> = BTreeSet::new();
        let mut records = Vec::new();

        for rule in RULE_ORDER {
            if let Some(column) = required_column(rule) {
                if ledger.column_origin(column) != Some(ColumnOrigin::Source) {
                    warn!(
                        "Skipping '{}' rule: column '{}' is not present in the source table",
                        rule, column
                    );
                    continue;
                }
            }

            let hits = match rule {
                AnomalyType::UnusuallyHighAmount => self.high_amount_rows(ledger),
                AnomalyType::FutureDate => self.future_date_rows(ledger),
                AnomalyType::MissingVendor => missing_vendor_rows(ledger),
                AnomalyType::FlaggedInNotes => self.flagged_note_rows(ledger),
                AnomalyType::StatisticalOutlier => Vec::new(),
            };

            debug!("Rule '{}' matched {} rows", rule, hits.len());

            for idx in hits {
                if seen.insert((idx, rule)) {
                    records.push(AnomalyRecord::from_rule(&ledger.transactions()[idx], rule));
                }
            }
        }

        records
    }

    fn high_amount_rows(&self, ledger: &Ledger) -> Vec<usize> {
        let amounts: Vec<f64> = ledger.transactions().iter().map(|t| t.outflow()).collect();
        let (Some(mu), Some(sigma)) = (mean(&amounts), std_dev(&amounts, 0)) else {
            return Vec::new();
        };
        let threshold = mu + self.high_amount_sigma * sigma;

        matching_rows(ledger, |t| t.outflow() > threshold)
    }

    fn future_date_rows(&self, ledger: &Ledger) -> Vec<usize> {
        matching_rows(ledger, |t| t.date > self.reference_date)
    }

    fn flagged_note_rows(&self, ledger: &Ledger) -> Vec<usize> {
        if self.note_terms.is_empty() {
            return Vec::new();
        }
        matching_rows(ledger, |t| {
            let notes = t.notes.to_lowercase();
            self.note_terms.iter().any(|term| notes.contains(term.as_str()))
        })
    }
}

fn missing_vendor_rows(ledger: &Ledger) -> Vec<usize> {
    matching_rows(ledger, |t| t.vendor == UNKNOWN_VENDOR)
}

fn matching_rows<F>(ledger: &Ledger, predicate: F) -> Vec<usize>
where
    F: Fn(&Transaction) -> bool,
{
    ledger
        .transactions()
        .iter()
        .enumerate()
        .filter(|(_, t)| predicate(t))
        .map(|(idx, _)| idx)
        .collect()
}

/// The optional source column a rule inspects. Date and amount are always present.
fn required_column(rule: AnomalyType) -> Option<CanonicalColumn> {
    match rule {
        AnomalyType::MissingVendor => Some(CanonicalColumn::Vendor),
        AnomalyType::FlaggedInNotes => Some(CanonicalColumn::Notes),
        _ => None,
    }
}

/// Runs every rule with default thresholds against today's date.
pub fn detect_rule_based(ledger: &Ledger) -> Vec<AnomalyRecord> {
    RuleBasedDetector::new(&AnalysisConfig::default()).detect(ledger)
}
