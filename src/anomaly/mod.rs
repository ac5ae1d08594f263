//! Anomaly detection over a normalized ledger.
//!
//! Two independent detectors are exposed and their outputs are never merged:
//!
//! - [`RuleBasedDetector`]: fixed, explainable rules, each producing a labeled [`AnomalyType`]
//! - [`StatisticalDetector`]: an isolation forest over per-transaction features, producing a
//!   continuous score (more negative = more anomalous) and a binary flag
//!
//! Both degrade to an empty result instead of failing, so a broken anomaly pass never blocks
//! the metrics or forecast stages.

pub mod features;
pub mod isolation;
pub mod rules;
pub mod statistical;

pub use features::{build_features, standardize, FEATURE_NAMES};
pub use isolation::{IsolationForest, IsolationForestModel};
pub use rules::{detect_rule_based, RuleBasedDetector};
pub use statistical::{detect_statistical, StatisticalDetector};

use crate::schema::Transaction;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum AnomalyType {
    #[serde(rename = "Unusually High Amount")]
    UnusuallyHighAmount,
    #[serde(rename = "Future Date")]
    FutureDate,
    #[serde(rename = "Missing Vendor Information")]
    MissingVendor,
    #[serde(rename = "Flagged in Notes")]
    FlaggedInNotes,
    #[serde(rename = "Statistical Outlier")]
    StatisticalOutlier,
}

impl AnomalyType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::UnusuallyHighAmount => "Unusually High Amount",
            Self::FutureDate => "Future Date",
            Self::MissingVendor => "Missing Vendor Information",
            Self::FlaggedInNotes => "Flagged in Notes",
            Self::StatisticalOutlier => "Statistical Outlier",
        }
    }
}

impl fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A flagged transaction. Statistical detections carry the model score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnomalyRecord {
    pub transaction: Transaction,
    pub anomaly_type: AnomalyType,
    pub anomaly_score: Option<f64>,
    pub is_anomaly: bool,
}

impl AnomalyRecord {
    pub fn from_rule(transaction: &Transaction, anomaly_type: AnomalyType) -> Self {
        Self {
            transaction: transaction.clone(),
            anomaly_type,
            anomaly_score: None,
            is_anomaly: true,
        }
    }

    pub fn from_score(transaction: &Transaction, score: f64) -> Self {
        Self {
            transaction: transaction.clone(),
            anomaly_type: AnomalyType::StatisticalOutlier,
            anomaly_score: Some(score),
            is_anomaly: true,
        }
    }
}

/// Aggregate figures over a set of detected anomalies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnomalyStatistics {
    pub total_anomalies: usize,
    /// Share of the analysed table that was flagged, in percent
    pub anomaly_percentage: f64,
    pub avg_anomaly_score: Option<f64>,
    pub min_anomaly_score: Option<f64>,
    pub max_anomaly_score: Option<f64>,
    pub total_anomaly_amount: f64,
    pub avg_anomaly_amount: f64,
}

impl AnomalyStatistics {
    /// `None` when there is nothing to summarize.
    pub fn from_records(records: &[AnomalyRecord], table_rows: usize) -> Option<Self> {
        if records.is_empty() {
            return None;
        }

        let count = records.len();
        let scores: Vec<f64> = records.iter().filter_map(|r| r.anomaly_score).collect();
        let total_amount: f64 = records.iter().map(|r| r.transaction.amount).sum();

        let (avg_score, min_score, max_score) = if scores.is_empty() {
            (None, None, None)
        } else {
            (
                Some(scores.iter().sum::<f64>() / scores.len() as f64),
                scores.iter().copied().reduce(f64::min),
                scores.iter().copied().reduce(f64::max),
            )
        };

        Some(Self {
            total_anomalies: count,
            anomaly_percentage: if table_rows == 0 {
                0.0
            } else {
                count as f64 / table_rows as f64 * 100.0
            },
            avg_anomaly_score: avg_score,
            min_anomaly_score: min_score,
            max_anomaly_score: max_score,
            total_anomaly_amount: total_amount,
            avg_anomaly_amount: total_amount / count as f64,
        })
    }
}

/// Anomalies keyed by the department responsible for them.
pub fn group_by_department(records: &[AnomalyRecord]) -> BTreeMap<String, Vec<&AnomalyRecord>> {
    group_by(records, |r| &r.transaction.department)
}

/// Anomalies keyed by the employee who submitted them.
pub fn group_by_employee(records: &[AnomalyRecord]) -> BTreeMap<String, Vec<&AnomalyRecord>> {
    group_by(records, |r| &r.transaction.employee)
}

fn group_by<'a, F>(records: &'a [AnomalyRecord], key: F) -> BTreeMap<String, Vec<&'a AnomalyRecord>>
where
    F: Fn(&AnomalyRecord) -> &String,
{
    let mut groups: BTreeMap<String, Vec<&AnomalyRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(key(record).clone()).or_default().push(record);
    }
    groups
}
