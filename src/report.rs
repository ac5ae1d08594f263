use crate::anomaly::{AnomalyRecord, AnomalyStatistics};
use crate::error::{LedgerError, Result};
use crate::forecast::{ForecastAccuracy, ForecastOutlook, ForecastPoint, Runway};
use crate::metrics::{top_n, Dimension, SummaryMetrics};
use crate::schema::Granularity;
use crate::validator::ValidationOutcome;
use chrono::NaiveDate;
use log::info;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ANOMALIES_ARTIFACT: &str = "anomalies.csv";
pub const FORECAST_ARTIFACT: &str = "forecast.csv";
pub const REPORT_ARTIFACT: &str = "analysis_report.json";

const ANOMALY_HEADERS: [&str; 13] = [
    "id",
    "date",
    "amount",
    "transaction_type",
    "category",
    "vendor",
    "department",
    "employee",
    "payment_method",
    "status",
    "notes",
    "anomaly_type",
    "anomaly_score",
];

/// Everything one analysis run produced over a validated ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisReport {
    /// Date that "future" transactions were judged against
    pub reference_date: NaiveDate,
    pub granularity: Granularity,
    pub validation: ValidationOutcome,
    pub metrics: SummaryMetrics,
    pub rule_anomalies: Vec<AnomalyRecord>,
    pub statistical_anomalies: Vec<AnomalyRecord>,
    pub anomaly_statistics: Option<AnomalyStatistics>,
    pub forecast: Vec<ForecastPoint>,
    /// Why no forecast was produced, when fitting failed
    pub forecast_error: Option<String>,
    pub forecast_accuracy: Option<ForecastAccuracy>,
    pub forecast_outlook: Option<ForecastOutlook>,
    pub burn_rate: f64,
    pub starting_cash: f64,
    pub runway: Runway,
}

impl AnalysisReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AnalysisReport)
    }

    pub fn schema_as_json() -> Result<String> {
        let schema = Self::generate_json_schema();
        Ok(serde_json::to_string_pretty(&schema)?)
    }

    /// Rule hits followed by statistical outliers.
    pub fn all_anomalies(&self) -> impl Iterator<Item = &AnomalyRecord> {
        self.rule_anomalies
            .iter()
            .chain(self.statistical_anomalies.iter())
    }

    pub fn anomalies_to_csv(&self) -> Result<String> {
        let records: Vec<&AnomalyRecord> = self.all_anomalies().collect();
        anomalies_to_csv(&records)
    }

    pub fn forecast_to_csv(&self) -> Result<String> {
        forecast_to_csv(&self.forecast)
    }

    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str("# Ledger Analysis Report\n\n");
        output.push_str(&format!(
            "**Reference date:** {} | **Granularity:** {}\n\n",
            self.reference_date, self.granularity
        ));

        output.push_str("## Summary\n\n");
        output.push_str(&format!(
            "- Transactions: {}\n",
            self.metrics.transaction_count
        ));
        output.push_str(&format!("- Total amount: {:.2}\n", self.metrics.total_amount));
        output.push_str(&format!(
            "- Income: {:.2}\n- Expenses: {:.2}\n- Net: {:.2}\n\n",
            self.metrics.cash_flow.income,
            self.metrics.cash_flow.expenses,
            self.metrics.cash_flow.net
        ));

        if let Some(categories) = self.metrics.by_dimension.get(&Dimension::Category) {
            if !categories.is_empty() {
                output.push_str("### Top Categories\n\n");
                output.push_str("| Category | Total | Count |\n|---|---:|---:|\n");
                for (name, stats) in top_n(categories, 5) {
                    output.push_str(&format!(
                        "| {} | {:.2} | {} |\n",
                        name, stats.total, stats.count
                    ));
                }
                output.push('\n');
            }
        }

        output.push_str("## Anomalies\n\n");
        output.push_str(&format!(
            "- Rule-based: {}\n- Statistical: {}\n\n",
            self.rule_anomalies.len(),
            self.statistical_anomalies.len()
        ));
        let anomalies: Vec<&AnomalyRecord> = self.all_anomalies().collect();
        if !anomalies.is_empty() {
            output.push_str("| Date | Amount | Vendor | Type | Score |\n|---|---:|---|---|---:|\n");
            for record in anomalies {
                let score = record
                    .anomaly_score
                    .map(|s| format!("{:.4}", s))
                    .unwrap_or_else(|| "-".to_string());
                output.push_str(&format!(
                    "| {} | {:.2} | {} | {} | {} |\n",
                    record.transaction.date,
                    record.transaction.amount,
                    record.transaction.vendor,
                    record.anomaly_type,
                    score
                ));
            }
            output.push('\n');
        }

        output.push_str("## Forecast\n\n");
        match &self.forecast_error {
            Some(reason) => output.push_str(&format!("Forecast unavailable: {}\n\n", reason)),
            None => {
                let predictions: Vec<&ForecastPoint> =
                    self.forecast.iter().filter(|p| p.is_prediction).collect();
                if predictions.is_empty() {
                    output.push_str("No forecast data.\n\n");
                } else {
                    output.push_str("| Date | Predicted | Lower | Upper |\n|---|---:|---:|---:|\n");
                    for point in predictions {
                        output.push_str(&format!(
                            "| {} | {:.2} | {:.2} | {:.2} |\n",
                            point.date, point.predicted_amount, point.lower_bound, point.upper_bound
                        ));
                    }
                    output.push('\n');
                }
            }
        }

        output.push_str("## Cash\n\n");
        output.push_str(&format!("- Burn rate: {:.2} per month\n", self.burn_rate));
        output.push_str(&format!("- Starting cash: {:.2}\n", self.starting_cash));
        output.push_str(&format!("- Runway: {}\n", self.runway));

        output
    }

    /// Writes the named artifacts into `dir`, creating it if needed.
    pub fn write_artifacts(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let artifacts = [
            (ANOMALIES_ARTIFACT, self.anomalies_to_csv()?),
            (FORECAST_ARTIFACT, self.forecast_to_csv()?),
            (REPORT_ARTIFACT, self.to_json()?),
        ];

        let mut written = Vec::with_capacity(artifacts.len());
        for (name, content) in artifacts {
            let path = dir.join(name);
            std::fs::write(&path, content)?;
            written.push(path);
        }

        info!("Wrote {} report artifacts to {}", written.len(), dir.display());
        Ok(written)
    }
}

pub fn anomalies_to_csv(records: &[&AnomalyRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(ANOMALY_HEADERS)?;

    for record in records {
        let t = &record.transaction;
        let date = t.date.format("%Y-%m-%d").to_string();
        let amount = t.amount.to_string();
        let score = record
            .anomaly_score
            .map(|s| s.to_string())
            .unwrap_or_default();
        writer.write_record([
            t.id.as_str(),
            date.as_str(),
            amount.as_str(),
            t.transaction_type.as_str(),
            t.category.as_str(),
            t.vendor.as_str(),
            t.department.as_str(),
            t.employee.as_str(),
            t.payment_method.as_str(),
            t.status.as_str(),
            t.notes.as_str(),
            record.anomaly_type.label(),
            score.as_str(),
        ])?;
    }

    finish(writer)
}

pub fn forecast_to_csv(points: &[ForecastPoint]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "date",
        "predicted_amount",
        "lower_bound",
        "upper_bound",
        "is_prediction",
    ])?;

    for point in points {
        writer.write_record([
            point.date.format("%Y-%m-%d").to_string(),
            point.predicted_amount.to_string(),
            point.lower_bound.to_string(),
            point.upper_bound.to_string(),
            point.is_prediction.to_string(),
        ])?;
    }

    finish(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| LedgerError::InternalError(format!("failed to flush CSV output: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| LedgerError::InternalError(format!("CSV output is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::AnomalyType;
    use crate::forecast::runway;
    use crate::metrics::summarize_all;
    use crate::schema::{Ledger, Transaction};

    fn report() -> AnalysisReport {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let flagged = Transaction::new("EXP-9", date, 4200.0, "Travel")
            .with_vendor("Acme, Inc.")
            .with_notes("looks like an error");
        let ledger = Ledger::from_transactions(vec![flagged.clone()]);

        AnalysisReport {
            reference_date: date,
            granularity: Granularity::Month,
            validation: ValidationOutcome::pass(),
            metrics: summarize_all(&ledger),
            rule_anomalies: vec![AnomalyRecord::from_rule(&flagged, AnomalyType::FlaggedInNotes)],
            statistical_anomalies: vec![AnomalyRecord::from_score(&flagged, -0.71)],
            anomaly_statistics: None,
            forecast: vec![ForecastPoint {
                date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
                predicted_amount: 4000.0,
                lower_bound: 3500.0,
                upper_bound: 4500.0,
                is_prediction: true,
            }],
            forecast_error: None,
            forecast_accuracy: None,
            forecast_outlook: None,
            burn_rate: 4200.0,
            starting_cash: 42_000.0,
            runway: runway(42_000.0, 4200.0),
        }
    }

    #[test]
    fn test_anomaly_csv_quotes_fields() {
        let csv = report().anomalies_to_csv().unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), ANOMALY_HEADERS.join(","));
        let first = lines.next().unwrap();
        assert!(first.contains("\"Acme, Inc.\""));
        assert!(first.ends_with("Flagged in Notes,"));
        assert!(lines.next().unwrap().ends_with("Statistical Outlier,-0.71"));
    }

    #[test]
    fn test_forecast_csv() {
        let csv = report().forecast_to_csv().unwrap();
        assert!(csv.starts_with("date,predicted_amount,lower_bound,upper_bound,is_prediction\n"));
        assert!(csv.contains("2024-04-01,4000,3500,4500,true"));
    }

    #[test]
    fn test_json_round_trip() {
        let original = report();
        let parsed = AnalysisReport::from_json(&original.to_json().unwrap()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_schema_generation() {
        let schema_json = AnalysisReport::schema_as_json().unwrap();
        assert!(schema_json.contains("statistical_anomalies"));
        assert!(schema_json.contains("predicted_amount"));
    }

    #[test]
    fn test_markdown_sections() {
        let markdown = report().to_markdown();
        assert!(markdown.contains("# Ledger Analysis Report"));
        assert!(markdown.contains("| Travel | 4200.00 | 1 |"));
        assert!(markdown.contains("Flagged in Notes"));
        assert!(markdown.contains("- Runway: 10.0 months"));
    }

    #[test]
    fn test_markdown_reports_forecast_error() {
        let mut report = report();
        report.forecast.clear();
        report.forecast_error = Some("at least 2 distinct month buckets are needed".to_string());
        assert!(report
            .to_markdown()
            .contains("Forecast unavailable: at least 2 distinct month buckets"));
    }
}
