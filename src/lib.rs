//! # Ledger Insights
//!
//! A library for turning a raw, heterogeneously-shaped transaction table into a cleaned
//! canonical ledger, explainable anomaly flags, and a cash forecast with burn rate and runway.
//!
//! ## Core Concepts
//!
//! - **Normalization**: Arbitrary column names map onto one canonical transaction schema via an
//!   alias table; calendar fields are derived once per row
//! - **Validation Gate**: A ledger that fails validation is reported, never analysed
//! - **Anomalies**: Fixed rules (high amount, future date, missing vendor, flagged notes) and an
//!   isolation forest over per-transaction features
//! - **Forecast**: Linear trend plus Fourier seasonality over bucketed totals, with a seeded
//!   uncertainty interval
//! - **Burn Rate & Runway**: Average recent monthly net spend, and how long cash lasts at it
//!
//! Ledger amounts record spend: a positive amount is money going out.
//!
//! ## Example
//!
//! ```rust,ignore
//! use ledger_insights::*;
//!
//! let config = AnalysisConfig {
//!     starting_cash: 250_000.0,
//!     ..AnalysisConfig::default()
//! };
//! let analyzer = LedgerAnalyzer::new(config)?;
//! let ledger = analyzer.load_csv("expenses.csv")?;
//!
//! match analyzer.analyze(&ledger)? {
//!     AnalysisOutcome::Completed(report) => {
//!         println!("{}", report.to_markdown());
//!         report.write_artifacts("out")?;
//!     }
//!     AnalysisOutcome::Rejected(outcome) => eprintln!("{}", outcome.message),
//! }
//! ```

pub mod anomaly;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod forecast;
pub mod ingestion;
pub mod metrics;
pub mod normalizer;
pub mod report;
pub mod schema;
pub mod seasonality;
pub mod stats;
pub mod utils;
pub mod validator;

pub use anomaly::{
    detect_rule_based, detect_statistical, group_by_department, group_by_employee,
    AnomalyRecord, AnomalyStatistics, AnomalyType, RuleBasedDetector, StatisticalDetector,
};
pub use collaborators::{
    build_prompt, explain, prompt_context, AnomalyAlert, FraudDigest, MessageSender,
    TextGenerator,
};
pub use config::AnalysisConfig;
pub use error::{LedgerError, Result};
pub use forecast::{
    aggregate, burn_rate, evaluate_forecast, runway, ForecastAccuracy, ForecastOutlook,
    ForecastPoint, Forecaster, Runway, TimeSeries,
};
pub use ingestion::RawTable;
pub use metrics::{
    monthly_breakdown, summarize, summarize_all, top_n, CashFlowTotals, Dimension,
    DimensionStats, SummaryMetrics,
};
pub use normalizer::{normalize, parse_amount, ColumnAliases, Normalizer};
pub use report::AnalysisReport;
pub use schema::*;
pub use seasonality::SeasonalityMode;
pub use validator::{validate, ValidationOutcome};

use chrono::{Local, NaiveDate};
use log::{debug, info, warn};
use std::path::Path;

/// Result of running the pipeline over one ledger.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// The ledger failed validation; no engine ran
    Rejected(ValidationOutcome),
    /// Every engine ran; anomaly and forecast failures are carried inside the report
    Completed(Box<AnalysisReport>),
}

impl AnalysisOutcome {
    pub fn report(&self) -> Option<&AnalysisReport> {
        match self {
            Self::Completed(report) => Some(report.as_ref()),
            Self::Rejected(_) => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Runs normalize, the validation gate, then every engine over the same ledger.
#[derive(Debug, Clone)]
pub struct LedgerAnalyzer {
    config: AnalysisConfig,
    reference_date: Option<NaiveDate>,
}

impl LedgerAnalyzer {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            reference_date: None,
        })
    }

    /// Judges "future" transactions against `date` instead of today.
    #[must_use]
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn normalize(&self, table: &RawTable) -> Result<Ledger> {
        Normalizer::new(self.config.column_aliases.clone()).normalize(table)
    }

    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<Ledger> {
        let table = RawTable::from_csv_path(path)?;
        self.normalize(&table)
    }

    pub fn analyze_table(&self, table: &RawTable) -> Result<AnalysisOutcome> {
        let ledger = self.normalize(table)?;
        self.analyze(&ledger)
    }

    /// Validation errors and internal failures surface as `Err`. A failed validation is
    /// `Ok(Rejected)`. Anomaly failures degrade to empty lists and a forecast failure is
    /// carried in the report.
    pub fn analyze(&self, ledger: &Ledger) -> Result<AnalysisOutcome> {
        let validation = validate(ledger)?;
        if !validation.valid {
            info!("Ledger rejected: {}", validation.message);
            return Ok(AnalysisOutcome::Rejected(validation));
        }

        let reference_date = self
            .reference_date
            .unwrap_or_else(|| Local::now().date_naive());

        info!(
            "Analyzing {} transactions at {} granularity",
            ledger.len(),
            self.config.granularity
        );

        let rule_anomalies = RuleBasedDetector::new(&self.config)
            .with_reference_date(reference_date)
            .detect(ledger);
        let statistical_anomalies = StatisticalDetector::new(&self.config).detect(ledger);
        let anomaly_statistics =
            AnomalyStatistics::from_records(&statistical_anomalies, ledger.len());
        debug!(
            "Detected {} rule-based and {} statistical anomalies",
            rule_anomalies.len(),
            statistical_anomalies.len()
        );

        let metrics = summarize_all(ledger);

        let series = aggregate(ledger, self.config.granularity);
        let (forecast, forecast_error) =
            match Forecaster::new(&self.config).forecast(&series, self.config.horizon()) {
                Ok(points) => (points, None),
                Err(e) => {
                    warn!("Forecast unavailable: {}", e);
                    (Vec::new(), Some(e.to_string()))
                }
            };
        let forecast_accuracy = evaluate_forecast(&series, &forecast);
        let forecast_outlook = ForecastOutlook::from_forecast(&series, &forecast);

        let burn = burn_rate(&series, self.config.burn_rate_window);
        let cash_runway = runway(self.config.starting_cash, burn);

        Ok(AnalysisOutcome::Completed(Box::new(AnalysisReport {
            reference_date,
            granularity: self.config.granularity,
            validation,
            metrics,
            rule_anomalies,
            statistical_anomalies,
            anomaly_statistics,
            forecast,
            forecast_error,
            forecast_accuracy,
            forecast_outlook,
            burn_rate: burn,
            starting_cash: self.config.starting_cash,
            runway: cash_runway,
        })))
    }
}
