use crate::error::{LedgerError, Result};
use crate::normalizer::ColumnAliases;
use crate::schema::Granularity;
use crate::seasonality::SeasonalityMode;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;

pub const DEFAULT_NOTE_TERMS: [&str; 4] = ["suspicious", "anomaly", "fraud", "error"];

/// Parameters for every engine. Passed explicitly into each engine's constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Expected fraction of outliers for the statistical detector (0.01 to 0.2)
    pub contamination: f64,

    /// Number of future buckets to forecast. Defaults depend on the granularity.
    pub forecast_horizon: Option<usize>,

    pub granularity: Granularity,

    /// Trailing months averaged into the burn rate
    pub burn_rate_window: usize,

    /// Cash on hand used for the runway figure
    pub starting_cash: f64,

    /// Seed for the isolation forest and the forecast interval simulation
    pub random_seed: u64,

    pub n_estimators: usize,
    pub max_samples: usize,

    /// Trailing rows in the rolling amount features
    pub rolling_window: usize,

    /// Coverage of the forecast uncertainty interval
    pub interval_width: f64,
    pub uncertainty_samples: usize,
    pub seasonality_mode: SeasonalityMode,

    /// Standard deviations above the mean before an amount is "unusually high"
    pub high_amount_sigma: f64,
    pub flagged_note_terms: Vec<String>,

    pub column_aliases: ColumnAliases,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            contamination: 0.1,
            forecast_horizon: None,
            granularity: Granularity::Month,
            burn_rate_window: 3,
            starting_cash: 0.0,
            random_seed: 42,
            n_estimators: 100,
            max_samples: 256,
            rolling_window: 7,
            interval_width: 0.95,
            uncertainty_samples: 1000,
            seasonality_mode: SeasonalityMode::Additive,
            high_amount_sigma: 3.0,
            flagged_note_terms: DEFAULT_NOTE_TERMS.iter().map(|s| s.to_string()).collect(),
            column_aliases: ColumnAliases::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Forecast horizon in buckets: the configured value or 30 days / 4 weeks / 3 months.
    pub fn horizon(&self) -> usize {
        self.forecast_horizon
            .unwrap_or_else(|| default_horizon(self.granularity))
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.01..=0.2).contains(&self.contamination) {
            return Err(LedgerError::InvalidConfig(format!(
                "contamination {} must be between 0.01 and 0.2",
                self.contamination
            )));
        }

        let allowed = horizon_range(self.granularity);
        let horizon = self.horizon();
        if !allowed.contains(&horizon) {
            return Err(LedgerError::InvalidConfig(format!(
                "forecast horizon {} must be between {} and {} for {} buckets",
                horizon,
                allowed.start(),
                allowed.end(),
                self.granularity
            )));
        }

        if self.burn_rate_window == 0 {
            return Err(LedgerError::InvalidConfig(
                "burn rate window must be at least one month".to_string(),
            ));
        }

        if !self.starting_cash.is_finite() {
            return Err(LedgerError::InvalidConfig(
                "starting cash must be a finite amount".to_string(),
            ));
        }

        if self.n_estimators == 0 || self.max_samples < 2 {
            return Err(LedgerError::InvalidConfig(format!(
                "isolation forest needs at least one tree and two samples per tree (got {} trees, {} samples)",
                self.n_estimators, self.max_samples
            )));
        }

        if self.rolling_window == 0 {
            return Err(LedgerError::InvalidConfig(
                "rolling window must cover at least one row".to_string(),
            ));
        }

        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(LedgerError::InvalidConfig(format!(
                "interval width {} must be strictly between 0 and 1",
                self.interval_width
            )));
        }

        if self.uncertainty_samples == 0 {
            return Err(LedgerError::InvalidConfig(
                "uncertainty samples must be at least 1".to_string(),
            ));
        }

        if !(self.high_amount_sigma.is_finite() && self.high_amount_sigma > 0.0) {
            return Err(LedgerError::InvalidConfig(format!(
                "high amount sigma {} must be positive",
                self.high_amount_sigma
            )));
        }

        Ok(())
    }
}

fn default_horizon(granularity: Granularity) -> usize {
    match granularity {
        Granularity::Day => 30,
        Granularity::Week => 4,
        Granularity::Month => 3,
    }
}

fn horizon_range(granularity: Granularity) -> RangeInclusive<usize> {
    match granularity {
        Granularity::Day => 7..=90,
        Granularity::Week => 1..=13,
        Granularity::Month => 1..=12,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CanonicalColumn;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.horizon(), 3);
        assert_eq!(config.contamination, 0.1);
        assert_eq!(config.burn_rate_window, 3);
    }

    #[test]
    fn test_default_horizon_follows_granularity() {
        let config = AnalysisConfig {
            granularity: Granularity::Day,
            ..AnalysisConfig::default()
        };
        assert_eq!(config.horizon(), 30);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            AnalysisConfig::from_json_str(r#"{"contamination": 0.05, "granularity": "week"}"#)
                .unwrap();
        assert_eq!(config.contamination, 0.05);
        assert_eq!(config.granularity, Granularity::Week);
        assert_eq!(config.horizon(), 4);
        assert_eq!(config.random_seed, 42);
    }

    #[test]
    fn test_partial_alias_map_keeps_default_aliases() {
        let json = r#"{"column_aliases": {"aliases": {"date": ["Posted On"]}}}"#;
        let config = AnalysisConfig::from_json_str(json).unwrap();
        let defaults = ColumnAliases::default();
        assert_eq!(
            config.column_aliases,
            defaults.clone().with_alias(CanonicalColumn::Date, "Posted On")
        );
        assert_eq!(
            config.column_aliases.candidates(CanonicalColumn::Amount),
            defaults.candidates(CanonicalColumn::Amount)
        );
    }

    #[test]
    fn test_contamination_out_of_range() {
        let result = AnalysisConfig::from_json_str(r#"{"contamination": 0.5}"#);
        assert!(matches!(result, Err(LedgerError::InvalidConfig(_))));
    }

    #[test]
    fn test_horizon_out_of_range() {
        let config = AnalysisConfig {
            granularity: Granularity::Day,
            forecast_horizon: Some(3),
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AnalysisConfig {
            forecast_horizon: Some(13),
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_burn_window_rejected() {
        let config = AnalysisConfig {
            burn_rate_window: 0,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let config = AnalysisConfig {
            starting_cash: 250_000.0,
            ..AnalysisConfig::default()
        };
        let json = config.to_json().unwrap();
        let parsed = AnalysisConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
