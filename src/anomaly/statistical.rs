use super::features::{build_features, standardize};
use super::isolation::IsolationForest;
use super::AnomalyRecord;
use crate::config::AnalysisConfig;
use crate::error::{LedgerError, Result};
use crate::schema::Ledger;
use crate::stats::percentile;
use log::{debug, error};

/// Multivariate outlier detection with an isolation forest.
#[derive(Debug, Clone)]
pub struct StatisticalDetector {
    contamination: f64,
    rolling_window: usize,
    forest: IsolationForest,
}

impl StatisticalDetector {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            contamination: config.contamination,
            rolling_window: config.rolling_window,
            forest: IsolationForest::new(
                config.n_estimators,
                config.max_samples,
                config.random_seed,
            ),
        }
    }

    #[must_use]
    pub fn with_contamination(mut self, contamination: f64) -> Self {
        self.contamination = contamination;
        self
    }

    /// Rows labeled anomalous, most anomalous first.
    ///
    /// Never fails: any problem while building features or fitting the model is logged
    /// and yields an empty result.
    pub fn detect(&self, ledger: &Ledger) -> Vec<AnomalyRecord> {
        if ledger.is_empty() {
            return Vec::new();
        }

        match self.try_detect(ledger) {
            Ok(records) => records,
            Err(e) => {
                error!("Statistical anomaly detection failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Score for every row in ledger order. More negative means more anomalous.
    pub fn score(&self, ledger: &Ledger) -> Result<Vec<f64>> {
        let features = build_features(ledger.transactions(), self.rolling_window);
        let scaled = standardize(&features);
        let model = self.forest.fit(&scaled)?;
        Ok(model.score_samples(&scaled))
    }

    fn try_detect(&self, ledger: &Ledger) -> Result<Vec<AnomalyRecord>> {
        if !(self.contamination > 0.0 && self.contamination < 1.0) {
            return Err(LedgerError::InternalError(format!(
                "contamination {} must be strictly between 0 and 1",
                self.contamination
            )));
        }

        let scores = self.score(ledger)?;
        let offset = percentile(&scores, self.contamination * 100.0)
            .ok_or_else(|| LedgerError::InternalError("no scores to threshold".to_string()))?;

        let mut flagged: Vec<(usize, f64)> = scores
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, score)| *score < offset)
            .collect();
        flagged.sort_by(|a, b| a.1.total_cmp(&b.1));

        debug!(
            "Isolation forest flagged {} of {} rows (offset {:.4})",
            flagged.len(),
            scores.len(),
            offset
        );

        Ok(flagged
            .into_iter()
            .map(|(idx, score)| AnomalyRecord::from_score(&ledger.transactions()[idx], score))
            .collect())
    }
}

/// Runs the isolation forest with default parameters and the given contamination.
pub fn detect_statistical(ledger: &Ledger, contamination: f64) -> Vec<AnomalyRecord> {
    StatisticalDetector::new(&AnalysisConfig::default())
        .with_contamination(contamination)
        .detect(ledger)
}
