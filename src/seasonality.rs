use crate::schema::Granularity;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

pub const YEAR_DAYS: f64 = 365.25;
pub const WEEK_DAYS: f64 = 7.0;

/// How seasonal terms combine with the trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SeasonalityMode {
    /// y = trend + seasonal
    Additive,
    /// y = trend * (1 + seasonal)
    Multiplicative,
}

impl Default for SeasonalityMode {
    fn default() -> Self {
        Self::Additive
    }
}

/// A periodic pattern modelled by a truncated Fourier series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalComponent {
    pub name: &'static str,
    pub period_days: f64,
    pub fourier_order: usize,
}

impl SeasonalComponent {
    pub fn yearly() -> Self {
        Self {
            name: "yearly",
            period_days: YEAR_DAYS,
            fourier_order: 10,
        }
    }

    pub fn weekly() -> Self {
        Self {
            name: "weekly",
            period_days: WEEK_DAYS,
            fourier_order: 3,
        }
    }

    /// Number of design-matrix columns this component contributes.
    pub fn width(&self) -> usize {
        self.fourier_order * 2
    }

    /// `[sin(2πkt/P), cos(2πkt/P)]` for k = 1..=order, with `t` in days.
    pub fn fourier_terms(&self, t_days: f64) -> Vec<f64> {
        let mut terms = Vec::with_capacity(self.width());
        for k in 1..=self.fourier_order {
            let angle = 2.0 * PI * k as f64 * t_days / self.period_days;
            terms.push(angle.sin());
            terms.push(angle.cos());
        }
        terms
    }
}

/// Seasonal components worth fitting for a history of `span_days` at `granularity`.
///
/// Yearly seasonality needs two full years of history. Weekly seasonality only applies to
/// daily buckets spanning at least two weeks; coarser buckets cannot resolve it.
pub fn components_for(granularity: Granularity, span_days: i64) -> Vec<SeasonalComponent> {
    let mut components = Vec::new();

    if span_days as f64 >= 2.0 * YEAR_DAYS {
        components.push(SeasonalComponent::yearly());
    }

    if granularity == Granularity::Day && span_days >= 14 {
        components.push(SeasonalComponent::weekly());
    }

    components
}

/// Concatenated Fourier terms for every component at `t_days`.
pub fn seasonal_features(components: &[SeasonalComponent], t_days: f64) -> Vec<f64> {
    components
        .iter()
        .flat_map(|c| c.fourier_terms(t_days))
        .collect()
}
