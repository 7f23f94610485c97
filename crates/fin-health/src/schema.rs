//! Metric and feature schema.
//!
//! The set of ratio metrics and the feature order a trained model expects are
//! explicit values here rather than being inferred from the shape of some
//! earlier table.

use crate::{HealthError, Result};
use derive_more::Display;
use std::str::FromStr;

/// Name of the identifier column in a ratio table.
pub const TICKER_COLUMN: &str = "Ticker";

/// One column of a [`RatioRecord`](crate::RatioRecord).
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    /// Most recent total revenue
    #[display("Revenue")]
    Revenue,
    /// Most recent net income
    #[display("Net Income")]
    NetIncome,
    /// Most recent operating income
    #[display("Operating Income")]
    OperatingIncome,
    /// Gross profit as a percentage of revenue
    #[display("Gross Margin")]
    GrossMargin,
    /// Operating income as a percentage of revenue
    #[display("Operating Margin")]
    OperatingMargin,
    /// Net income as a percentage of revenue
    #[display("Net Margin")]
    NetMargin,
    /// Current assets over current liabilities
    #[display("Current Ratio")]
    CurrentRatio,
    /// Total debt over stockholder equity
    #[display("Debt to Equity")]
    DebtToEquity,
    /// Operating income over interest expense
    #[display("Interest Coverage")]
    InterestCoverage,
    /// Revenue over total assets
    #[display("Asset Turnover")]
    AssetTurnover,
    /// Operating cash flow less capital expenditures
    #[display("Free Cash Flow")]
    FreeCashFlow,
}

impl Metric {
    /// Number of metrics in a ratio record.
    pub const COUNT: usize = 11;

    /// Every metric, in canonical column order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Revenue,
        Self::NetIncome,
        Self::OperatingIncome,
        Self::GrossMargin,
        Self::OperatingMargin,
        Self::NetMargin,
        Self::CurrentRatio,
        Self::DebtToEquity,
        Self::InterestCoverage,
        Self::AssetTurnover,
        Self::FreeCashFlow,
    ];

    /// Column name used in tables and model artifacts.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Revenue => "Revenue",
            Self::NetIncome => "Net Income",
            Self::OperatingIncome => "Operating Income",
            Self::GrossMargin => "Gross Margin",
            Self::OperatingMargin => "Operating Margin",
            Self::NetMargin => "Net Margin",
            Self::CurrentRatio => "Current Ratio",
            Self::DebtToEquity => "Debt to Equity",
            Self::InterestCoverage => "Interest Coverage",
            Self::AssetTurnover => "Asset Turnover",
            Self::FreeCashFlow => "Free Cash Flow",
        }
    }

    /// Short description for listings.
    pub const fn description(self) -> &'static str {
        match self {
            Self::Revenue => "total revenue, most recent period",
            Self::NetIncome => "net income, most recent period",
            Self::OperatingIncome => "operating income, most recent period",
            Self::GrossMargin => "gross profit / revenue x 100",
            Self::OperatingMargin => "operating income / revenue x 100",
            Self::NetMargin => "net income / revenue x 100",
            Self::CurrentRatio => "current assets / current liabilities",
            Self::DebtToEquity => "total debt / stockholder equity",
            Self::InterestCoverage => "operating income / interest expense",
            Self::AssetTurnover => "revenue / total assets",
            Self::FreeCashFlow => "operating cash flow - capital expenditures",
        }
    }

    /// Position of this metric in [`Metric::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl FromStr for Metric {
    type Err = HealthError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| HealthError::UnknownMetric(s.to_string()))
    }
}

/// Ordered feature columns a scaler and classifier were fit on.
///
/// Order matters: the n-th value handed to the scaler is the n-th metric here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    metrics: Vec<Metric>,
}

impl FeatureSchema {
    /// All metrics in canonical order.
    pub fn standard() -> Self {
        Self {
            metrics: Metric::ALL.to_vec(),
        }
    }

    /// Build a schema from metrics, rejecting duplicates and empty lists.
    pub fn new(metrics: Vec<Metric>) -> Result<Self> {
        if metrics.is_empty() {
            return Err(HealthError::Model("feature schema is empty".to_string()));
        }
        for (i, metric) in metrics.iter().enumerate() {
            if metrics[..i].contains(metric) {
                return Err(HealthError::Model(format!(
                    "feature '{metric}' listed more than once"
                )));
            }
        }
        Ok(Self { metrics })
    }

    /// Build a schema from column names.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let metrics = names
            .iter()
            .map(|name| name.as_ref().parse())
            .collect::<Result<Vec<_>>>()?;
        Self::new(metrics)
    }

    /// Metrics in feature order.
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Always false for a constructed schema.
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::standard()
    }
}
