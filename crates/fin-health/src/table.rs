//! Ratio records, ratio tables and reference statistics.

use crate::{
    HealthError, Result,
    schema::{FeatureSchema, Metric, TICKER_COLUMN},
};
use polars::prelude::*;

/// Ratios for one company. Every record carries all [`Metric::ALL`] columns;
/// a `None` value is a missing metric.
#[derive(Debug, Clone, PartialEq)]
pub struct RatioRecord {
    symbol: String,
    values: [Option<f64>; Metric::COUNT],
}

impl RatioRecord {
    /// Create a record from values in [`Metric::ALL`] order.
    pub fn new(symbol: impl Into<String>, values: [Option<f64>; Metric::COUNT]) -> Self {
        Self {
            symbol: symbol.into(),
            values,
        }
    }

    /// Company symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Value of one metric.
    pub const fn get(&self, metric: Metric) -> Option<f64> {
        self.values[metric.index()]
    }

    /// Metrics paired with their values, in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Metric, Option<f64>)> + '_ {
        Metric::ALL.into_iter().zip(self.values.iter().copied())
    }

    /// Metrics that have no value.
    pub fn missing(&self) -> Vec<Metric> {
        self.iter()
            .filter(|(_, value)| value.is_none())
            .map(|(metric, _)| metric)
            .collect()
    }
}

/// Ratio records in insertion order, one per successfully processed symbol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatioTable {
    records: Vec<RatioRecord>,
}

impl RatioTable {
    /// Create an empty table.
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Append a record.
    pub fn push(&mut self, record: RatioRecord) {
        self.records.push(record);
    }

    /// Records in insertion order.
    pub fn records(&self) -> &[RatioRecord] {
        &self.records
    }

    /// Symbols in insertion order.
    pub fn symbols(&self) -> Vec<&str> {
        self.records.iter().map(RatioRecord::symbol).collect()
    }

    /// Number of rows.
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no rows.
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Render as a DataFrame with a `Ticker` column followed by one nullable
    /// `f64` column per metric.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = Vec::with_capacity(Metric::COUNT + 1);
        columns.push(Column::new(TICKER_COLUMN.into(), self.symbols()));

        for metric in Metric::ALL {
            let values: Vec<Option<f64>> = self.records.iter().map(|r| r.get(metric)).collect();
            columns.push(Column::new(metric.name().into(), values));
        }

        Ok(DataFrame::new(columns)?)
    }
}

impl FromIterator<RatioRecord> for RatioTable {
    fn from_iter<I: IntoIterator<Item = RatioRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

/// Column means of a reference [`RatioTable`], used to fill missing metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceStatistics {
    means: [Option<f64>; Metric::COUNT],
}

impl ReferenceStatistics {
    /// Compute the mean of every metric column, ignoring missing values.
    ///
    /// Only the numeric metric columns take part; the ticker column is never
    /// averaged. A column with no values at all has no mean.
    pub fn from_table(table: &RatioTable) -> Result<Self> {
        let means = table
            .to_dataframe()?
            .lazy()
            .select(Metric::ALL.map(|m| col(m.name()).mean()))
            .collect()?;

        let mut out = [None; Metric::COUNT];
        for metric in Metric::ALL {
            out[metric.index()] = means
                .column(metric.name())?
                .f64()?
                .get(0)
                .filter(|v| v.is_finite());
        }

        Ok(Self { means: out })
    }

    /// Mean of one metric, if the reference table had any values for it.
    pub const fn mean(&self, metric: Metric) -> Option<f64> {
        self.means[metric.index()]
    }

    /// Replace every missing metric with its reference mean.
    pub fn impute(&self, record: &RatioRecord) -> Result<ImputedRecord> {
        let mut values = [0.0; Metric::COUNT];
        for (metric, value) in record.iter() {
            values[metric.index()] = value
                .or_else(|| self.mean(metric))
                .ok_or_else(|| HealthError::Imputation(metric.to_string()))?;
        }

        Ok(ImputedRecord { values })
    }
}

/// A ratio record with no missing values.
#[derive(Debug, Clone, PartialEq)]
pub struct ImputedRecord {
    values: [f64; Metric::COUNT],
}

impl ImputedRecord {
    /// Value of one metric.
    pub const fn get(&self, metric: Metric) -> f64 {
        self.values[metric.index()]
    }

    /// Feature vector in the order of `schema`.
    pub fn features(&self, schema: &FeatureSchema) -> Vec<f64> {
        schema.metrics().iter().map(|m| self.get(*m)).collect()
    }
}
