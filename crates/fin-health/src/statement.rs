//! Financial statement tables.
//!
//! A [`Statement`] mirrors the shape a statement provider hands back: one row
//! per named line item and one column per reporting period. Only the most
//! recent period is ever read by the ratio extractor.

use crate::{HealthError, Result};
use chrono::NaiveDate;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which of the three statements a table holds.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    /// Income statement
    #[display("income")]
    Income,
    /// Balance sheet
    #[display("balance")]
    Balance,
    /// Cash flow statement
    #[display("cash flow")]
    CashFlow,
}

/// A single statement: named line items over reporting periods.
///
/// `items[name][i]` is the value of line item `name` for `periods[i]`. Blank
/// cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    /// Period end dates, one per column
    pub periods: Vec<NaiveDate>,
    /// Line item name to per-period values
    pub items: BTreeMap<String, Vec<Option<f64>>>,
}

impl Statement {
    /// Create an empty statement over the given periods.
    pub const fn new(periods: Vec<NaiveDate>) -> Self {
        Self {
            periods,
            items: BTreeMap::new(),
        }
    }

    /// Add a line item row, builder style.
    pub fn with_item(mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        self.items.insert(name.into(), values);
        self
    }

    /// Whether the statement carries a row for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    /// Column index of the latest period, if there are any periods.
    fn latest_column(&self) -> Option<usize> {
        self.periods
            .iter()
            .enumerate()
            .max_by_key(|(_, date)| **date)
            .map(|(idx, _)| idx)
    }

    /// Read the most recent period's value of a line item.
    ///
    /// Returns `Ok(None)` when the line item is absent or its latest cell is
    /// blank or non-finite. A present line item that cannot be read because
    /// the table has no periods, or because its row does not line up with the
    /// period columns, is an error.
    pub fn most_recent(&self, kind: StatementKind, name: &str) -> Result<Option<f64>> {
        let Some(row) = self.items.get(name) else {
            return Ok(None);
        };

        let malformed = |reason: String| HealthError::MalformedStatement {
            statement: kind.to_string(),
            item: name.to_string(),
            reason,
        };

        let column = self
            .latest_column()
            .ok_or_else(|| malformed("has no reporting periods".to_string()))?;

        if row.len() != self.periods.len() {
            return Err(malformed(format!(
                "has {} values for {} periods",
                row.len(),
                self.periods.len()
            )));
        }

        Ok(row[column].filter(|value| value.is_finite()))
    }
}

/// The three statements fetched for one company.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementSet {
    /// Income statement
    pub income: Statement,
    /// Balance sheet
    pub balance: Statement,
    /// Cash flow statement
    pub cash_flow: Statement,
}

impl StatementSet {
    /// Borrow the statement of the given kind.
    pub const fn get(&self, kind: StatementKind) -> &Statement {
        match kind {
            StatementKind::Income => &self.income,
            StatementKind::Balance => &self.balance,
            StatementKind::CashFlow => &self.cash_flow,
        }
    }
}
