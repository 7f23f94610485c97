//! Ratio extraction.
//!
//! [`RatioExtractor::extract`] is the one routine that turns a fetched
//! [`StatementSet`] into a [`RatioRecord`]. The batch path
//! ([`RatioExtractor::extract_many`]) and the prediction path both call it, so
//! a company's ratios are computed identically wherever they are used.

use crate::{
    Fetched, Metric, RatioRecord, RatioTable, Result,
    statement::{StatementKind, StatementSet},
};
use tracing::{debug, warn};

/// Statement row names read by the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItemNames {
    /// Income statement: total revenue
    pub total_revenue: String,
    /// Income statement: net income
    pub net_income: String,
    /// Income statement: operating income
    pub operating_income: String,
    /// Income statement: gross profit
    pub gross_profit: String,
    /// Income statement: interest expense
    pub interest_expense: String,
    /// Balance sheet: total current assets
    pub current_assets: String,
    /// Balance sheet: total current liabilities
    pub current_liabilities: String,
    /// Balance sheet: total debt
    pub total_debt: String,
    /// Balance sheet: total stockholder equity
    pub total_equity: String,
    /// Balance sheet: total assets
    pub total_assets: String,
    /// Cash flow: cash from operating activities
    pub operating_cash_flow: String,
    /// Cash flow: capital expenditures
    pub capital_expenditures: String,
}

impl Default for LineItemNames {
    fn default() -> Self {
        Self {
            total_revenue: "Total Revenue".to_string(),
            net_income: "Net Income".to_string(),
            operating_income: "Operating Income".to_string(),
            gross_profit: "Gross Profit".to_string(),
            interest_expense: "Interest Expense".to_string(),
            current_assets: "Total Current Assets".to_string(),
            current_liabilities: "Total Current Liabilities".to_string(),
            total_debt: "Total Debt".to_string(),
            total_equity: "Total Stockholder Equity".to_string(),
            total_assets: "Total Assets".to_string(),
            operating_cash_flow: "Total Cash From Operating Activities".to_string(),
            capital_expenditures: "Capital Expenditures".to_string(),
        }
    }
}

/// Configuration for [`RatioExtractor`].
#[derive(Debug, Clone, Default)]
pub struct ExtractorConfig {
    /// Row names to look up in each statement
    pub line_items: LineItemNames,
}

/// Raw line item values for the most recent period.
///
/// `None` marks a missing value. Capital expenditures is the exception: a
/// statement without that row reports zero. A row that is present but blank
/// in the latest period is still missing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawLineItems {
    /// Total revenue
    pub revenue: Option<f64>,
    /// Net income
    pub net_income: Option<f64>,
    /// Operating income
    pub operating_income: Option<f64>,
    /// Gross profit
    pub gross_profit: Option<f64>,
    /// Interest expense
    pub interest_expense: Option<f64>,
    /// Total current assets
    pub current_assets: Option<f64>,
    /// Total current liabilities
    pub current_liabilities: Option<f64>,
    /// Total debt
    pub total_debt: Option<f64>,
    /// Total stockholder equity
    pub total_equity: Option<f64>,
    /// Total assets
    pub total_assets: Option<f64>,
    /// Cash from operating activities
    pub operating_cash_flow: Option<f64>,
    /// Capital expenditures, zero when the row is not reported
    pub capital_expenditures: Option<f64>,
}

impl RawLineItems {
    /// Derive every metric, in [`Metric::ALL`] order.
    ///
    /// ```text
    /// Gross Margin      = Gross Profit / Revenue x 100
    /// Operating Margin  = Operating Income / Revenue x 100
    /// Net Margin        = Net Income / Revenue x 100
    /// Current Ratio     = Current Assets / Current Liabilities
    /// Debt to Equity    = Total Debt / Total Equity
    /// Interest Coverage = Operating Income / Interest Expense
    /// Asset Turnover    = Revenue / Total Assets
    /// Free Cash Flow    = Operating Cash Flow - Capital Expenditures
    /// ```
    pub fn metrics(&self) -> [Option<f64>; Metric::COUNT] {
        [
            self.revenue,
            self.net_income,
            self.operating_income,
            percentage(self.gross_profit, self.revenue),
            percentage(self.operating_income, self.revenue),
            percentage(self.net_income, self.revenue),
            ratio(self.current_assets, self.current_liabilities),
            ratio(self.total_debt, self.total_equity),
            ratio(self.operating_income, self.interest_expense),
            ratio(self.revenue, self.total_assets),
            self.operating_cash_flow
                .zip(self.capital_expenditures)
                .map(|(ocf, capex)| ocf - capex)
                .filter(|v| v.is_finite()),
        ]
    }
}

/// Guarded division.
///
/// Missing when the numerator is missing, or when the denominator is missing
/// or zero. A zero denominator is treated exactly like a missing one. Any
/// non-finite quotient is also reported as missing.
pub fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let denominator = denominator.filter(|d| *d != 0.0)?;
    numerator
        .map(|n| n / denominator)
        .filter(|v| v.is_finite())
}

/// Guarded division scaled to a percentage.
pub fn percentage(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    ratio(numerator, denominator)
        .map(|v| v * 100.0)
        .filter(|v| v.is_finite())
}

/// Derives a [`RatioRecord`] from fetched statements.
#[derive(Debug, Clone, Default)]
pub struct RatioExtractor {
    config: ExtractorConfig,
}

impl RatioExtractor {
    /// Extractor reading the standard line item names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extractor with custom configuration.
    pub const fn with_config(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Read the most recent value of every required line item.
    pub fn line_items(&self, statements: &StatementSet) -> Result<RawLineItems> {
        let names = &self.config.line_items;
        let read = |kind: StatementKind, name: &str| statements.get(kind).most_recent(kind, name);

        let capital_expenditures = if statements.cash_flow.contains(&names.capital_expenditures) {
            read(StatementKind::CashFlow, &names.capital_expenditures)?
        } else {
            Some(0.0)
        };

        Ok(RawLineItems {
            revenue: read(StatementKind::Income, &names.total_revenue)?,
            net_income: read(StatementKind::Income, &names.net_income)?,
            operating_income: read(StatementKind::Income, &names.operating_income)?,
            gross_profit: read(StatementKind::Income, &names.gross_profit)?,
            interest_expense: read(StatementKind::Income, &names.interest_expense)?,
            current_assets: read(StatementKind::Balance, &names.current_assets)?,
            current_liabilities: read(StatementKind::Balance, &names.current_liabilities)?,
            total_debt: read(StatementKind::Balance, &names.total_debt)?,
            total_equity: read(StatementKind::Balance, &names.total_equity)?,
            total_assets: read(StatementKind::Balance, &names.total_assets)?,
            operating_cash_flow: read(StatementKind::CashFlow, &names.operating_cash_flow)?,
            capital_expenditures,
        })
    }

    /// Compute the ratio record for one company.
    pub fn extract(&self, symbol: &str, statements: &StatementSet) -> Result<RatioRecord> {
        let items = self.line_items(statements)?;
        Ok(RatioRecord::new(symbol, items.metrics()))
    }

    /// Compute a ratio table over many fetch results.
    ///
    /// Symbols whose fetch failed are skipped without further logging (the
    /// fetch already reported them). Extraction failures are logged and the
    /// symbol is skipped; the rest of the batch is unaffected.
    pub fn extract_many(&self, fetched: &[Fetched]) -> RatioTable {
        let mut table = RatioTable::new();

        for Fetched { symbol, statements } in fetched {
            let Some(statements) = statements else {
                debug!(symbol = %symbol, "skipping symbol without statements");
                continue;
            };

            match self.extract(symbol, statements) {
                Ok(record) => table.push(record),
                Err(e) => warn!(symbol = %symbol, error = %e, "error processing statements"),
            }
        }

        table
    }
}
