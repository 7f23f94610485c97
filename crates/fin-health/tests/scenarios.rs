//! End-to-end scenarios: fetch, extract, table, predict.

use approx::assert_relative_eq;
use chrono::NaiveDate;
use fin_health::{
    Classifier, ExtractorConfig, FeatureSchema, HealthError, HealthLabel, HealthPredictor,
    MemorySource, Metric, RatioExtractor, RatioRecord, RatioTable, Result, Scaler, Statement,
    StatementSet, StatementSource, fetch, fetch_all,
};
use std::cell::RefCell;
use std::io;
use std::sync::{Arc, Mutex};

fn statement(items: &[(&str, f64)]) -> Statement {
    let periods = vec![
        NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
    ];
    items.iter().fold(Statement::new(periods), |s, (name, v)| {
        s.with_item(*name, vec![Some(*v), Some(1.0)])
    })
}

fn aaa() -> StatementSet {
    StatementSet {
        income: statement(&[
            ("Total Revenue", 1000.0),
            ("Gross Profit", 400.0),
            ("Operating Income", 200.0),
            ("Net Income", 100.0),
            ("Interest Expense", 50.0),
        ]),
        balance: statement(&[
            ("Total Current Assets", 500.0),
            ("Total Current Liabilities", 250.0),
            ("Total Debt", 300.0),
            ("Total Stockholder Equity", 600.0),
            ("Total Assets", 2000.0),
        ]),
        cash_flow: statement(&[
            ("Total Cash From Operating Activities", 150.0),
            ("Capital Expenditures", 30.0),
        ]),
    }
}

#[derive(Debug)]
struct FailingProvider;

impl StatementSource for FailingProvider {
    fn statements(&self, symbol: &str) -> Result<StatementSet> {
        Err(HealthError::Provider {
            symbol: symbol.to_string(),
            message: "HTTP 503".to_string(),
        })
    }
}

#[derive(Debug, Default)]
struct RecordingScaler {
    seen: RefCell<Vec<f64>>,
}

impl Scaler for RecordingScaler {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>> {
        self.seen.replace(features.to_vec());
        Ok(features.to_vec())
    }
}

#[derive(Debug)]
struct AlwaysHealthy;

impl Classifier for AlwaysHealthy {
    fn predict(&self, _features: &[f64]) -> Result<usize> {
        Ok(1)
    }

    fn predict_proba(&self, _features: &[f64]) -> Result<[f64; 2]> {
        Ok([0.3, 0.7])
    }
}

/// Shared sink for formatted log output.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a thread-local subscriber and return what it logged.
fn captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    let out = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    (out, logs)
}

#[test]
fn scenario_complete_statements() {
    let record = RatioExtractor::new().extract("AAA", &aaa()).unwrap();

    let expected = [
        (Metric::Revenue, 1000.0),
        (Metric::NetIncome, 100.0),
        (Metric::OperatingIncome, 200.0),
        (Metric::GrossMargin, 40.0),
        (Metric::OperatingMargin, 20.0),
        (Metric::NetMargin, 10.0),
        (Metric::CurrentRatio, 2.0),
        (Metric::DebtToEquity, 0.5),
        (Metric::InterestCoverage, 4.0),
        (Metric::AssetTurnover, 0.5),
        (Metric::FreeCashFlow, 120.0),
    ];
    for (metric, value) in expected {
        assert_relative_eq!(record.get(metric).unwrap(), value);
    }
}

#[test]
fn scenario_zero_or_missing_revenue() {
    for revenue in [Some(0.0), None] {
        let mut set = aaa();
        match revenue {
            Some(v) => {
                set.income
                    .items
                    .insert("Total Revenue".to_string(), vec![Some(v), Some(1.0)]);
            }
            None => {
                set.income.items.remove("Total Revenue");
            }
        }

        let record = RatioExtractor::new().extract("BBB", &set).unwrap();
        assert_eq!(record.get(Metric::GrossMargin), None);
        assert_eq!(record.get(Metric::OperatingMargin), None);
        assert_eq!(record.get(Metric::NetMargin), None);
        assert_eq!(record.get(Metric::NetIncome), Some(100.0));
    }
}

#[test]
fn scenario_provider_error_is_skipped() {
    assert_eq!(fetch(&FailingProvider, "ZZZ"), None);

    let source = MemorySource::new().with("AAA", aaa()).with("CCC", aaa());
    let fetched = fetch_all(&source, &["AAA", "ZZZ", "CCC"]);
    let table = RatioExtractor::new().extract_many(&fetched);

    assert_eq!(table.len(), 2);
    assert_eq!(table.symbols(), ["AAA", "CCC"]);
}

#[test]
fn fetch_failure_is_logged_with_symbol() {
    let (fetched, logs) = captured_logs(|| fetch(&FailingProvider, "ZZZ"));

    assert_eq!(fetched, None);
    assert!(logs.contains("error fetching statements"));
    assert!(logs.contains("ZZZ"));
    assert!(logs.contains("HTTP 503"));
}

#[test]
fn extraction_failure_is_logged_with_symbol() {
    let mut bad = aaa();
    bad.balance.periods.clear();
    let source = MemorySource::new().with("AAA", aaa()).with("BAD", bad);
    let fetched = fetch_all(&source, &["AAA", "BAD"]);

    let (table, logs) = captured_logs(|| RatioExtractor::new().extract_many(&fetched));

    assert_eq!(table.symbols(), ["AAA"]);
    assert!(logs.contains("error processing statements"));
    assert!(logs.contains("BAD"));
    assert!(logs.contains("has no reporting periods"));
}

#[test]
fn scenario_missing_current_ratio_uses_reference_mean() {
    let mut set = aaa();
    set.balance.items.remove("Total Current Liabilities");
    let source = MemorySource::new().with("XYZ", set);

    let mut reference_values = [Some(1.0); Metric::COUNT];
    reference_values[Metric::CurrentRatio.index()] = Some(1.5);
    let mut other = reference_values;
    other[Metric::CurrentRatio.index()] = Some(2.1);
    let reference: RatioTable = [
        RatioRecord::new("R1", reference_values),
        RatioRecord::new("R2", other),
    ]
    .into_iter()
    .collect();

    let scaler = RecordingScaler::default();
    let schema = FeatureSchema::from_names(&["Gross Margin", "Current Ratio"]).unwrap();
    let predictor = HealthPredictor::new(&scaler, &AlwaysHealthy, &reference, schema).unwrap();

    let prediction = predictor.predict(&source, "XYZ").unwrap();
    assert_eq!(prediction.label, HealthLabel::Healthy);
    assert_relative_eq!(prediction.probability, 0.7);

    let seen = scaler.seen.borrow();
    assert_relative_eq!(seen[0], 40.0);
    assert_relative_eq!(seen[1], 1.8);
}

#[test]
fn batch_and_prediction_paths_agree() {
    let source = MemorySource::new().with("AAA", aaa());
    let table = RatioExtractor::new().extract_many(&fetch_all(&source, &["AAA"]));

    let scaler = RecordingScaler::default();
    let predictor =
        HealthPredictor::new(&scaler, &AlwaysHealthy, &table, FeatureSchema::standard()).unwrap();
    predictor.predict(&source, "AAA").unwrap();

    let row = &table.records()[0];
    let seen = scaler.seen.borrow();
    for (i, (_, value)) in row.iter().enumerate() {
        assert_eq!(Some(seen[i]), value);
    }
}

#[test]
fn custom_line_items_agree_between_batch_and_prediction() {
    let mut set = aaa();
    let revenue = set.income.items.remove("Total Revenue").unwrap();
    set.income.items.insert("Revenues".to_string(), revenue);
    let source = MemorySource::new().with("AAA", set);

    let mut config = ExtractorConfig::default();
    config.line_items.total_revenue = "Revenues".to_string();
    let extractor = RatioExtractor::with_config(config);
    let table = extractor.extract_many(&fetch_all(&source, &["AAA"]));

    let row = &table.records()[0];
    assert_relative_eq!(row.get(Metric::Revenue).unwrap(), 1000.0);
    assert_relative_eq!(row.get(Metric::GrossMargin).unwrap(), 40.0);

    let scaler = RecordingScaler::default();
    let predictor =
        HealthPredictor::new(&scaler, &AlwaysHealthy, &table, FeatureSchema::standard())
            .unwrap()
            .with_extractor(extractor);
    predictor.predict(&source, "AAA").unwrap();

    let seen = scaler.seen.borrow();
    for (i, (_, value)) in row.iter().enumerate() {
        assert_eq!(Some(seen[i]), value);
    }
}
