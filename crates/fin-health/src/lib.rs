//! Financial statement ratios and health classification.
//!
//! Statements for a company are fetched from a [`StatementSource`], reduced to
//! a fixed [`RatioRecord`] by [`RatioExtractor`], and either collected into a
//! [`RatioTable`] or, after imputing missing metrics from a reference table,
//! classified by a pre-trained model through [`HealthPredictor`].
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fin-health/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod extract;
pub mod model;
pub mod predict;
pub mod schema;
pub mod source;
pub mod statement;
pub mod table;

// Re-export core types
pub use config::Settings;
pub use error::{HealthError, Result};
pub use extract::{ExtractorConfig, LineItemNames, RatioExtractor, RawLineItems};
pub use model::{
    Classifier, ClassifierModel, LogisticRegression, ModelBundle, RandomForest, Scaler,
    StandardScaler,
};
pub use predict::{HealthLabel, HealthPrediction, HealthPredictor};
pub use schema::{FeatureSchema, Metric, TICKER_COLUMN};
pub use source::{Fetched, JsonDirectorySource, MemorySource, StatementSource, fetch, fetch_all};
pub use statement::{Statement, StatementKind, StatementSet};
pub use table::{ImputedRecord, RatioRecord, RatioTable, ReferenceStatistics};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
