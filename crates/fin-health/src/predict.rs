//! Health prediction for a single company.
//!
//! Fetch, extract, impute, scale, classify. Any failure aborts the prediction
//! for that symbol only and is logged with the symbol.

use crate::{
    Classifier, FeatureSchema, HealthError, RatioExtractor, RatioTable, ReferenceStatistics,
    Result, Scaler, StatementSet,
    source::{StatementSource, fetch},
};
use derive_more::Display;
use tracing::{debug, info, warn};

/// Health classification.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HealthLabel {
    /// Class 1
    Healthy,
    /// Class 0
    Unhealthy,
}

impl HealthLabel {
    /// Map a classifier class to a label: 1 is healthy, anything else is not.
    pub const fn from_class(class: usize) -> Self {
        if class == 1 {
            Self::Healthy
        } else {
            Self::Unhealthy
        }
    }
}

/// Outcome of a successful prediction.
#[derive(Debug, Display, Clone, PartialEq)]
#[display("{symbol}: {label} (Probability: {probability:.2})")]
pub struct HealthPrediction {
    /// Company symbol
    pub symbol: String,
    /// Predicted label
    pub label: HealthLabel,
    /// Probability of the predicted class
    pub probability: f64,
}

/// Classifies companies using a fitted scaler and classifier.
///
/// Reference statistics are computed once from the reference table at
/// construction and reused for every prediction.
#[derive(Debug)]
pub struct HealthPredictor<'a> {
    extractor: RatioExtractor,
    scaler: &'a dyn Scaler,
    classifier: &'a dyn Classifier,
    reference: ReferenceStatistics,
    features: FeatureSchema,
}

impl<'a> HealthPredictor<'a> {
    /// Build a predictor.
    ///
    /// `features` must list the columns in the order the scaler and classifier
    /// were fit on.
    pub fn new(
        scaler: &'a dyn Scaler,
        classifier: &'a dyn Classifier,
        reference_table: &RatioTable,
        features: FeatureSchema,
    ) -> Result<Self> {
        Ok(Self {
            extractor: RatioExtractor::default(),
            scaler,
            classifier,
            reference: ReferenceStatistics::from_table(reference_table)?,
            features,
        })
    }

    /// Use a custom extractor, builder style.
    pub fn with_extractor(mut self, extractor: RatioExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Fetch statements for `symbol` and classify its financial health.
    pub fn predict(&self, source: &dyn StatementSource, symbol: &str) -> Result<HealthPrediction> {
        let Some(statements) = fetch(source, symbol) else {
            let err = HealthError::FetchFailed(symbol.to_string());
            warn!(symbol, "{err}");
            return Err(err);
        };

        let prediction = self.classify(symbol, &statements);
        match &prediction {
            Ok(p) => info!(symbol, label = %p.label, probability = p.probability, "prediction"),
            Err(e) => warn!(symbol, error = %e, "error processing statements"),
        }
        prediction
    }

    fn classify(&self, symbol: &str, statements: &StatementSet) -> Result<HealthPrediction> {
        let record = self.extractor.extract(symbol, statements)?;

        let missing = record.missing();
        if !missing.is_empty() {
            debug!(symbol, ?missing, "imputing missing metrics");
        }
        let imputed = self.reference.impute(&record)?;

        let scaled = self.scaler.transform(&imputed.features(&self.features))?;
        let class = self.classifier.predict(&scaled)?;
        let proba = self.classifier.predict_proba(&scaled)?;
        let probability = *proba.get(class).ok_or_else(|| {
            HealthError::Model(format!("classifier predicted unknown class {class}"))
        })?;

        Ok(HealthPrediction {
            symbol: symbol.to_string(),
            label: HealthLabel::from_class(class),
            probability,
        })
    }
}
