//! Pre-trained scaler and classifier collaborators.
//!
//! Nothing here trains a model. [`Scaler`] and [`Classifier`] are the seams a
//! caller plugs fitted models into; [`ModelBundle`] loads a fitted standard
//! scaler plus a random forest or logistic regression from a JSON artifact.

use crate::{FeatureSchema, HealthError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Transforms a raw feature vector into the space the classifier was fit on.
pub trait Scaler: std::fmt::Debug {
    /// Scale one feature vector.
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>>;
}

/// Binary classifier over scaled feature vectors.
pub trait Classifier: std::fmt::Debug {
    /// Predicted class, 0 or 1.
    fn predict(&self, features: &[f64]) -> Result<usize>;

    /// Class probabilities `[p(class 0), p(class 1)]`.
    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2]>;
}

fn check_len(what: &str, expected: usize, got: usize) -> Result<()> {
    if expected == got {
        Ok(())
    } else {
        Err(HealthError::Model(format!(
            "{what} expects {expected} features, got {got}"
        )))
    }
}

/// Z-score scaler: `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Per-feature mean
    pub mean: Vec<f64>,
    /// Per-feature standard deviation
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Number of features the scaler was fit on.
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }
}

impl Scaler for StandardScaler {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>> {
        check_len("scaler", self.n_features(), features.len())?;
        check_len("scaler scale", self.n_features(), self.scale.len())?;

        Ok(features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| {
                // Constant features were fit with zero variance
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect())
    }
}

/// One node of a fitted decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Internal split: `features[feature] <= threshold` goes left
    Split {
        /// Feature index
        feature: usize,
        /// Split threshold
        threshold: f64,
        /// Subtree for values at or below the threshold
        left: Box<TreeNode>,
        /// Subtree for values above the threshold
        right: Box<TreeNode>,
    },
    /// Leaf carrying class probabilities `[p0, p1]`
    Leaf {
        /// Class probabilities at this leaf
        probabilities: [f64; 2],
    },
}

impl TreeNode {
    fn leaf_probabilities(&self, features: &[f64]) -> Result<[f64; 2]> {
        let mut node = self;
        loop {
            match node {
                Self::Leaf { probabilities } => return Ok(*probabilities),
                Self::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features.get(*feature).ok_or_else(|| {
                        HealthError::Model(format!(
                            "tree splits on feature {feature} but only {} are present",
                            features.len()
                        ))
                    })?;
                    node = if value <= threshold { left } else { right };
                }
            }
        }
    }

    fn max_feature(&self) -> Option<usize> {
        match self {
            Self::Leaf { .. } => None,
            Self::Split {
                feature,
                left,
                right,
                ..
            } => [Some(*feature), left.max_feature(), right.max_feature()]
                .into_iter()
                .flatten()
                .max(),
        }
    }
}

/// Averaged ensemble of decision trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    /// Fitted trees
    pub trees: Vec<TreeNode>,
}

impl RandomForest {
    /// Highest feature index any tree splits on.
    pub fn max_feature(&self) -> Option<usize> {
        self.trees.iter().filter_map(TreeNode::max_feature).max()
    }
}

impl Classifier for RandomForest {
    fn predict(&self, features: &[f64]) -> Result<usize> {
        let [p0, p1] = self.predict_proba(features)?;
        Ok(usize::from(p1 > p0))
    }

    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2]> {
        if self.trees.is_empty() {
            return Err(HealthError::Model("random forest has no trees".to_string()));
        }

        let mut total = [0.0, 0.0];
        for tree in &self.trees {
            let [p0, p1] = tree.leaf_probabilities(features)?;
            total[0] += p0;
            total[1] += p1;
        }

        let n = self.trees.len() as f64;
        Ok([total[0] / n, total[1] / n])
    }
}

/// Logistic regression: `p1 = sigmoid(w . x + b)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Per-feature weights
    pub coefficients: Vec<f64>,
    /// Bias term
    pub intercept: f64,
}

impl Classifier for LogisticRegression {
    fn predict(&self, features: &[f64]) -> Result<usize> {
        let [_, p1] = self.predict_proba(features)?;
        Ok(usize::from(p1 > 0.5))
    }

    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2]> {
        check_len("logistic regression", self.coefficients.len(), features.len())?;

        let z: f64 = self
            .coefficients
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept;
        let p1 = 1.0 / (1.0 + (-z).exp());

        Ok([1.0 - p1, p1])
    }
}

/// A fitted classifier of either supported kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassifierModel {
    /// Random forest
    RandomForest(RandomForest),
    /// Logistic regression
    LogisticRegression(LogisticRegression),
}

impl Classifier for ClassifierModel {
    fn predict(&self, features: &[f64]) -> Result<usize> {
        match self {
            Self::RandomForest(m) => m.predict(features),
            Self::LogisticRegression(m) => m.predict(features),
        }
    }

    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2]> {
        match self {
            Self::RandomForest(m) => m.predict_proba(features),
            Self::LogisticRegression(m) => m.predict_proba(features),
        }
    }
}

#[derive(Deserialize)]
struct RawBundle {
    features: Vec<String>,
    scaler: StandardScaler,
    classifier: ClassifierModel,
}

/// Fitted scaler, classifier and the feature order they were fit on.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    /// Feature order
    pub features: FeatureSchema,
    /// Fitted scaler
    pub scaler: StandardScaler,
    /// Fitted classifier
    pub classifier: ClassifierModel,
}

impl ModelBundle {
    /// Parse a bundle from JSON and check that its parts agree on the
    /// number of features.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawBundle = serde_json::from_str(json)?;
        let features = FeatureSchema::from_names(&raw.features)?;
        let n = features.len();

        check_len("scaler", raw.scaler.n_features(), n)?;
        check_len("scaler scale", raw.scaler.scale.len(), n)?;
        match &raw.classifier {
            ClassifierModel::LogisticRegression(m) => {
                check_len("logistic regression", m.coefficients.len(), n)?;
            }
            ClassifierModel::RandomForest(m) => {
                if m.trees.is_empty() {
                    return Err(HealthError::Model("random forest has no trees".to_string()));
                }
                if let Some(max) = m.max_feature().filter(|max| *max >= n) {
                    return Err(HealthError::Model(format!(
                        "random forest splits on feature {max} but the schema has {n}"
                    )));
                }
            }
        }

        Ok(Self {
            features,
            scaler: raw.scaler,
            classifier: raw.classifier,
        })
    }

    /// Load a bundle from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn stump(threshold: f64) -> TreeNode {
        TreeNode::Split {
            feature: 0,
            threshold,
            left: Box::new(TreeNode::Leaf {
                probabilities: [0.9, 0.1],
            }),
            right: Box::new(TreeNode::Leaf {
                probabilities: [0.2, 0.8],
            }),
        }
    }

    #[test]
    fn test_standard_scaler() {
        let scaler = StandardScaler {
            mean: vec![1.0, 10.0, 5.0],
            scale: vec![2.0, 5.0, 0.0],
        };
        let scaled = scaler.transform(&[3.0, 0.0, 7.0]).unwrap();
        assert_eq!(scaled, vec![1.0, -2.0, 2.0]);
        assert!(scaler.transform(&[1.0]).is_err());
    }

    #[rstest]
    #[case(-1.0, 0, 0.9)]
    #[case(0.0, 0, 0.9)]
    #[case(1.0, 1, 0.8)]
    fn test_single_tree(#[case] x: f64, #[case] class: usize, #[case] p: f64) {
        let forest = RandomForest {
            trees: vec![stump(0.0)],
        };
        assert_eq!(forest.predict(&[x]).unwrap(), class);
        assert_relative_eq!(forest.predict_proba(&[x]).unwrap()[class], p);
    }

    #[test]
    fn test_forest_averages_trees() {
        let forest = RandomForest {
            trees: vec![stump(0.0), stump(2.0)],
        };
        // First tree goes right, second left
        let proba = forest.predict_proba(&[1.0]).unwrap();
        assert_relative_eq!(proba[0], 0.55, epsilon = 1e-12);
        assert_relative_eq!(proba[1], 0.45, epsilon = 1e-12);
        assert_eq!(forest.predict(&[1.0]).unwrap(), 0);
    }

    #[test]
    fn test_forest_feature_out_of_range() {
        let forest = RandomForest {
            trees: vec![stump(0.0)],
        };
        assert!(forest.predict(&[]).is_err());
    }

    #[test]
    fn test_logistic_regression() {
        let model = LogisticRegression {
            coefficients: vec![1.0, -1.0],
            intercept: 0.0,
        };
        let proba = model.predict_proba(&[2.0, 2.0]).unwrap();
        assert_relative_eq!(proba[1], 0.5);
        // A zero decision value is class 0
        assert_eq!(model.predict(&[2.0, 2.0]).unwrap(), 0);
        assert_eq!(model.predict(&[3.0, 0.0]).unwrap(), 1);
        assert_eq!(model.predict(&[0.0, 3.0]).unwrap(), 0);
        assert!(model.predict(&[1.0]).is_err());
    }

    #[test]
    fn test_bundle_from_json() {
        let json = r#"{
            "features": ["Current Ratio", "Net Margin"],
            "scaler": {"mean": [1.5, 8.0], "scale": [0.5, 4.0]},
            "classifier": {
                "type": "random_forest",
                "trees": [
                    {"feature": 1, "threshold": 0.0,
                     "left": {"probabilities": [0.7, 0.3]},
                     "right": {"probabilities": [0.1, 0.9]}}
                ]
            }
        }"#;
        let bundle = ModelBundle::from_json(json).unwrap();
        assert_eq!(bundle.features.len(), 2);

        let scaled = bundle.scaler.transform(&[2.0, 12.0]).unwrap();
        assert_eq!(bundle.classifier.predict(&scaled).unwrap(), 1);
    }

    #[rstest]
    #[case::scaler_width(
        r#"{"features": ["Revenue"], "scaler": {"mean": [0.0, 0.0], "scale": [1.0, 1.0]},
            "classifier": {"type": "logistic_regression", "coefficients": [1.0], "intercept": 0.0}}"#
    )]
    #[case::coefficients(
        r#"{"features": ["Revenue"], "scaler": {"mean": [0.0], "scale": [1.0]},
            "classifier": {"type": "logistic_regression", "coefficients": [1.0, 2.0], "intercept": 0.0}}"#
    )]
    #[case::tree_feature(
        r#"{"features": ["Revenue"], "scaler": {"mean": [0.0], "scale": [1.0]},
            "classifier": {"type": "random_forest", "trees": [
                {"feature": 3, "threshold": 0.0,
                 "left": {"probabilities": [1.0, 0.0]}, "right": {"probabilities": [0.0, 1.0]}}]}}"#
    )]
    #[case::unknown_feature(
        r#"{"features": ["EBITDA"], "scaler": {"mean": [0.0], "scale": [1.0]},
            "classifier": {"type": "logistic_regression", "coefficients": [1.0], "intercept": 0.0}}"#
    )]
    fn test_bundle_rejects_inconsistent_artifacts(#[case] json: &str) {
        assert!(ModelBundle::from_json(json).is_err());
    }
}
