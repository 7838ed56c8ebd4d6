use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::classifier::{ClassifierError, SolverParams};

/// Tunables for vectorization, training, evaluation and diagnosis.
///
/// Every field has a default, so a partial JSON document is a valid config:
///
/// ```rust
/// use review_sentiment::PipelineConfig;
///
/// let config = PipelineConfig::from_json_str(r#"{"max_features": 2000, "random_seed": 7}"#).unwrap();
/// assert_eq!(config.max_features, 2000);
/// assert_eq!(config.test_fraction, 0.2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum vocabulary size
    pub max_features: usize,
    /// Inclusive range of n-gram sizes
    pub ngram_range: (usize, usize),
    /// Share of each class held out for testing
    pub test_fraction: f64,
    /// Seed for the train/test split and cross-validation folds
    pub random_seed: u64,
    pub overfitting_gap_threshold: f64,
    pub underfitting_accuracy_threshold: f64,
    /// Largest tolerated spread between the best and worst per-class F1
    pub class_balance_threshold: f64,
    pub max_training_iterations: usize,
    /// Inverse L2 regularization strength
    pub regularization: f64,
    /// Gradient max-norm at which the solver stops
    pub tolerance: f64,
    pub cv_folds: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_features: 5000,
            ngram_range: (1, 2),
            test_fraction: 0.2,
            random_seed: 42,
            overfitting_gap_threshold: 0.15,
            underfitting_accuracy_threshold: 0.70,
            class_balance_threshold: 0.20,
            max_training_iterations: 1000,
            regularization: 1.0,
            tolerance: 1e-4,
            cv_folds: 5,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ClassifierError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ClassifierError::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| ClassifierError::config(format!("Failed to read config {}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_ngram_range(mut self, min_n: usize, max_n: usize) -> Self {
        self.ngram_range = (min_n, max_n);
        self
    }

    pub fn with_test_fraction(mut self, test_fraction: f64) -> Self {
        self.test_fraction = test_fraction;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_training_iterations = max_iterations;
        self
    }

    pub fn with_regularization(mut self, c: f64) -> Self {
        self.regularization = c;
        self
    }

    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    /// Solver settings taken from this config
    pub fn solver_params(&self) -> SolverParams {
        SolverParams {
            regularization: self.regularization,
            max_iterations: self.max_training_iterations,
            tolerance: self.tolerance,
        }
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    /// - `ConfigError` describing the first out-of-range field
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.max_features == 0 {
            return Err(ClassifierError::config("max_features must be at least 1"));
        }
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ClassifierError::config(format!(
                "ngram_range ({}, {}) must satisfy 1 <= min <= max",
                min_n, max_n
            )));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(ClassifierError::config(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.max_training_iterations == 0 {
            return Err(ClassifierError::config("max_training_iterations must be at least 1"));
        }
        if !(self.regularization.is_finite() && self.regularization > 0.0) {
            return Err(ClassifierError::config(format!(
                "regularization must be a positive number, got {}",
                self.regularization
            )));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(ClassifierError::config(format!(
                "tolerance must be a positive number, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_features, 5000);
        assert_eq!(config.ngram_range, (1, 2));
        assert_eq!(config.test_fraction, 0.2);
        assert_eq!(config.random_seed, 42);
        assert_eq!(config.overfitting_gap_threshold, 0.15);
        assert_eq!(config.underfitting_accuracy_threshold, 0.70);
        assert_eq!(config.max_training_iterations, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_values() {
        let cases = [
            PipelineConfig::default().with_test_fraction(0.0),
            PipelineConfig::default().with_test_fraction(1.0),
            PipelineConfig::default().with_test_fraction(f64::NAN),
            PipelineConfig::default().with_ngram_range(2, 1),
            PipelineConfig::default().with_ngram_range(0, 2),
            PipelineConfig::default().with_max_features(0),
            PipelineConfig::default().with_max_iterations(0),
            PipelineConfig::default().with_regularization(-1.0),
        ];
        for config in cases {
            assert!(matches!(config.validate(), Err(ClassifierError::ConfigError(_))), "{:?}", config);
        }
    }

    #[test]
    fn test_json_partial_and_invalid() {
        let config = PipelineConfig::from_json_str(r#"{"ngram_range": [1, 3]}"#).unwrap();
        assert_eq!(config.ngram_range, (1, 3));
        assert_eq!(config.max_features, 5000);

        assert!(matches!(
            PipelineConfig::from_json_str(r#"{"test_fraction": 1.5}"#),
            Err(ClassifierError::ConfigError(_))
        ));
        assert!(matches!(
            PipelineConfig::from_json_str("not json"),
            Err(ClassifierError::ConfigError(_))
        ));
    }
}
