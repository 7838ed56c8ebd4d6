use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::metrics::ClassMetrics;
use crate::config::PipelineConfig;
use crate::corpus::Sentiment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FitStatus {
    Overfitting,
    Underfitting,
    GoodFit,
}

impl FitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FitStatus::Overfitting => "OVERFITTING",
            FitStatus::Underfitting => "UNDERFITTING",
            FitStatus::GoodFit => "GOOD_FIT",
        }
    }

    /// Suggested remedies for this status
    pub fn recommendations(&self) -> Vec<String> {
        let items: &[&str] = match self {
            FitStatus::Overfitting => &[
                "Increase regularization: use a smaller C (e.g. 0.1)",
                "Reduce max_features (e.g. 2000 instead of 5000)",
                "Collect more training data",
                "Use cross-validation to confirm the gap",
                "Apply feature selection to remove noisy n-grams",
            ],
            FitStatus::Underfitting => &[
                "Increase max_features (e.g. 10000 instead of 5000)",
                "Add trigrams: ngram_range = (1, 3)",
                "Reduce regularization: use a larger C (e.g. 10.0)",
                "Train longer: increase max_training_iterations",
                "Add richer features such as sentiment lexicons",
            ],
            FitStatus::GoodFit => &[
                "Training and test accuracies are close",
                "Continue monitoring with new data",
            ],
        };
        items.iter().map(|s| s.to_string()).collect()
    }
}

impl fmt::Display for FitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accuracies the fit decision is made from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitMetrics {
    pub train_accuracy: f64,
    pub test_accuracy: f64,
}

impl FitMetrics {
    pub fn gap(&self) -> f64 {
        self.train_accuracy - self.test_accuracy
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticThresholds {
    /// Gap above which the model is overfitting
    pub overfitting_gap: f64,
    /// Test accuracy below which the model is underfitting
    pub underfitting_accuracy: f64,
    /// F1 range above which per-class performance is unbalanced
    pub class_balance: f64,
}

impl Default for DiagnosticThresholds {
    fn default() -> Self {
        Self {
            overfitting_gap: 0.15,
            underfitting_accuracy: 0.70,
            class_balance: 0.20,
        }
    }
}

impl From<&PipelineConfig> for DiagnosticThresholds {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            overfitting_gap: config.overfitting_gap_threshold,
            underfitting_accuracy: config.underfitting_accuracy_threshold,
            class_balance: config.class_balance_threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitDiagnosis {
    pub status: FitStatus,
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    pub gap: f64,
    pub explanation: String,
    pub recommendations: Vec<String>,
}

/// Classifies the fit of a model from its accuracies.
///
/// Rules, first match wins:
/// 1. gap above `overfitting_gap`: [`FitStatus::Overfitting`]
/// 2. test accuracy below `underfitting_accuracy`, or not a finite number:
///    [`FitStatus::Underfitting`]
/// 3. otherwise [`FitStatus::GoodFit`]
///
/// ```
/// use review_sentiment::{diagnose, DiagnosticThresholds, FitMetrics, FitStatus};
///
/// let metrics = FitMetrics { train_accuracy: 0.95, test_accuracy: 0.65 };
/// let diagnosis = diagnose(&metrics, &DiagnosticThresholds::default());
/// assert_eq!(diagnosis.status, FitStatus::Overfitting);
/// ```
pub fn diagnose(metrics: &FitMetrics, thresholds: &DiagnosticThresholds) -> FitDiagnosis {
    let gap = metrics.gap();
    let test = metrics.test_accuracy;

    let (status, explanation) = if gap > thresholds.overfitting_gap {
        (
            FitStatus::Overfitting,
            format!(
                "Train accuracy exceeds test accuracy by {:.3}, above the {:.2} threshold: the model memorizes the training split",
                gap, thresholds.overfitting_gap
            ),
        )
    } else if !test.is_finite() || test < thresholds.underfitting_accuracy {
        (
            FitStatus::Underfitting,
            format!(
                "Test accuracy {:.3} is below the {:.2} threshold: the model is too simple for the data",
                test, thresholds.underfitting_accuracy
            ),
        )
    } else {
        (
            FitStatus::GoodFit,
            format!(
                "Test accuracy {:.3} with a gap of {:.3}: the model generalizes to unseen reviews",
                test, gap
            ),
        )
    };

    FitDiagnosis {
        status,
        train_accuracy: metrics.train_accuracy,
        test_accuracy: test,
        gap,
        explanation,
        recommendations: status.recommendations(),
    }
}

/// Spread of per-class F1 scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassBalance {
    /// Population variance
    pub f1_variance: f64,
    /// Best minus worst F1
    pub f1_range: f64,
    pub balanced: bool,
}

/// Flags uneven per-class performance: unbalanced when the F1 range exceeds
/// `threshold`. An empty map is balanced with zero spread.
pub fn per_class_balance(per_class: &BTreeMap<Sentiment, ClassMetrics>, threshold: f64) -> ClassBalance {
    let scores: Vec<f64> = per_class.values().map(|m| m.f1).collect();
    if scores.is_empty() {
        return ClassBalance {
            f1_variance: 0.0,
            f1_range: 0.0,
            balanced: true,
        };
    }

    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;
    let f1_variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min = scores.iter().cloned().fold(f64::INFINITY, f64::min);
    let f1_range = max - min;

    ClassBalance {
        f1_variance,
        f1_range,
        balanced: scores.iter().all(|s| s.is_finite()) && f1_range <= threshold,
    }
}
