use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::diagnosis::FitMetrics;
use crate::classifier::ConvergenceWarning;
use crate::corpus::Sentiment;

/// Rows are actual labels, columns predicted labels, both in [`Sentiment`] order.
pub type ConfusionMatrix = [[usize; 3]; 3];

/// Precision, recall and F1 of one class. Ratios with a zero denominator are 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of actual examples of the class
    pub support: usize,
}

/// Macro averages over the classes of a report
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    pub accuracy_gap: f64,
    pub precision_avg: f64,
    pub recall_avg: f64,
    pub f1_avg: f64,
}

/// Share of positions where `predicted` matches `actual`; 0 for empty input.
pub fn accuracy(actual: &[Sentiment], predicted: &[Sentiment]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let correct = actual.iter().zip(predicted).filter(|(a, p)| a == p).count();
    correct as f64 / actual.len() as f64
}

pub fn confusion_matrix(actual: &[Sentiment], predicted: &[Sentiment]) -> ConfusionMatrix {
    let mut matrix = [[0usize; 3]; 3];
    for (a, p) in actual.iter().zip(predicted) {
        matrix[a.index()][p.index()] += 1;
    }
    matrix
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

pub fn class_metrics(matrix: &ConfusionMatrix, class: Sentiment) -> ClassMetrics {
    let c = class.index();
    let true_positives = matrix[c][c];
    let support: usize = matrix[c].iter().sum();
    let predicted: usize = matrix.iter().map(|row| row[c]).sum();

    let precision = ratio(true_positives, predicted);
    let recall = ratio(true_positives, support);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };
    ClassMetrics {
        precision,
        recall,
        f1,
        support,
    }
}

/// Quality of a trained model on its train and test splits.
///
/// Per-class metrics and the confusion matrix describe the test split.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    /// `train_accuracy - test_accuracy`; negative when test scores higher
    pub accuracy_gap: f64,
    pub per_class: BTreeMap<Sentiment, ClassMetrics>,
    pub confusion_matrix: ConfusionMatrix,
    pub train_size: usize,
    pub test_size: usize,
    pub test_labels: Vec<Sentiment>,
    pub test_predictions: Vec<Sentiment>,
    /// Set when the solver stopped at its iteration cap
    pub convergence: Option<ConvergenceWarning>,
}

impl EvaluationReport {
    /// Builds the report from predictions on both splits. `classes` are the
    /// labels that get a `per_class` entry.
    pub fn new(
        classes: &[Sentiment],
        train_labels: &[Sentiment],
        train_predictions: &[Sentiment],
        test_labels: Vec<Sentiment>,
        test_predictions: Vec<Sentiment>,
        convergence: Option<ConvergenceWarning>,
    ) -> Self {
        let train_accuracy = accuracy(train_labels, train_predictions);
        let test_accuracy = accuracy(&test_labels, &test_predictions);
        let matrix = confusion_matrix(&test_labels, &test_predictions);
        let per_class = classes
            .iter()
            .map(|&class| (class, class_metrics(&matrix, class)))
            .collect();

        Self {
            train_accuracy,
            test_accuracy,
            accuracy_gap: train_accuracy - test_accuracy,
            per_class,
            confusion_matrix: matrix,
            train_size: train_labels.len(),
            test_size: test_labels.len(),
            test_labels,
            test_predictions,
            convergence,
        }
    }

    pub fn converged(&self) -> bool {
        self.convergence.is_none()
    }

    /// The two numbers the fit diagnosis needs
    pub fn fit_metrics(&self) -> FitMetrics {
        FitMetrics {
            train_accuracy: self.train_accuracy,
            test_accuracy: self.test_accuracy,
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        let n = self.per_class.len();
        let average = |f: fn(&ClassMetrics) -> f64| {
            if n == 0 {
                0.0
            } else {
                self.per_class.values().map(f).sum::<f64>() / n as f64
            }
        };
        MetricsSummary {
            train_accuracy: self.train_accuracy,
            test_accuracy: self.test_accuracy,
            accuracy_gap: self.accuracy_gap,
            precision_avg: average(|m| m.precision),
            recall_avg: average(|m| m.recall),
            f1_avg: average(|m| m.f1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Sentiment::*;

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[Positive, Negative], &[Positive, Neutral]), 0.5);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    fn test_confusion_matrix_layout() {
        let actual = [Negative, Negative, Neutral, Positive];
        let predicted = [Negative, Positive, Neutral, Positive];
        let matrix = confusion_matrix(&actual, &predicted);
        assert_eq!(matrix, [[1, 0, 1], [0, 1, 0], [0, 0, 1]]);
    }

    #[test]
    fn test_class_metrics() {
        let matrix = confusion_matrix(&[Negative, Negative, Positive, Positive], &[Negative, Positive, Positive, Positive]);
        let positive = class_metrics(&matrix, Positive);
        assert!((positive.precision - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(positive.recall, 1.0);
        assert!((positive.f1 - 0.8).abs() < 1e-12);
        assert_eq!(positive.support, 2);

        let neutral = class_metrics(&matrix, Neutral);
        assert_eq!(neutral, ClassMetrics { precision: 0.0, recall: 0.0, f1: 0.0, support: 0 });
    }

    #[test]
    fn test_report() {
        let report = EvaluationReport::new(
            &[Negative, Positive],
            &[Negative, Positive, Positive, Negative],
            &[Negative, Positive, Positive, Negative],
            vec![Negative, Positive],
            vec![Positive, Positive],
            None,
        );
        assert_eq!(report.train_accuracy, 1.0);
        assert_eq!(report.test_accuracy, 0.5);
        assert_eq!(report.accuracy_gap, 0.5);
        assert_eq!(report.per_class.len(), 2);
        assert_eq!(report.train_size, 4);
        assert_eq!(report.test_size, 2);
        assert!(report.converged());

        let summary = report.summary();
        assert_eq!(summary.recall_avg, 0.5);
        assert!((summary.precision_avg - 0.25).abs() < 1e-12);
        assert_eq!(report.fit_metrics().test_accuracy, 0.5);
    }
}
