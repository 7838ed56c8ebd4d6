use log::info;
use serde::Serialize;

use super::metrics::accuracy;
use super::split::stratified_k_fold;
use crate::classifier::ClassifierError;
use crate::config::PipelineConfig;
use crate::corpus::Corpus;
use crate::training;

/// Fold standard deviation above which scores are considered unstable
pub const HIGH_VARIANCE_STD: f64 = 0.1;

/// Test accuracy of every fold plus summary statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossValidationReport {
    pub fold_scores: Vec<f64>,
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub high_variance: bool,
    pub low_score: bool,
}

impl CrossValidationReport {
    pub fn from_scores(fold_scores: Vec<f64>, underfitting_threshold: f64) -> Self {
        let n = fold_scores.len().max(1) as f64;
        let mean = fold_scores.iter().sum::<f64>() / n;
        let std = (fold_scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n).sqrt();
        let min = fold_scores.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = fold_scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        Self {
            high_variance: std > HIGH_VARIANCE_STD,
            low_score: mean < underfitting_threshold,
            fold_scores,
            mean,
            std,
            min,
            max,
        }
    }

    /// One line on stability, one on performance
    pub fn interpretation(&self) -> Vec<String> {
        vec![
            if self.high_variance {
                "High variance across folds: possible overfitting".to_string()
            } else {
                "Low variance across folds: model is stable".to_string()
            },
            if self.low_score {
                "Low average score: possible underfitting".to_string()
            } else {
                "Good average performance".to_string()
            },
        ]
    }
}

/// Stratified k-fold estimate of test accuracy.
///
/// Every fold fits its own vectorizer and classifier on the remaining folds.
///
/// # Errors
/// - `ConfigError` for an invalid configuration or `cv_folds < 2`
/// - `InsufficientDataError` if a class has fewer members than `cv_folds`
pub fn cross_validate(corpus: &Corpus, config: &PipelineConfig) -> Result<CrossValidationReport, ClassifierError> {
    config.validate()?;
    let folds = stratified_k_fold(&corpus.labels(), config.cv_folds, config.random_seed)?;

    let mut scores = Vec::with_capacity(folds.len());
    for (i, fold) in folds.iter().enumerate() {
        let classifier = training::fit_classifier(corpus, &fold.train, config)?;
        let predictions = training::predict_rows(&classifier, corpus, &fold.test)?;
        let score = accuracy(&corpus.labels_at(&fold.test), &predictions);
        info!("Fold {}/{}: accuracy {:.4}", i + 1, folds.len(), score);
        scores.push(score);
    }

    let report = CrossValidationReport::from_scores(scores, config.underfitting_accuracy_threshold);
    info!(
        "Cross-validation: mean {:.4}, std {:.4} over {} folds",
        report.mean,
        report.std,
        report.fold_scores.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_scores() {
        let report = CrossValidationReport::from_scores(vec![0.8, 0.9, 1.0], 0.70);
        assert!((report.mean - 0.9).abs() < 1e-12);
        assert!((report.std - (0.02f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(report.min, 0.8);
        assert_eq!(report.max, 1.0);
        assert!(!report.high_variance);
        assert!(!report.low_score);
    }

    #[test]
    fn test_flags() {
        let report = CrossValidationReport::from_scores(vec![0.3, 0.9], 0.70);
        assert!(report.high_variance);
        assert!(report.low_score);
        assert_eq!(report.interpretation().len(), 2);
    }
}
