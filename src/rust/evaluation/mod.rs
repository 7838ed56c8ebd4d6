//! Splitting, metrics, fit diagnosis and cross-validation.

pub mod split;
pub mod metrics;
pub mod diagnosis;
pub mod cross_validation;

pub use split::{stratified_k_fold, stratified_split, Split};
pub use metrics::{accuracy, class_metrics, confusion_matrix, ClassMetrics, ConfusionMatrix, EvaluationReport, MetricsSummary};
pub use diagnosis::{diagnose, per_class_balance, ClassBalance, DiagnosticThresholds, FitDiagnosis, FitMetrics, FitStatus};
pub use cross_validation::{cross_validate, CrossValidationReport};
