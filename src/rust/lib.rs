//! Sentiment classification for product reviews with TF-IDF features,
//! class-balanced logistic regression and fit diagnostics.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use review_sentiment::{diagnose, DiagnosticThresholds, Review, Sentiment, SentimentClassifier};
//!
//! let mut builder = SentimentClassifier::builder().with_test_fraction(0.2).with_seed(42);
//! for _ in 0..10 {
//!     builder = builder
//!         .add_review(Review::new("Love this dress, perfect fit!", Sentiment::Positive))
//!         .add_review(Review::new("Terrible quality, fell apart", Sentiment::Negative))
//!         .add_review(Review::new("It's okay, nothing special", Sentiment::Neutral));
//! }
//! let (classifier, report) = builder.build()?;
//!
//! let prediction = classifier.predict("I absolutely love this dress")?;
//! assert_eq!(prediction.label, Sentiment::Positive);
//!
//! let diagnosis = diagnose(&report.fit_metrics(), &DiagnosticThresholds::default());
//! println!("{}: {}", diagnosis.status, diagnosis.explanation);
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! A trained [`SentimentClassifier`] is immutable and `Send + Sync`. Share it
//! with `Arc`; retraining produces a new instance instead of mutating one that
//! may be in use.

pub mod classifier;
pub mod config;
pub mod corpus;
pub mod evaluation;
pub mod text;
mod training;

pub use classifier::{
    ClassifierBuilder, ClassifierError, ConvergenceWarning, FeatureVector, LogisticRegression, ModelInfo,
    PredictionResult, SentimentClassifier, SolverParams, TfidfVectorizer, Vocabulary,
};
pub use config::PipelineConfig;
pub use corpus::{CleanedReview, Corpus, RawReview, Review, Sentiment};
pub use evaluation::{
    cross_validate, diagnose, per_class_balance, stratified_split, ClassBalance, ClassMetrics,
    CrossValidationReport, DiagnosticThresholds, EvaluationReport, FitDiagnosis, FitMetrics, FitStatus,
    MetricsSummary, Split,
};
pub use text::{word_frequency, DocumentFeatures, Lemmatizer, RuleLemmatizer, TextNormalizer};
pub use training::train;

pub fn init_logger() {
    env_logger::init();
}
