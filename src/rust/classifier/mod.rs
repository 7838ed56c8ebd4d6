use serde::Serialize;

use crate::corpus::Sentiment;

mod error;
mod utils;
pub mod vectorizer;
pub mod logistic;
mod classifier;
pub mod builder;

pub use error::ClassifierError;
pub use vectorizer::{FeatureVector, TfidfVectorizer, Vocabulary};
pub use logistic::{ConvergenceWarning, LogisticRegression, SolverParams};
pub use classifier::{PredictionResult, SentimentClassifier};
pub use builder::ClassifierBuilder;

/// Information about a trained classifier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    /// Labels the model was trained on, in model order
    pub class_labels: Vec<Sentiment>,
    /// Number of n-grams in the fitted vocabulary
    pub vocabulary_size: usize,
    pub ngram_range: (usize, usize),
    pub max_features: usize,
    /// Solver steps taken during training
    pub iterations: usize,
    /// False when training stopped at the iteration cap
    pub converged: bool,
}
