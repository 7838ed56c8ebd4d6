use log::info;

use super::classifier::SentimentClassifier;
use super::error::ClassifierError;
use crate::config::PipelineConfig;
use crate::corpus::{Corpus, RawReview, Review};
use crate::evaluation::EvaluationReport;
use crate::text::TextNormalizer;
use crate::training;

/// A builder for training a [`SentimentClassifier`] with a fluent interface.
///
/// ```
/// use review_sentiment::{ClassifierBuilder, Review, Sentiment};
///
/// let builder = ClassifierBuilder::new()
///     .with_test_fraction(0.25)
///     .with_seed(7)
///     .add_review(Review::new("Fits perfectly", Sentiment::Positive));
/// assert_eq!(builder.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClassifierBuilder {
    config: PipelineConfig,
    reviews: Vec<Review>,
    normalizer: Option<TextNormalizer>,
}

impl ClassifierBuilder {
    /// Creates an empty builder with the default [`PipelineConfig`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_test_fraction(mut self, test_fraction: f64) -> Self {
        self.config.test_fraction = test_fraction;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.random_seed = seed;
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.config.max_features = max_features;
        self
    }

    /// Uses a custom normalizer, e.g. one with a different lemmatizer
    pub fn with_normalizer(mut self, normalizer: TextNormalizer) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    pub fn add_review(mut self, review: Review) -> Self {
        self.reviews.push(review);
        self
    }

    pub fn add_reviews(mut self, reviews: impl IntoIterator<Item = Review>) -> Self {
        self.reviews.extend(reviews);
        self
    }

    /// Adds a review from an untyped label.
    ///
    /// # Errors
    /// - `SchemaError` if `label` is not one of the three sentiments
    pub fn add_record(self, text: impl Into<String>, label: &str) -> Result<Self, ClassifierError> {
        let row = self.reviews.len();
        let review = RawReview::new(text, label).into_review(row)?;
        Ok(self.add_review(review))
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Cleans the collected reviews, trains and evaluates.
    ///
    /// # Errors
    /// - `ConfigError` for an invalid configuration
    /// - `InsufficientDataError` if the reviews cannot be stratified
    pub fn build(self) -> Result<(SentimentClassifier, EvaluationReport), ClassifierError> {
        let normalizer = self.normalizer.unwrap_or_default();
        info!("Building classifier from {} reviews", self.reviews.len());
        let corpus = Corpus::with_normalizer(self.reviews, normalizer);
        training::train(&corpus, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Sentiment;

    #[test]
    fn test_add_record_validates_label() {
        let builder = ClassifierBuilder::new().add_record("Nice", "positive").unwrap();
        assert_eq!(builder.len(), 1);

        let err = builder.add_record("Hmm", "meh").unwrap_err();
        assert!(matches!(err, ClassifierError::SchemaError(msg) if msg.starts_with("row 1:")));
    }

    #[test]
    fn test_build_with_invalid_config() {
        let result = ClassifierBuilder::new()
            .with_test_fraction(1.5)
            .add_review(Review::new("good", Sentiment::Positive))
            .build();
        assert!(matches!(result, Err(ClassifierError::ConfigError(_))));
    }

    #[test]
    fn test_build_with_empty_corpus() {
        assert!(ClassifierBuilder::new().is_empty());
        assert!(matches!(
            ClassifierBuilder::new().build(),
            Err(ClassifierError::InsufficientDataError(_))
        ));
    }
}
