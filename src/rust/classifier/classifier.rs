use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;
use serde::Serialize;

use super::error::ClassifierError;
use super::logistic::LogisticRegression;
use super::vectorizer::TfidfVectorizer;
use super::ModelInfo;
use crate::corpus::Sentiment;
use crate::text::TextNormalizer;

/// Outcome of classifying one text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub label: Sentiment,
    /// One entry per trained class, summing to 1
    pub probabilities: BTreeMap<Sentiment, f64>,
    /// Probability of `label`
    pub confidence: f64,
    /// Number of vocabulary n-grams found in the input. Zero means the
    /// prediction comes from the intercepts alone.
    pub known_features: usize,
}

/// A trained, read-only sentiment classifier.
///
/// # Thread Safety
///
/// The fitted vectorizer and model sit behind `Arc`, so clones are cheap and
/// share state. The type is `Send + Sync`; wrap it in an `Arc` to predict from
/// several threads:
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use review_sentiment::{Review, Sentiment, SentimentClassifier};
/// use std::sync::Arc;
/// use std::thread;
///
/// let mut builder = SentimentClassifier::builder().with_seed(7);
/// for _ in 0..5 {
///     builder = builder
///         .add_review(Review::new("Love this dress, perfect fit!", Sentiment::Positive))
///         .add_review(Review::new("Terrible quality, fell apart", Sentiment::Negative))
///         .add_review(Review::new("It's okay, nothing special", Sentiment::Neutral));
/// }
/// let (classifier, _report) = builder.build()?;
/// let classifier = Arc::new(classifier);
///
/// let handle = {
///     let classifier = Arc::clone(&classifier);
///     thread::spawn(move || classifier.predict("perfect fit").map(|p| p.label))
/// };
/// assert_eq!(handle.join().unwrap()?, Sentiment::Positive);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SentimentClassifier {
    normalizer: TextNormalizer,
    vectorizer: Arc<TfidfVectorizer>,
    model: Arc<LogisticRegression>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<SentimentClassifier>();
    }
};

impl SentimentClassifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Wraps fitted components.
    ///
    /// # Errors
    /// - `NotFittedError` if either component has not been fitted
    /// - `ValidationError` if the model and vocabulary disagree on dimension
    pub(crate) fn from_parts(
        normalizer: TextNormalizer,
        vectorizer: TfidfVectorizer,
        model: LogisticRegression,
    ) -> Result<Self, ClassifierError> {
        let vocabulary_size = vectorizer.vocabulary()?.len();
        let n_features = model.coefficients()?.ncols();
        if vocabulary_size != n_features {
            return Err(ClassifierError::validation(format!(
                "model expects {} features but the vocabulary has {}",
                n_features, vocabulary_size
            )));
        }
        Ok(Self {
            normalizer,
            vectorizer: Arc::new(vectorizer),
            model: Arc::new(model),
        })
    }

    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn model(&self) -> &LogisticRegression {
        &self.model
    }

    /// Trained labels in model order
    pub fn classes(&self) -> &[Sentiment] {
        self.model.classes().unwrap_or(&[])
    }

    /// Returns information about the trained classifier
    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            class_labels: self.classes().to_vec(),
            vocabulary_size: self.vectorizer.vocabulary().map(|v| v.len()).unwrap_or(0),
            ngram_range: self.vectorizer.ngram_range(),
            max_features: self.vectorizer.max_features(),
            iterations: self.model.iterations().unwrap_or(0),
            converged: self.model.convergence_warning().is_none(),
        }
    }

    /// Classifies raw review text.
    ///
    /// The text is cleaned with the same normalizer as the training corpus.
    /// Text that cleans to nothing, or whose n-grams are all unknown, is scored
    /// from the zero vector and reported with `known_features == 0`.
    ///
    /// # Errors
    /// - `SchemaError` if `text` is empty or whitespace only
    ///
    /// # Example
    /// ```rust
    /// # use review_sentiment::{Review, Sentiment, SentimentClassifier};
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// # let mut builder = SentimentClassifier::builder();
    /// # for _ in 0..5 {
    /// #     builder = builder
    /// #         .add_review(Review::new("great lovely dress", Sentiment::Positive))
    /// #         .add_review(Review::new("awful torn seams", Sentiment::Negative))
    /// #         .add_review(Review::new("average plain shirt", Sentiment::Neutral));
    /// # }
    /// # let (classifier, _) = builder.build()?;
    /// let prediction = classifier.predict("What a lovely dress")?;
    /// println!("{} ({:.2})", prediction.label, prediction.confidence);
    /// for (label, p) in &prediction.probabilities {
    ///     println!("{}: {:.3}", label, p);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn predict(&self, text: &str) -> Result<PredictionResult, ClassifierError> {
        if text.trim().is_empty() {
            return Err(ClassifierError::schema("Input text cannot be empty"));
        }
        let cleaned = self.normalizer.normalize(text);
        self.predict_cleaned(&cleaned)
    }

    pub fn predict_proba(&self, text: &str) -> Result<BTreeMap<Sentiment, f64>, ClassifierError> {
        self.predict(text).map(|prediction| prediction.probabilities)
    }

    pub fn predict_batch<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<PredictionResult>, ClassifierError> {
        texts.iter().map(|text| self.predict(text.as_ref())).collect()
    }

    /// Scores text that has already been through the normalizer.
    pub(crate) fn predict_cleaned(&self, cleaned: &str) -> Result<PredictionResult, ClassifierError> {
        let features = self.vectorizer.transform_one(cleaned)?;
        let probabilities = self.model.predict_proba(&features)?;
        let label = self.model.predict(&features)?;
        let confidence = probabilities.get(&label).copied().unwrap_or(0.0);
        if features.is_zero() {
            debug!("No known n-grams in '{}'; using intercepts only", cleaned);
        }
        Ok(PredictionResult {
            label,
            probabilities,
            confidence,
            known_features: features.nnz(),
        })
    }

    /// The `top_n` n-grams with the largest coefficients for `class`,
    /// descending.
    ///
    /// # Errors
    /// - `ValidationError` if the model was not trained on `class`
    pub fn feature_importance(&self, class: Sentiment, top_n: usize) -> Result<Vec<(String, f64)>, ClassifierError> {
        self.model
            .top_coefficients(class, top_n)?
            .into_iter()
            .map(|(index, weight)| Ok((self.vectorizer.feature_name(index)?.to_string(), weight)))
            .collect()
    }
}
