use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::classifier::ClassifierError;
use crate::text::TextNormalizer;

/// The fixed sentiment label set.
///
/// Variants are declared in lexicographic order of their names, so the derived
/// `Ord` is also the class ordering of a trained model and of the confusion
/// matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Negative,
    Neutral,
    Positive,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Negative, Sentiment::Neutral, Sentiment::Positive];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
            Sentiment::Positive => "positive",
        }
    }

    /// Position in [`Sentiment::ALL`]
    pub fn index(&self) -> usize {
        match self {
            Sentiment::Negative => 0,
            Sentiment::Neutral => 1,
            Sentiment::Positive => 2,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = ClassifierError;

    /// Accepts the three label names, trimmed and ASCII case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        Sentiment::ALL
            .into_iter()
            .find(|sentiment| sentiment.as_str().eq_ignore_ascii_case(label))
            .ok_or_else(|| {
                ClassifierError::schema(format!(
                    "unknown sentiment label '{}' (expected one of: negative, neutral, positive)",
                    label
                ))
            })
    }
}

/// A labeled review as supplied by the data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub text: String,
    pub sentiment: Sentiment,
}

impl Review {
    pub fn new(text: impl Into<String>, sentiment: Sentiment) -> Self {
        Self {
            text: text.into(),
            sentiment,
        }
    }
}

/// An untyped input row. Either field may be absent; conversion into a
/// [`Review`] checks both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawReview {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
}

impl RawReview {
    pub fn new(text: impl Into<String>, sentiment: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            sentiment: Some(sentiment.into()),
        }
    }

    /// Validates the row. `row` is only used in error messages.
    pub fn into_review(self, row: usize) -> Result<Review, ClassifierError> {
        let text = self
            .text
            .ok_or_else(|| ClassifierError::schema(format!("row {}: missing required field 'text'", row)))?;
        let label = self
            .sentiment
            .ok_or_else(|| ClassifierError::schema(format!("row {}: missing required field 'sentiment'", row)))?;
        let sentiment = label
            .parse::<Sentiment>()
            .map_err(|e| ClassifierError::schema(format!("row {}: {}", row, e)))?;
        Ok(Review::new(text, sentiment))
    }
}

/// A review together with its normalized text and surface statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanedReview {
    review: Review,
    cleaned_text: String,
    word_count: usize,
    char_count: usize,
}

impl CleanedReview {
    pub fn new(review: Review, normalizer: &TextNormalizer) -> Self {
        let cleaned_text = normalizer.normalize(&review.text);
        let features = TextNormalizer::document_features(&review.text);
        Self {
            review,
            cleaned_text,
            word_count: features.word_count,
            char_count: features.char_count,
        }
    }

    pub fn text(&self) -> &str {
        &self.review.text
    }

    pub fn sentiment(&self) -> Sentiment {
        self.review.sentiment
    }

    pub fn cleaned_text(&self) -> &str {
        &self.cleaned_text
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn char_count(&self) -> usize {
        self.char_count
    }

    pub fn review(&self) -> &Review {
        &self.review
    }
}

/// An ordered collection of cleaned reviews plus the normalizer that cleaned
/// them. A model trained on the corpus keeps the same normalizer so inference
/// text is cleaned exactly like training text.
#[derive(Debug, Clone)]
pub struct Corpus {
    reviews: Vec<CleanedReview>,
    normalizer: TextNormalizer,
}

impl Corpus {
    /// Cleans `reviews` with the default [`TextNormalizer`]
    pub fn from_reviews(reviews: impl IntoIterator<Item = Review>) -> Self {
        Self::with_normalizer(reviews, TextNormalizer::new())
    }

    pub fn with_normalizer(reviews: impl IntoIterator<Item = Review>, normalizer: TextNormalizer) -> Self {
        let reviews: Vec<CleanedReview> = reviews
            .into_iter()
            .map(|review| CleanedReview::new(review, &normalizer))
            .collect();
        debug!("Cleaned corpus of {} reviews", reviews.len());
        Self { reviews, normalizer }
    }

    /// Validates untyped rows and cleans them. Fails on the first bad row
    /// without producing a partial corpus.
    ///
    /// # Errors
    /// - `SchemaError` if a row lacks `text` or `sentiment`, or the label is
    ///   not one of the three sentiments
    pub fn from_records(records: impl IntoIterator<Item = RawReview>) -> Result<Self, ClassifierError> {
        let reviews = records
            .into_iter()
            .enumerate()
            .map(|(row, record)| record.into_review(row))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_reviews(reviews))
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    pub fn reviews(&self) -> &[CleanedReview] {
        &self.reviews
    }

    pub fn iter(&self) -> impl Iterator<Item = &CleanedReview> {
        self.reviews.iter()
    }

    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    pub fn labels(&self) -> Vec<Sentiment> {
        self.reviews.iter().map(CleanedReview::sentiment).collect()
    }

    /// Number of reviews per label, only for labels that occur
    pub fn class_counts(&self) -> BTreeMap<Sentiment, usize> {
        let mut counts = BTreeMap::new();
        for review in &self.reviews {
            *counts.entry(review.sentiment()).or_insert(0) += 1;
        }
        counts
    }

    pub(crate) fn cleaned_texts(&self, indices: &[usize]) -> Vec<&str> {
        indices.iter().map(|&i| self.reviews[i].cleaned_text()).collect()
    }

    pub(crate) fn labels_at(&self, indices: &[usize]) -> Vec<Sentiment> {
        indices.iter().map(|&i| self.reviews[i].sentiment()).collect()
    }
}
