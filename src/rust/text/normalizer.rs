use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use super::lemmatizer::{Lemmatizer, RuleLemmatizer};
use super::stopwords::is_stopword;

/// Surface statistics of a review, computed on the original (uncleaned) text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFeatures {
    /// Number of whitespace-separated tokens
    pub word_count: usize,
    /// Number of Unicode scalar values
    pub char_count: usize,
}

/// Deterministic cleaning of raw review text into a canonical token sequence.
///
/// The pipeline is: lowercase, drop everything that is not `a-z` or
/// whitespace, split on word boundaries, remove English stopwords, lemmatize,
/// and join with single spaces. Cleaning is a fixed point:
/// `normalize(normalize(x)) == normalize(x)`.
///
/// The lemmatizer is shared behind an `Arc`, so cloning a normalizer is cheap
/// and every clone cleans text identically.
///
/// ```rust
/// use review_sentiment::TextNormalizer;
///
/// let normalizer = TextNormalizer::new();
/// assert_eq!(normalizer.normalize("Love this dress, perfect fit!"), "love dress perfect fit");
/// assert_eq!(normalizer.normalize("!!! 123"), "");
/// ```
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    lemmatizer: Arc<dyn Lemmatizer>,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextNormalizer {
    /// Creates a normalizer using the built-in [`RuleLemmatizer`]
    pub fn new() -> Self {
        Self::with_lemmatizer(RuleLemmatizer::new())
    }

    /// Creates a normalizer with a custom lemmatization step
    pub fn with_lemmatizer(lemmatizer: impl Lemmatizer + 'static) -> Self {
        Self {
            lemmatizer: Arc::new(lemmatizer),
        }
    }

    /// Cleans `text` into space-separated lemmas. Never fails; input with no
    /// surviving letters yields an empty string.
    pub fn normalize(&self, text: &str) -> String {
        let stripped: String = text
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_lowercase() || c.is_whitespace())
            .collect();

        if stripped.trim().is_empty() {
            return String::new();
        }

        stripped
            .unicode_words()
            .filter(|token| !is_stopword(token))
            .map(|token| self.lemmatizer.lemmatize(token))
            .filter(|lemma| !lemma.is_empty() && !is_stopword(lemma))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Word and character counts of the original text.
    pub fn document_features(text: &str) -> DocumentFeatures {
        DocumentFeatures {
            word_count: text.split_whitespace().count(),
            char_count: text.chars().count(),
        }
    }
}

/// Most frequent word tokens across `texts`, count descending, ties in order of
/// first occurrence. Intended for already-normalized text.
pub fn word_frequency<S: AsRef<str>>(texts: &[S], top_n: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    let mut seen = 0usize;
    for text in texts {
        for token in text.as_ref().unicode_words() {
            let entry = counts.entry(token).or_insert_with(|| {
                seen += 1;
                (0, seen)
            });
            entry.0 += 1;
        }
    }

    let mut ranked: Vec<(&str, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
    ranked
        .into_iter()
        .take(top_n)
        .map(|(token, (count, _))| (token.to_string(), count))
        .collect()
}
