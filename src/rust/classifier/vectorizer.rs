use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, info};
use ndarray::{Array1, ArrayView1};
use serde::Serialize;

use super::error::ClassifierError;
use super::utils::normalize_vector;

/// A sparse feature vector over a fixed vocabulary.
///
/// Indices are strictly increasing; dimensions not listed are zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    dim: usize,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Builds a vector from `(index, value)` pairs sorted by index.
    pub(crate) fn from_sorted(dim: usize, entries: impl IntoIterator<Item = (usize, f64)>) -> Self {
        let (indices, values): (Vec<usize>, Vec<f64>) =
            entries.into_iter().filter(|&(_, v)| v != 0.0).unzip();
        Self { dim, indices, values }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored non-zero entries
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_zero(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn get(&self, index: usize) -> f64 {
        self.indices
            .binary_search(&index)
            .map(|pos| self.values[pos])
            .unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    pub fn to_dense(&self) -> Array1<f64> {
        let mut dense = Array1::zeros(self.dim);
        for (i, v) in self.iter() {
            dense[i] = v;
        }
        dense
    }

    pub(crate) fn dot(&self, row: ArrayView1<f64>) -> f64 {
        self.iter().map(|(i, v)| v * row[i]).sum()
    }
}

/// Mapping between n-grams and feature indices.
///
/// Indices follow the lexicographic order of the retained n-grams.
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    terms: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    fn from_terms(mut terms: Vec<String>) -> Self {
        terms.sort();
        let index = terms.iter().enumerate().map(|(i, t)| (t.clone(), i)).collect();
        Self { terms, index }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn get(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.index.contains_key(term)
    }

    pub fn term(&self, index: usize) -> Option<&str> {
        self.terms.get(index).map(String::as_str)
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

#[derive(Debug, Clone)]
struct FittedState {
    vocabulary: Vocabulary,
    idf: Vec<f64>,
    n_documents: usize,
}

#[derive(Debug, Default)]
struct TermStats {
    total: usize,
    document_frequency: usize,
    first_seen: usize,
}

/// TF-IDF vectorizer over word n-grams of already-normalized text.
///
/// Weights are raw n-gram counts times the smoothed inverse document
/// frequency `ln((1 + n) / (1 + df)) + 1`, L2-normalized per document. The
/// vocabulary keeps the `max_features` most frequent n-grams of the fitted
/// corpus, ties going to the n-gram seen first.
///
/// Calling [`fit`](Self::fit) again replaces the vocabulary; any model trained
/// on vectors from the previous vocabulary is invalid afterwards.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    max_features: usize,
    ngram_range: (usize, usize),
    state: Option<FittedState>,
}

impl TfidfVectorizer {
    pub fn new(max_features: usize, ngram_range: (usize, usize)) -> Self {
        Self {
            max_features,
            ngram_range,
            state: None,
        }
    }

    pub fn max_features(&self) -> usize {
        self.max_features
    }

    pub fn ngram_range(&self) -> (usize, usize) {
        self.ngram_range
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    /// Splits `text` on whitespace and emits every n-gram in the configured
    /// range, shorter n-grams first.
    pub fn ngrams(&self, text: &str) -> Vec<String> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let (min_n, max_n) = self.ngram_range;
        let mut grams = Vec::new();
        for n in min_n.max(1)..=max_n {
            if n > tokens.len() {
                break;
            }
            grams.extend(tokens.windows(n).map(|window| window.join(" ")));
        }
        grams
    }

    /// Learns the vocabulary and IDF weights from `texts`.
    ///
    /// # Errors
    /// - `InsufficientDataError` if the texts contain no n-grams at all
    pub fn fit<S: AsRef<str>>(&mut self, texts: &[S]) -> Result<&Vocabulary, ClassifierError> {
        let mut stats: HashMap<String, TermStats> = HashMap::new();
        let mut order = 0usize;

        for text in texts {
            let grams = self.ngrams(text.as_ref());
            let mut in_document: HashSet<&str> = HashSet::new();
            for gram in &grams {
                let entry = stats.entry(gram.clone()).or_insert_with(|| {
                    order += 1;
                    TermStats {
                        first_seen: order,
                        ..TermStats::default()
                    }
                });
                entry.total += 1;
                if in_document.insert(gram.as_str()) {
                    entry.document_frequency += 1;
                }
            }
        }

        if stats.is_empty() {
            return Err(ClassifierError::insufficient_data(
                "training texts produced an empty vocabulary",
            ));
        }

        let mut ranked: Vec<(String, TermStats)> = stats.into_iter().collect();
        ranked.sort_by(|a, b| b.1.total.cmp(&a.1.total).then(a.1.first_seen.cmp(&b.1.first_seen)));
        let dropped = ranked.len().saturating_sub(self.max_features);
        ranked.truncate(self.max_features);

        let document_frequency: HashMap<&str, usize> = ranked
            .iter()
            .map(|(term, s)| (term.as_str(), s.document_frequency))
            .collect();
        let vocabulary = Vocabulary::from_terms(ranked.iter().map(|(term, _)| term.clone()).collect());

        let n = texts.len() as f64;
        let idf = vocabulary
            .terms()
            .iter()
            .map(|term| {
                let df = document_frequency[term.as_str()] as f64;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        info!(
            "Fitted vocabulary: {} n-grams from {} documents ({} dropped by max_features = {})",
            vocabulary.len(),
            texts.len(),
            dropped,
            self.max_features
        );

        let state = self.state.insert(FittedState {
            vocabulary,
            idf,
            n_documents: texts.len(),
        });
        Ok(&state.vocabulary)
    }

    fn fitted(&self) -> Result<&FittedState, ClassifierError> {
        self.state
            .as_ref()
            .ok_or_else(|| ClassifierError::not_fitted("TfidfVectorizer must be fitted before transform"))
    }

    pub fn vocabulary(&self) -> Result<&Vocabulary, ClassifierError> {
        self.fitted().map(|state| &state.vocabulary)
    }

    /// The n-gram behind feature `index`.
    ///
    /// # Errors
    /// - `NotFittedError` before fit
    /// - `ValidationError` if `index` is outside the vocabulary
    pub fn feature_name(&self, index: usize) -> Result<&str, ClassifierError> {
        let vocabulary = self.vocabulary()?;
        vocabulary.term(index).ok_or_else(|| {
            ClassifierError::validation(format!(
                "feature index {} out of range for vocabulary of {}",
                index,
                vocabulary.len()
            ))
        })
    }

    pub fn idf(&self) -> Result<&[f64], ClassifierError> {
        self.fitted().map(|state| state.idf.as_slice())
    }

    /// Number of documents the vocabulary was learned from
    pub fn n_documents(&self) -> Result<usize, ClassifierError> {
        self.fitted().map(|state| state.n_documents)
    }

    /// Vectorizes one text. Unknown n-grams are ignored; a text with no known
    /// n-grams yields the zero vector.
    pub fn transform_one(&self, text: &str) -> Result<FeatureVector, ClassifierError> {
        let state = self.fitted()?;
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for gram in self.ngrams(text) {
            if let Some(index) = state.vocabulary.get(&gram) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let indices: Vec<usize> = counts.keys().copied().collect();
        let mut values: Vec<f64> = counts.iter().map(|(&i, &tf)| tf * state.idf[i]).collect();
        normalize_vector(&mut values);
        Ok(FeatureVector::from_sorted(
            state.vocabulary.len(),
            indices.into_iter().zip(values),
        ))
    }

    pub fn transform<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<FeatureVector>, ClassifierError> {
        let vectors = texts
            .iter()
            .map(|text| self.transform_one(text.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Transformed {} texts", vectors.len());
        Ok(vectors)
    }

    pub fn fit_transform<S: AsRef<str>>(&mut self, texts: &[S]) -> Result<Vec<FeatureVector>, ClassifierError> {
        self.fit(texts)?;
        self.transform(texts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted(texts: &[&str], max_features: usize) -> TfidfVectorizer {
        let mut vectorizer = TfidfVectorizer::new(max_features, (1, 2));
        vectorizer.fit(texts).unwrap();
        vectorizer
    }

    #[test]
    fn test_ngrams() {
        let vectorizer = TfidfVectorizer::new(10, (1, 2));
        assert_eq!(
            vectorizer.ngrams("love dress fit"),
            vec!["love", "dress", "fit", "love dress", "dress fit"]
        );
        assert!(vectorizer.ngrams("").is_empty());
        assert_eq!(vectorizer.ngrams("single"), vec!["single"]);
    }

    #[test]
    fn test_vocabulary_is_sorted() {
        let vectorizer = fitted(&["love dress", "hate dress"], 100);
        let vocabulary = vectorizer.vocabulary().unwrap();
        assert_eq!(vocabulary.terms(), &["dress", "hate", "hate dress", "love", "love dress"]);
        assert_eq!(vocabulary.get("hate"), Some(1));
        assert_eq!(vectorizer.feature_name(4).unwrap(), "love dress");
        assert!(matches!(vectorizer.feature_name(5), Err(ClassifierError::ValidationError(_))));
    }

    #[test]
    fn test_max_features_keeps_most_frequent() {
        // "dress" occurs 3 times, "fit" twice, the rest once; ties by first occurrence
        let vectorizer = fitted(&["dress fit", "dress fit", "dress zip"], 3);
        let vocabulary = vectorizer.vocabulary().unwrap();
        assert_eq!(vocabulary.len(), 3);
        assert!(vocabulary.contains("dress"));
        assert!(vocabulary.contains("fit"));
        assert!(vocabulary.contains("dress fit"));
        assert!(!vocabulary.contains("zip"));
    }

    #[test]
    fn test_smooth_idf() {
        let vectorizer = fitted(&["love dress", "hate dress"], 100);
        let vocabulary = vectorizer.vocabulary().unwrap();
        let idf = vectorizer.idf().unwrap();
        let dress = idf[vocabulary.get("dress").unwrap()];
        let love = idf[vocabulary.get("love").unwrap()];
        assert!((dress - 1.0).abs() < 1e-12);
        assert!((love - ((3.0f64 / 2.0).ln() + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_transform_is_l2_normalized() {
        let vectorizer = fitted(&["love dress", "hate dress", "dress dress"], 100);
        let vector = vectorizer.transform_one("love dress dress").unwrap();
        assert!((vector.norm() - 1.0).abs() < 1e-12);
        assert_eq!(vector.dim(), vectorizer.vocabulary().unwrap().len());
        let vocabulary = vectorizer.vocabulary().unwrap();
        assert!(vector.get(vocabulary.get("dress").unwrap()) > 0.0);
        assert_eq!(vector.get(vocabulary.get("hate").unwrap()), 0.0);

        let dense = vector.to_dense();
        assert_eq!(dense.len(), vector.dim());
        assert!((dense.dot(&dense) - 1.0).abs() < 1e-12);
        assert_eq!(vectorizer.n_documents().unwrap(), 3);
    }

    #[test]
    fn test_unknown_text_is_zero_vector() {
        let vectorizer = fitted(&["love dress"], 100);
        let vector = vectorizer.transform_one("completely unseen words").unwrap();
        assert!(vector.is_zero());
        assert_eq!(vector.norm(), 0.0);
        assert!(vectorizer.transform_one("").unwrap().is_zero());
    }

    #[test]
    fn test_not_fitted() {
        let vectorizer = TfidfVectorizer::new(100, (1, 2));
        assert!(matches!(vectorizer.transform(&["love"]), Err(ClassifierError::NotFittedError(_))));
        assert!(matches!(vectorizer.vocabulary(), Err(ClassifierError::NotFittedError(_))));
    }

    #[test]
    fn test_empty_vocabulary() {
        let mut vectorizer = TfidfVectorizer::new(100, (1, 2));
        assert!(matches!(vectorizer.fit(&["", "  "]), Err(ClassifierError::InsufficientDataError(_))));
        assert!(!vectorizer.is_fitted());
    }

    #[test]
    fn test_refit_replaces_vocabulary() {
        let mut vectorizer = fitted(&["love dress"], 100);
        vectorizer.fit(&["hate zip"]).unwrap();
        let vocabulary = vectorizer.vocabulary().unwrap();
        assert!(!vocabulary.contains("love"));
        assert!(vocabulary.contains("hate zip"));
    }
}
