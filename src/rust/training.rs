use log::{info, warn};

use crate::classifier::{ClassifierError, LogisticRegression, SentimentClassifier, TfidfVectorizer};
use crate::config::PipelineConfig;
use crate::corpus::{Corpus, Sentiment};
use crate::evaluation::{stratified_split, EvaluationReport};

/// Trains a classifier on a stratified train split of `corpus` and evaluates
/// it on the held-out rows.
///
/// The vocabulary is learned from train rows only. The result depends only on
/// `corpus` and `config`: the same inputs give the same split and model.
///
/// # Errors
/// - `ConfigError` for an invalid configuration
/// - `InsufficientDataError` if the corpus is empty, has a single class, has a
///   class with fewer than 2 reviews, or its train split has no n-grams
pub fn train(corpus: &Corpus, config: &PipelineConfig) -> Result<(SentimentClassifier, EvaluationReport), ClassifierError> {
    config.validate()?;
    let split = stratified_split(&corpus.labels(), config.test_fraction, config.random_seed)?;
    info!(
        "Training on {} reviews, holding out {} (seed {})",
        split.train.len(),
        split.test.len(),
        config.random_seed
    );

    let classifier = fit_classifier(corpus, &split.train, config)?;

    let train_labels = corpus.labels_at(&split.train);
    let train_predictions = predict_rows(&classifier, corpus, &split.train)?;
    let test_labels = corpus.labels_at(&split.test);
    let test_predictions = predict_rows(&classifier, corpus, &split.test)?;

    let report = EvaluationReport::new(
        classifier.classes(),
        &train_labels,
        &train_predictions,
        test_labels,
        test_predictions,
        classifier.model().convergence_warning(),
    );
    info!(
        "Train accuracy {:.4}, test accuracy {:.4}, gap {:.4}",
        report.train_accuracy, report.test_accuracy, report.accuracy_gap
    );
    if !report.converged() {
        warn!("Model did not converge; metrics may understate achievable quality");
    }
    Ok((classifier, report))
}

/// Fits a vectorizer and classifier on the given corpus rows.
pub(crate) fn fit_classifier(
    corpus: &Corpus,
    rows: &[usize],
    config: &PipelineConfig,
) -> Result<SentimentClassifier, ClassifierError> {
    let texts = corpus.cleaned_texts(rows);
    let mut vectorizer = TfidfVectorizer::new(config.max_features, config.ngram_range);
    let features = vectorizer.fit_transform(&texts)?;

    let mut model = LogisticRegression::new(config.solver_params());
    model.fit(&features, &corpus.labels_at(rows))?;

    SentimentClassifier::from_parts(corpus.normalizer().clone(), vectorizer, model)
}

/// Predicts the labels of corpus rows from their cleaned text.
pub(crate) fn predict_rows(
    classifier: &SentimentClassifier,
    corpus: &Corpus,
    rows: &[usize],
) -> Result<Vec<Sentiment>, ClassifierError> {
    corpus
        .cleaned_texts(rows)
        .into_iter()
        .map(|text| classifier.predict_cleaned(text).map(|p| p.label))
        .collect()
}
