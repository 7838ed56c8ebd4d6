use review_sentiment::{
    train, ClassifierError, Corpus, LogisticRegression, PipelineConfig, RawReview, Review, Sentiment,
    SentimentClassifier, TfidfVectorizer,
};

fn balanced(copies: usize) -> Vec<Review> {
    let mut reviews = Vec::new();
    for i in 0..copies {
        reviews.push(Review::new(format!("great lovely dress {}", i), Sentiment::Positive));
        reviews.push(Review::new(format!("awful torn seams {}", i), Sentiment::Negative));
        reviews.push(Review::new(format!("average plain shirt {}", i), Sentiment::Neutral));
    }
    reviews
}

#[test]
fn test_single_example_class() {
    // one negative example cannot appear in both splits
    let mut reviews = balanced(5);
    reviews.retain(|r| r.sentiment != Sentiment::Negative);
    reviews.push(Review::new("awful", Sentiment::Negative));

    let result = train(&Corpus::from_reviews(reviews), &PipelineConfig::default().with_test_fraction(0.2));
    assert!(matches!(result, Err(ClassifierError::InsufficientDataError(_))));
}

#[test]
fn test_single_class_corpus() {
    let reviews = vec![
        Review::new("great", Sentiment::Positive),
        Review::new("lovely", Sentiment::Positive),
        Review::new("superb", Sentiment::Positive),
    ];
    let result = train(&Corpus::from_reviews(reviews), &PipelineConfig::default());
    assert!(matches!(result, Err(ClassifierError::InsufficientDataError(_))));
}

#[test]
fn test_empty_corpus() {
    let result = train(&Corpus::from_reviews(Vec::new()), &PipelineConfig::default());
    assert!(matches!(result, Err(ClassifierError::InsufficientDataError(_))));
}

#[test]
fn test_missing_fields() {
    let records: Vec<RawReview> = serde_json::from_str(
        r#"[
            {"text": "Great dress", "sentiment": "positive"},
            {"text": "No label here"}
        ]"#,
    )
    .unwrap();
    let err = Corpus::from_records(records).unwrap_err();
    assert_eq!(
        err,
        ClassifierError::SchemaError("row 1: missing required field 'sentiment'".to_string())
    );
}

#[test]
fn test_unknown_label() {
    let records = vec![RawReview::new("Great dress", "positive"), RawReview::new("Meh", "mixed")];
    assert!(matches!(Corpus::from_records(records), Err(ClassifierError::SchemaError(_))));

    let result = SentimentClassifier::builder().add_record("Meh", "very positive");
    assert!(matches!(result, Err(ClassifierError::SchemaError(_))));
}

#[test]
fn test_label_case_and_whitespace() -> Result<(), ClassifierError> {
    let corpus = Corpus::from_records(vec![
        RawReview::new("Great dress", " Positive "),
        RawReview::new("Awful dress", "NEGATIVE"),
    ])?;
    assert_eq!(corpus.labels(), vec![Sentiment::Positive, Sentiment::Negative]);
    Ok(())
}

#[test]
fn test_invalid_config() {
    let corpus = Corpus::from_reviews(balanced(5));
    let invalid = [
        PipelineConfig::default().with_test_fraction(0.0),
        PipelineConfig::default().with_test_fraction(1.0),
        PipelineConfig::default().with_max_features(0),
        PipelineConfig::default().with_ngram_range(3, 2),
        PipelineConfig::default().with_regularization(0.0),
    ];
    for config in invalid {
        assert!(
            matches!(train(&corpus, &config), Err(ClassifierError::ConfigError(_))),
            "{:?}",
            config
        );
    }
}

#[test]
fn test_not_fitted() {
    let vectorizer = TfidfVectorizer::new(100, (1, 2));
    assert!(matches!(vectorizer.transform_one("great"), Err(ClassifierError::NotFittedError(_))));

    let model = LogisticRegression::default();
    let vector = review_sentiment::FeatureVector::zeros(3);
    assert!(matches!(model.predict_proba(&vector), Err(ClassifierError::NotFittedError(_))));
    assert!(matches!(model.predict(&vector), Err(ClassifierError::NotFittedError(_))));
}

#[test]
fn test_error_messages() {
    let err = ClassifierError::InsufficientDataError("class 'neutral' has 1 example(s)".to_string());
    assert_eq!(err.to_string(), "Insufficient data: class 'neutral' has 1 example(s)");
}
