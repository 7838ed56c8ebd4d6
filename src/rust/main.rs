use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use log::{info, warn};
use review_sentiment::{
    cross_validate, diagnose, per_class_balance, train, Corpus, DiagnosticThresholds, PipelineConfig, RawReview,
    Review, Sentiment, SentimentClassifier,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON config file; missing fields take their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON array of {"text": ..., "sentiment": ...} records; a built-in
    /// sample corpus is used when omitted
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Text to classify after training (repeatable)
    #[arg(short, long)]
    text: Vec<String>,

    /// Override the random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the held-out share of each class
    #[arg(long)]
    test_fraction: Option<f64>,

    /// Skip cross-validation
    #[arg(long)]
    no_cv: bool,

    /// Print the evaluation report as JSON
    #[arg(long)]
    json: bool,
}

const SAMPLE_REVIEWS: &[(&str, Sentiment)] = &[
    ("This is the best online clothing store! My order arrived in two days.", Sentiment::Positive),
    ("I am absolutely in love with the sweater I bought.", Sentiment::Positive),
    ("Five stars! The customer service team was incredibly helpful.", Sentiment::Positive),
    ("Love this dress, perfect fit and lovely fabric.", Sentiment::Positive),
    ("Great quality jeans, they fit perfectly.", Sentiment::Positive),
    ("Beautiful colors and very comfortable, I love it.", Sentiment::Positive),
    ("Excellent service and fast shipping, highly recommend.", Sentiment::Positive),
    ("The jacket is gorgeous and keeps me warm, love it.", Sentiment::Positive),
    ("Perfect gift, my sister loved the scarf.", Sentiment::Positive),
    ("Amazing shoes, comfortable from the first day.", Sentiment::Positive),
    ("This is the worst store I have ever shopped at.", Sentiment::Negative),
    ("The quality is absolutely terrible. Complete scam.", Sentiment::Negative),
    ("Do not buy from here! The sizing is a joke.", Sentiment::Negative),
    ("Terrible quality, the seams fell apart after one wash.", Sentiment::Negative),
    ("Awful customer service, they never answered my emails.", Sentiment::Negative),
    ("The zipper broke on day one, worst purchase ever.", Sentiment::Negative),
    ("Cheap fabric and terrible stitching, returning it.", Sentiment::Negative),
    ("My order never arrived and nobody refunded me.", Sentiment::Negative),
    ("The shoes hurt and fell apart within a week.", Sentiment::Negative),
    ("Horrible fit, the dress looks nothing like the picture.", Sentiment::Negative),
    ("The dress is nice, but the color is much darker than the picture.", Sentiment::Neutral),
    ("The quality of the t-shirt is okay for the price.", Sentiment::Neutral),
    ("Shipping took longer than expected, almost three weeks.", Sentiment::Neutral),
    ("It's okay, nothing special about this shirt.", Sentiment::Neutral),
    ("Average sweater, does the job.", Sentiment::Neutral),
    ("The fit is fine, the material is average.", Sentiment::Neutral),
    ("Package arrived on time, the product is as described.", Sentiment::Neutral),
    ("Not bad, not great, an ordinary pair of pants.", Sentiment::Neutral),
    ("The color is okay but the size runs a bit large.", Sentiment::Neutral),
    ("Decent socks for the price, nothing more.", Sentiment::Neutral),
];

fn load_config(args: &Args) -> Result<PipelineConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(test_fraction) = args.test_fraction {
        config = config.with_test_fraction(test_fraction);
    }
    config.validate()?;
    Ok(config)
}

fn load_corpus(args: &Args) -> Result<Corpus, Box<dyn Error>> {
    match &args.corpus {
        Some(path) => {
            info!("Loading corpus from {}", path.display());
            let records: Vec<RawReview> = serde_json::from_str(&fs::read_to_string(path)?)?;
            Ok(Corpus::from_records(records)?)
        }
        None => {
            info!("Using the built-in sample corpus");
            Ok(Corpus::from_reviews(
                SAMPLE_REVIEWS.iter().map(|&(text, sentiment)| Review::new(text, sentiment)),
            ))
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    info!("=== Starting Review Sentiment Demo ===");
    let config = load_config(&args)?;
    let corpus = load_corpus(&args)?;
    info!("Corpus: {} reviews, class counts {:?}", corpus.len(), corpus.class_counts());

    let start_time = Instant::now();
    let (classifier, report) = train(&corpus, &config)?;
    info!("=== Classifier trained (took {:.2?}) ===", start_time.elapsed());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let summary = report.summary();
        println!("Train accuracy: {:.3}", summary.train_accuracy);
        println!("Test accuracy:  {:.3}", summary.test_accuracy);
        println!("Gap:            {:.3}", summary.accuracy_gap);
        println!("Macro F1:       {:.3}", summary.f1_avg);
        for (label, metrics) in &report.per_class {
            println!(
                "  {:<8} precision {:.2}  recall {:.2}  f1 {:.2}  support {}",
                label.as_str(), metrics.precision, metrics.recall, metrics.f1, metrics.support
            );
        }
    }

    let thresholds = DiagnosticThresholds::from(&config);
    let diagnosis = diagnose(&report.fit_metrics(), &thresholds);
    println!("\nDiagnosis: {}", diagnosis.status);
    println!("  {}", diagnosis.explanation);
    for recommendation in &diagnosis.recommendations {
        println!("  - {}", recommendation);
    }

    let balance = per_class_balance(&report.per_class, thresholds.class_balance);
    println!(
        "Class balance: {} (F1 range {:.3}, variance {:.4})",
        if balance.balanced { "balanced" } else { "unbalanced" },
        balance.f1_range,
        balance.f1_variance
    );

    if !args.no_cv {
        match cross_validate(&corpus, &config) {
            Ok(cv) => {
                println!("\nCross-validation ({} folds): mean {:.3}, std {:.3}", cv.fold_scores.len(), cv.mean, cv.std);
                for note in cv.interpretation() {
                    println!("  {}", note);
                }
            }
            Err(e) => warn!("Skipping cross-validation: {}", e),
        }
    }

    print_top_features(&classifier, 5)?;

    let inputs: Vec<String> = if args.text.is_empty() {
        vec![
            "I absolutely love this dress".to_string(),
            "The fabric is terrible and it fell apart".to_string(),
            "It's an okay shirt for the price".to_string(),
        ]
    } else {
        args.text.clone()
    };

    println!("\nPredictions:");
    for text in &inputs {
        match classifier.predict(text) {
            Ok(prediction) => {
                println!("  \"{}\" -> {} ({:.1}%)", text, prediction.label, prediction.confidence * 100.0);
                if prediction.known_features == 0 {
                    println!("    no known words; prediction reflects class priors only");
                }
            }
            Err(e) => eprintln!("  \"{}\" -> error: {}", text, e),
        }
    }

    info!("=== Demo Complete (total {:.2?}) ===", start_time.elapsed());
    Ok(())
}

fn print_top_features(classifier: &SentimentClassifier, top_n: usize) -> Result<(), Box<dyn Error>> {
    println!("\nTop features:");
    for &label in classifier.classes() {
        let features = classifier.feature_importance(label, top_n)?;
        let names: Vec<String> = features
            .iter()
            .map(|(name, weight)| format!("{} ({:.2})", name, weight))
            .collect();
        println!("  {:<8} {}", label.as_str(), names.join(", "));
    }
    Ok(())
}
