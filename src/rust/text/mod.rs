//! Text cleaning applied to every review before feature extraction.

mod lemmatizer;
mod normalizer;
mod stopwords;

pub use lemmatizer::{Lemmatizer, RuleLemmatizer};
pub use normalizer::{word_frequency, DocumentFeatures, TextNormalizer};
pub use stopwords::{is_stopword, ENGLISH_STOPWORDS};
