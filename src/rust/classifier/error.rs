use thiserror::Error;

/// Represents the different types of errors that can occur in the sentiment pipeline.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClassifierError {
    /// Input records are missing a required field or carry a label outside the fixed set
    #[error("Schema error: {0}")]
    SchemaError(String),
    /// A class does not have enough examples to be split, folded or fitted
    #[error("Insufficient data: {0}")]
    InsufficientDataError(String),
    /// A vectorizer or model was used before `fit`
    #[error("Not fitted: {0}")]
    NotFittedError(String),
    /// Error occurred due to invalid input parameters
    #[error("Validation error: {0}")]
    ValidationError(String),
    /// Pipeline configuration is out of range
    #[error("Config error: {0}")]
    ConfigError(String),
}

impl ClassifierError {
    pub(crate) fn schema(msg: impl Into<String>) -> Self {
        Self::SchemaError(msg.into())
    }

    pub(crate) fn insufficient_data(msg: impl Into<String>) -> Self {
        Self::InsufficientDataError(msg.into())
    }

    pub(crate) fn not_fitted(msg: impl Into<String>) -> Self {
        Self::NotFittedError(msg.into())
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
