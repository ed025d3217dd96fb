//! Error types for bq-wordlist.
//!
//! Every stage of the pipeline returns one of these; none of them is recovered
//! locally. The binary logs the error once and exits non-zero.

use thiserror::Error;

/// Main error type for bq-wordlist operations.
#[derive(Error, Debug)]
pub enum WordlistError {
    /// An extension token that cannot be embedded in the query pattern.
    #[error("Invalid extension filter: {0}")]
    InvalidFilter(String),

    /// A row limit that is not a positive integer.
    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    /// Template and parameters disagree (unknown, missing or unterminated placeholder).
    #[error("Unresolved placeholder: {0}")]
    UnresolvedPlaceholder(String),

    /// A named template asset does not exist.
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    /// The warehouse client could not be built, or the query was rejected.
    #[error("Submission error: {0}")]
    Submission(String),

    /// A result page could not be fetched while draining.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// A sink could not be opened or written.
    #[error("Drain error: {0}")]
    Drain(String),

    /// Invalid or missing invocation inputs (project, credentials, config file).
    #[error("Configuration error: {0}")]
    Config(String),
}

impl WordlistError {
    /// Creates an invalid filter error with the given message.
    pub fn invalid_filter(msg: impl Into<String>) -> Self {
        Self::InvalidFilter(msg.into())
    }

    /// Creates an invalid limit error with the given message.
    pub fn invalid_limit(msg: impl Into<String>) -> Self {
        Self::InvalidLimit(msg.into())
    }

    /// Creates an unresolved placeholder error with the given message.
    pub fn unresolved_placeholder(msg: impl Into<String>) -> Self {
        Self::UnresolvedPlaceholder(msg.into())
    }

    /// Creates a template-not-found error for the given asset name.
    pub fn template_not_found(name: impl Into<String>) -> Self {
        Self::TemplateNotFound(name.into())
    }

    /// Creates a submission error with the given message.
    pub fn submission(msg: impl Into<String>) -> Self {
        Self::Submission(msg.into())
    }

    /// Creates a fetch error with the given message.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Creates a drain error with the given message.
    pub fn drain(msg: impl Into<String>) -> Self {
        Self::Drain(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidFilter(_) | Self::InvalidLimit(_) => "Filter Error",
            Self::UnresolvedPlaceholder(_) | Self::TemplateNotFound(_) => "Template Error",
            Self::Submission(_) => "Submission Error",
            Self::Fetch(_) => "Fetch Error",
            Self::Drain(_) => "Drain Error",
            Self::Config(_) => "Configuration Error",
        }
    }
}

/// Result type alias using WordlistError.
pub type Result<T> = std::result::Result<T, WordlistError>;
