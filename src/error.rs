//! Error types shared by the polling pipeline and its collaborators.

use thiserror::Error;

/// A document could not be retrieved.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },
}

/// Markup did not have the structure the extractor expects.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("page-count control not found")]
    MissingPageCount,
    #[error("page-count control holds an invalid value: {0:?}")]
    InvalidPageCount(String),
}

/// A notification batch could not be delivered.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Address(#[from] lettre::address::AddressError),
    #[error(transparent)]
    Message(#[from] lettre::error::Error),
    #[error(transparent)]
    Smtp(#[from] lettre::transport::smtp::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("EMAIL_RECIPIENTS contains an empty entry")]
    InvalidRecipient,
}
