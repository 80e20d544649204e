//! Defines the custom error types for the seo-scan service.

use std::io;
use thiserror::Error;
use url::ParseError as UrlParseError;

/// The primary error type for the scan pipeline.
#[derive(Error, Debug)]
pub(crate) enum AppError {
    /// Error occurring during configuration loading or validation.
    #[error("Configuration Error: {0}")]
    Config(String),

    /// Scan request rejected because `url` or `email` is absent or empty.
    /// The only hard failure path: surfaced to the caller as a 400.
    #[error("Missing fields")]
    MissingFields,

    /// Error related to file input/output operations.
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),

    /// Error during JSON serialization or deserialization.
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error parsing a URL.
    #[error("URL Parsing Error: {0}")]
    UrlParse(#[from] UrlParseError),

    /// Error making HTTP requests via reqwest (page fetch or provider call).
    #[error("HTTP Request Error: {0}")]
    Request(#[from] reqwest::Error),

    /// The audited page served something other than HTML.
    #[error("Unexpected Content Type: {0}")]
    ContentType(String),

    /// The ranking provider answered, but the task inside the envelope failed.
    #[error("Ranking Provider Error: code={code}, message='{message}'")]
    Provider {
        /// The provider's task status code.
        code: u32,
        /// The message returned alongside the status.
        message: String,
    },

    /// The provider envelope was well-formed but carried no task at all.
    #[error("Empty Provider Response: {0}")]
    EmptyProviderResponse(String),

    /// Error during SMTP transport of the lead notification.
    #[error("SMTP Error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// Error building the lead notification message.
    #[error("Mail Build Error: {0}")]
    MailBuild(#[from] lettre::error::Error),

    /// Error parsing a mailbox address from configuration.
    #[error("Mail Address Error: {0}")]
    MailAddress(#[from] lettre::address::AddressError),

    /// An underlying error that doesn't fit other categories, using anyhow.
    #[error("Generic Error: {0}")]
    Generic(#[from] anyhow::Error),
}

pub(crate) type Result<T> = std::result::Result<T, AppError>;
