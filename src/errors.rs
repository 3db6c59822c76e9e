use reqwest::StatusCode;
use thiserror::Error;

/// Failures of a geocode or forecast fetch. All of them end up in the status line.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{service} request failed ({status})")]
    NetworkFailure {
        service: &'static str,
        status: StatusCode,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Location not found: {0}")]
    NoResults(String),

    #[error("malformed forecast payload: {0}")]
    Payload(String),

    #[error("invalid service url: {0}")]
    InvalidUrl(String),
}

impl From<chrono::ParseError> for FetchError {
    fn from(e: chrono::ParseError) -> Self {
        FetchError::Payload(e.to_string())
    }
}

/// Raised when navigation asks for a page the hourly window doesn't have.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("page {page} is out of range ({page_count} pages)")]
    InvalidPage { page: isize, page_count: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse config file: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("cannot open log file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid logger configuration: {0}")]
    Config(#[from] log4rs::config::runtime::ConfigErrors),

    #[error("logger already initialized: {0}")]
    SetLogger(#[from] log::SetLoggerError),
}
