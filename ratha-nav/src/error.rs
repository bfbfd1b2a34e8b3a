//! Error types for RathaNav

use thiserror::Error;

/// RathaNav error type
#[derive(Error, Debug)]
pub enum RathaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Sequence error: {0}")]
    Sequence(String),
}

impl From<toml::de::Error> for RathaError {
    fn from(e: toml::de::Error) -> Self {
        RathaError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RathaError>;
