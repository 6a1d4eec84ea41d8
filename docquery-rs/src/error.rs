//! Error types for docquery.
//!
//! Parsing, evaluation and SQL compilation never fail: bad user input turns
//! into diagnostic issues instead. Only configuration surfaces return errors.

use thiserror::Error;

/// Main error type for docquery operations.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Invalid SQL identifier for {setting}: '{value}'")]
    InvalidIdentifier { setting: String, value: String },

    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias for docquery operations.
pub type Result<T> = std::result::Result<T, QueryError>;
