//! Error types for the pals_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for pals_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Decision graph validation error
    #[error("Protocol validation error: {0}")]
    Protocol(String),

    /// A transition that the current step does not offer
    #[error("Navigation error: {0}")]
    Navigation(String),

    /// Unrecognised name for an algorithm, tab, or similar selector
    #[error("Parse error: {0}")]
    Parse(String),

    /// Assistant backend failure
    #[error("Assistant error: {0}")]
    Assistant(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
