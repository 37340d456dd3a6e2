//! Error types for tubeplayer
//!
//! This module defines the error type used throughout the library.
//! We use thiserror for the library error and anyhow at the binary level.
//! Nothing on the command surface returns these to the caller; they are
//! logged or turned into player events inside the controller.

use std::time::Duration;
use thiserror::Error;

/// Main error type for tubeplayer
#[derive(Error, Debug)]
pub enum PlayerError {
    /// External SDK errors
    #[error("SDK error: {0}")]
    Sdk(String),

    /// The SDK ready signal did not fire in time
    #[error("SDK did not become ready within {0:?}")]
    SdkLoadTimeout(Duration),

    /// Player instance errors
    #[error("Player instance error: {0}")]
    Instance(String),

    /// Fullscreen request rejected by the host
    #[error("Fullscreen error: {0}")]
    Fullscreen(String),

    /// Platform data API request failed or returned an unusable body
    #[error("Platform API error: {0}")]
    Api(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File error: {0}")]
    FileIO(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Generic error for unexpected situations
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlayerError {
    /// Create an invalid input error from string
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        PlayerError::InvalidInput(msg.into())
    }
}

/// Convenience type alias for Results in tubeplayer
pub type Result<T> = std::result::Result<T, PlayerError>;

/// Extension trait for converting other errors to PlayerError
pub trait IntoPlayerError<T> {
    /// Convert this error into a PlayerError with the given context
    fn config_err(self, context: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> IntoPlayerError<T> for std::result::Result<T, E> {
    fn config_err(self, context: &str) -> Result<T> {
        self.map_err(|e| PlayerError::Config(format!("{}: {}", context, e)))
    }
}
