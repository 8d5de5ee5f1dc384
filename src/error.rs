//! Flora error types

use std::time::Duration;

/// Flora error types
#[derive(Debug, thiserror::Error)]
pub enum FloraError {
    // Provider/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("provider timed out after {0:?}")]
    ProviderTimeout(Duration),

    // Soft errors
    #[error("empty response from provider")]
    EmptyResponse,

    // Upload/capture errors
    #[error("no image attached")]
    MissingImage,

    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Camera denied or absent. Non-fatal: the client falls back to file upload.
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl FloraError {
    /// Whether the error was caused by the caller's input rather than by the
    /// service or its provider.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::MissingImage | Self::InvalidImage(_))
    }
}

impl From<image::ImageError> for FloraError {
    fn from(err: image::ImageError) -> Self {
        FloraError::InvalidImage(err.to_string())
    }
}

impl From<reqwest::Error> for FloraError {
    fn from(err: reqwest::Error) -> Self {
        FloraError::Http(err.to_string())
    }
}

/// Result type alias for Flora operations
pub type Result<T> = std::result::Result<T, FloraError>;
