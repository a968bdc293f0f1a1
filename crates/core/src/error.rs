//! Error types for r2-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use thiserror::Error;

/// Result type alias for r2-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for r2-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or malformed argument (bucket name, object path, ...)
    #[error("{0}")]
    Validation(String),

    /// Two mutually exclusive arguments were given together
    #[error("{0}")]
    ArgumentConflict(String),

    /// Upload body exceeds the maximum upload size
    #[error(
        "Only files up to {} ({max} bytes) can be uploaded; {name} is {} ({size} bytes) in size",
        human_size(.max),
        human_size(.size)
    )]
    TooLarge { name: String, size: u64, max: u64 },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Authentication error
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Resource not found
    #[error("{0}")]
    NotFound(String),

    /// Network error (retryable)
    #[error("Network error: {0}")]
    Network(String),

    /// Conflict error
    #[error("Conflict: {0}")]
    Conflict(String),

    /// General error
    #[error("{0}")]
    General(String),
}

fn human_size(bytes: &u64) -> String {
    humansize::format_size(*bytes, humansize::BINARY)
}

impl Error {
    /// Not-found error for an object key, worded like the remote API
    pub fn no_such_key() -> Self {
        Error::NotFound("The specified key does not exist.".into())
    }

    /// Not-found error for a bucket
    pub fn no_such_bucket(bucket: &str) -> Self {
        Error::NotFound(format!("The specified bucket does not exist: {bucket}"))
    }

    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::Validation(_) | Error::ArgumentConflict(_) | Error::Config(_) => 2, // UsageError
            Error::Network(_) => 3,                                                   // NetworkError
            Error::Auth(_) => 4,                                                      // AuthError
            Error::NotFound(_) => 5,                                                  // NotFound
            Error::Conflict(_) => 6,                                                  // Conflict
            Error::TooLarge { .. } => 7,                                              // TooLarge
            _ => 1,                                                                   // GeneralError
        }
    }
}
