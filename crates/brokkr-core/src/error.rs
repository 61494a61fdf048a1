//! Error types for brokkr-core

use thiserror::Error;

/// Result type alias using brokkr-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for Brokkr
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration content
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Home directory could not be determined
    #[error("Could not determine home directory")]
    HomeDirUnavailable,

    /// Path is not valid UTF-8
    #[error("Path is not valid UTF-8: {path}")]
    NonUtf8Path { path: String },
}

impl Error {
    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a non-UTF-8 path error
    pub fn non_utf8_path(path: impl Into<String>) -> Self {
        Self::NonUtf8Path { path: path.into() }
    }
}
