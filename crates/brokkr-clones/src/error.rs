//! Error types for brokkr-clones

use thiserror::Error;

/// Result type alias using brokkr-clones's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Clone and engine registry error types
#[derive(Error, Debug)]
pub enum Error {
    /// Directory is not a valid clone
    #[error("Not a valid Brokkr clone: {path} ({reason})")]
    InvalidClone { path: String, reason: String },

    /// Clone has version control metadata but the repository is broken
    #[error("Clone at {path} has a broken repository: {message}")]
    InvalidRepoState { path: String, message: String },

    /// A required path does not exist
    #[error("Required resource missing: {path}")]
    ResourceMissing { path: String },

    /// Requested name is reserved or already taken
    #[error("Name conflict: {message}")]
    NameConflict { message: String },

    /// No engine satisfies the requested version
    #[error("Engine not available: {requested}")]
    EngineNotFound { requested: String },

    /// Git command not found
    #[error("Git command not found. Please ensure git is installed and in PATH")]
    GitNotFound,

    /// Git operation failed
    #[error("Git operation failed: {message}")]
    GitOperation { message: String },

    /// Image download failed
    #[error("Failed to download {url}: {message}")]
    DownloadFailed { url: String, message: String },

    /// Image extraction failed
    #[error("Failed to extract {path}: {message}")]
    ExtractFailed { path: String, message: String },

    /// Registry lookup matched nothing
    #[error("No registered clone matches: {query}")]
    NotFound { query: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Core library error
    #[error("Core error: {0}")]
    Core(#[from] brokkr_core::Error),
}

impl Error {
    /// Create an invalid clone error
    pub fn invalid_clone(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidClone {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid repo state error
    pub fn invalid_repo_state(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRepoState {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a resource missing error
    pub fn resource_missing(path: impl Into<String>) -> Self {
        Self::ResourceMissing { path: path.into() }
    }

    /// Create a name conflict error
    pub fn name_conflict(message: impl Into<String>) -> Self {
        Self::NameConflict {
            message: message.into(),
        }
    }

    /// Create an engine not found error
    pub fn engine_not_found(requested: impl Into<String>) -> Self {
        Self::EngineNotFound {
            requested: requested.into(),
        }
    }

    /// Create a git operation error
    pub fn git_operation(message: impl Into<String>) -> Self {
        Self::GitOperation {
            message: message.into(),
        }
    }

    /// Create a download failed error
    pub fn download_failed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DownloadFailed {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create an extract failed error
    pub fn extract_failed(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExtractFailed {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(query: impl Into<String>) -> Self {
        Self::NotFound {
            query: query.into(),
        }
    }
}
