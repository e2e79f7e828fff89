//! Error types for react-scrape
//!
//! One top-level [`Error`] wraps a `thiserror` enum per failure class. The
//! pipeline uses [`Error::is_fatal`] to decide whether a failure stops the
//! batch or is recorded against a single page.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for react-scrape operations
#[derive(Error, Debug)]
pub enum Error {
    /// Driver or browser binary could not be resolved
    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    /// Browser launch or navigation errors
    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),

    /// The UI-automation sequence did not yield rendered HTML
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// HTML could not be turned into text
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Artifact store failures
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// ChromiumOxide errors
    #[error("CDP error: {0}")]
    Cdp(String),
}

/// Driver/browser discovery errors
#[derive(Error, Debug)]
pub enum ResolutionError {
    /// The driver manager could not be started at all
    #[error("Failed to run driver manager `{program}`: {reason}")]
    ManagerUnavailable {
        /// Program that was invoked
        program: String,
        /// Underlying failure
        reason: String,
    },

    /// Output did not contain a driver path line
    #[error("Driver not found for browser `{0}`")]
    DriverNotFound(String),

    /// Output did not contain a browser path line
    #[error("Browser binary not found for browser `{0}`")]
    BrowserNotFound(String),
}

/// Navigation errors
#[derive(Error, Debug)]
pub enum NavigationError {
    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to launch browser
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    /// Page load failed
    #[error("Page load failed: {0}")]
    LoadFailed(String),

    /// Navigation timeout
    #[error("Navigation timed out after {0}ms")]
    Timeout(u64),
}

/// Errors from the devtools copy sequence
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Clipboard held no text after the menu sequence
    #[error("Clipboard is empty after the copy sequence")]
    EmptyClipboard,

    /// Clipboard text is not markup
    #[error("Clipboard does not contain HTML (starts with {preview:?})")]
    NotHtml {
        /// First characters of the clipboard text
        preview: String,
    },

    /// Clipboard access failed
    #[error("Clipboard access failed: {0}")]
    Clipboard(String),

    /// Simulated keyboard/mouse input failed
    #[error("Input injection failed: {0}")]
    Input(String),

    /// The whole attempt exceeded its wall-clock budget
    #[error("Extraction attempt timed out after {0}ms")]
    Timeout(u64),
}

/// HTML-to-text conversion errors
#[derive(Error, Debug)]
pub enum ConversionError {
    /// Selector cannot be applied
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// Markdown rendering failed
    #[error("Text rendering failed: {0}")]
    RenderFailed(String),
}

/// Artifact store errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Directory could not be created or listed
    #[error("Cannot access directory {path}: {source}")]
    Directory {
        /// Directory path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Artifact could not be written
    #[error("Cannot write {path}: {source}")]
    Write {
        /// Artifact path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Artifact could not be read
    #[error("Cannot read {path}: {source}")]
    Read {
        /// Artifact path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A configured directory path exists but is a file
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Both content kinds were mapped to the same directory
    #[error("HTML and text artifacts share the directory {0}")]
    SharedDirectory(PathBuf),
}

/// Result type alias for react-scrape operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error from a string
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create a CDP error from a string
    pub fn cdp<S: Into<String>>(msg: S) -> Self {
        Error::Cdp(msg.into())
    }

    /// Whether this error stops the whole batch.
    ///
    /// Environmental problems (no driver, unwritable storage, bad config or
    /// selector) fail identically for every page, so retrying per page is
    /// pointless.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::Resolution(_) | Error::Storage(_) | Error::Config(_) => true,
            Error::Conversion(ConversionError::InvalidSelector(_)) => true,
            Error::Navigation(_) | Error::Extraction(_) | Error::Conversion(_) | Error::Cdp(_) => {
                false
            }
        }
    }

    /// Whether a fresh browser session might succeed where this one failed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Extraction(_))
    }
}

/// Convert chromiumoxide errors
impl From<chromiumoxide::error::CdpError> for Error {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Error::Cdp(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}
