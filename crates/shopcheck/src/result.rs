//! Result and error types for shopcheck.

use thiserror::Error;

/// Result type for shopcheck operations
pub type CheckResult<T> = Result<T, CheckError>;

/// Errors that can occur while building or running checks
#[derive(Debug, Error)]
pub enum CheckError {
    /// Locator name outside the page model's closed set
    #[error("Unknown locator '{name}' (known: {known})")]
    UnknownLocator {
        /// Name that was asked for
        name: String,
        /// Comma-separated list of registered names
        known: String,
    },

    /// Viewport preset that does not exist
    #[error("Unknown viewport profile '{name}'")]
    UnknownViewport {
        /// Name that was asked for
        name: String,
    },

    /// Locator resolved to zero elements within the wait budget
    #[error("Element '{locator}' ({selector}) not found after {ms}ms")]
    ElementNotFound {
        /// Locator name
        locator: String,
        /// Selector used for the lookup
        selector: String,
        /// Wait budget in milliseconds
        ms: u64,
    },

    /// Page did not finish loading within budget
    #[error("Navigation to {url} timed out after {ms}ms")]
    NavigationTimeout {
        /// URL that was being loaded
        url: String,
        /// Page-load budget in milliseconds
        ms: u64,
    },

    /// Condition evaluated false at the terminal wait check
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Any other failure propagated from the automation engine
    #[error("Browser engine error: {message}")]
    Engine {
        /// Error message
        message: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Configuration or page model definition error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl CheckError {
    /// Create an engine error
    #[must_use]
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine {
            message: message.into(),
        }
    }

    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error means "the page did not behave as expected"
    /// rather than "the engine broke".
    #[must_use]
    pub const fn is_assertion(&self) -> bool {
        matches!(
            self,
            Self::AssertionFailed { .. } | Self::ElementNotFound { .. }
        )
    }
}
