//! Error handling for the Flow Studio application
//!
//! This module defines custom error types and a Result alias for use
//! throughout the application.

use thiserror::Error;

/// Main error type for Flow Studio operations
#[derive(Error, Debug)]
pub enum FlowStudioError {
    /// The backend could not be reached at all
    #[error("Cannot reach backend: {0}")]
    Connectivity(String),

    /// A request exceeded its deadline
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The backend answered with a non-success status
    #[error("Backend returned {status}: {message}")]
    Api { status: u16, message: String },

    /// HTTP-level failures that are neither timeouts nor connect errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Errors related to flow graph operations
    #[error("Flow error: {0}")]
    Flow(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to channel communication
    #[error("Channel error: {0}")]
    Channel(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<FlowStudioError>,
    },
}

impl FlowStudioError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        FlowStudioError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Classify a reqwest error into the local taxonomy
    pub fn from_request_error(err: reqwest::Error) -> Self {
        let detail = match err.url() {
            Some(url) => format!("{url}: {err}"),
            None => err.to_string(),
        };
        if err.is_timeout() {
            FlowStudioError::Timeout(detail)
        } else if err.is_connect() {
            FlowStudioError::Connectivity(detail)
        } else {
            FlowStudioError::Http(detail)
        }
    }

    /// Strip context wrappers and return the underlying error
    pub fn root_cause(&self) -> &FlowStudioError {
        match self {
            FlowStudioError::WithContext { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Result type alias for Flow Studio operations
pub type Result<T> = std::result::Result<T, FlowStudioError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, reqwest::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| FlowStudioError::from_request_error(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| FlowStudioError::from_request_error(e).with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FlowStudioError::Flow("node does not exist".to_string());
        assert_eq!(err.to_string(), "Flow error: node does not exist");
    }

    #[test]
    fn test_error_with_context() {
        let err = FlowStudioError::Flow("test".to_string());
        let with_ctx = err.with_context("Failed to connect ports");
        assert!(with_ctx.to_string().contains("Failed to connect ports"));
    }

    #[test]
    fn test_api_error_display() {
        let err = FlowStudioError::Api {
            status: 409,
            message: "flow is running".to_string(),
        };
        assert!(err.to_string().contains("409"));
        assert!(err.to_string().contains("flow is running"));
    }

    #[test]
    fn test_root_cause_unwraps_context() {
        let err = FlowStudioError::Timeout("component types".to_string())
            .with_context("refresh")
            .with_context("startup");
        assert!(matches!(err.root_cause(), FlowStudioError::Timeout(_)));
    }
}
