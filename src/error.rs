//! Error handling for the properties exporter
//!
//! This module defines custom error types and a Result alias for use
//! throughout the crate.

use crate::types::NodeHandle;
use thiserror::Error;

/// Main error type for properties exporter operations
#[derive(Error, Debug)]
pub enum ExporterError {
    /// Errors related to configuration loading/parsing
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parse errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A property could not be read from a node
    #[error("Failed to read property '{key}' from {node}: {message}")]
    Property {
        node: NodeHandle,
        key: String,
        message: String,
    },

    /// A property task could not be opened on a node
    #[error("Property task unavailable on {0}")]
    TaskUnavailable(NodeHandle),

    /// The node is not (or no longer) present in the device network
    #[error("{0} is not available in the device network")]
    NodeUnavailable(NodeHandle),

    /// No matching node was found before the discovery deadline
    #[error("No target device found within {timeout_ms} ms")]
    DiscoveryTimeout { timeout_ms: u64 },

    /// The target node cannot supply a property that must be dumped
    #[error("{node} cannot supply property '{property}'")]
    CapabilityMismatch { node: NodeHandle, property: String },

    /// Errors related to the output sink
    #[error("Sink error: {0}")]
    Sink(String),

    /// Errors related to channel communication
    #[error("Channel error: {0}")]
    Channel(String),

    /// The hand-off queue closed before the expected number of rows arrived
    #[error("Exporter received {received} of {expected} rows")]
    Starved { expected: u64, received: u64 },

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ExporterError>,
    },
}

impl ExporterError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ExporterError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a property read error
    pub fn property(node: NodeHandle, key: impl Into<String>, message: impl Into<String>) -> Self {
        ExporterError::Property {
            node,
            key: key.into(),
            message: message.into(),
        }
    }

    /// Strip any context wrappers and return the underlying error
    pub fn root(&self) -> &ExporterError {
        match self {
            ExporterError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type alias for properties exporter operations
pub type Result<T> = std::result::Result<T, ExporterError>;

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

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ExporterError::Io(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| ExporterError::Io(e).with_context(f()))
    }
}
