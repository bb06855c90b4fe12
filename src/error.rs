//! Error handling for simtrace-rs
//!
//! This module defines the crate error type and a Result alias.
//!
//! Structural problems inside a trace file (an unknown `sample_size`, a
//! truncated trailing record) are *not* errors: decoders stop walking and keep
//! what they decoded so far. The variants here cover I/O, configuration and
//! misuse of the decoding API.

use thiserror::Error;

/// Main error type for simtrace-rs operations
#[derive(Error, Debug)]
pub enum TraceError {
    /// IO errors (missing or unreadable trace files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to exporting decoded tables
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A decoder was asked to window over a column it does not expose
    #[error("Unsupported time variable '{variable}' for {decoder} (expected one of: {expected})")]
    UnsupportedTimeVariable {
        variable: String,
        decoder: &'static str,
        expected: String,
    },

    /// Two payload shapes of one format share a byte width
    #[error("Payload width {width} registered twice ('{existing}' and '{duplicate}')")]
    DuplicatePayloadWidth {
        width: usize,
        existing: String,
        duplicate: String,
    },

    /// The discriminator index does not name an integer field of the header
    #[error("Invalid discriminator index {index} for header '{layout}'")]
    InvalidDiscriminatorIndex { index: usize, layout: &'static str },

    /// A row was pushed with the wrong number of cells
    #[error("Row has {actual} cells but the frame has {expected} columns")]
    ColumnMismatch { expected: usize, actual: usize },

    /// A requested data file does not exist in its category directory
    #[error("Missing file: {0}")]
    MissingFile(String),

    /// A requested data file resolves outside its category directory
    #[error("Invalid file selection: {0}")]
    InvalidSelection(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<TraceError>,
    },
}

impl TraceError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        TraceError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for simtrace-rs operations
pub type Result<T> = std::result::Result<T, TraceError>;

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
        self.map_err(|e| TraceError::Io(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| TraceError::Io(e).with_context(f()))
    }
}
