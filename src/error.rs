//! Error types for tfinventory.
//!
//! This module defines the error hierarchy using `thiserror`. Every variant
//! records the source location where it was raised so that failures in a
//! user's template or state file can be traced back quickly.
//!
//! # Error Categories
//!
//! - **I/O errors**: the state file cannot be read
//! - **State errors**: the state document is not valid JSON or has an
//!   unsupported layout
//! - **Template errors**: a user template fails to compile or evaluate
//! - **Config errors**: invalid configuration files or values
//! - **Resource errors**: recoverable, scoped to a single resource or line
//!
//! Fatal errors abort the run. Resource errors are collected as warnings by
//! the inventory assembler and never abort the run (see
//! [`TfInventoryError::is_recoverable`]).
//!
//! # Example
//!
//! ```rust
//! use tfinventory::error::{TfInventoryError, Result};
//!
//! fn read_state(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .map_err(|e| TfInventoryError::io(path, e, file!(), line!()))
//! }
//! ```

use crate::types::TemplateRole;
use std::path::PathBuf;
use thiserror::Error;

/// Macro to create errors with automatic source location tracking.
///
/// Usage:
/// ```ignore
/// return Err(err!(ConfigMissing { key: "state".to_string() }));
/// return Err(err!(UnsupportedStateVersion { version }));
/// ```
#[macro_export]
macro_rules! err {
    ($variant:ident { $($field:ident $(: $value:expr)?),* $(,)? }) => {
        $crate::error::TfInventoryError::$variant {
            $($field $(: $value)?,)*
            src_path: file!(),
            src_line: line!(),
        }
    };
}

/// A specialized Result type for tfinventory operations.
pub type Result<T> = std::result::Result<T, TfInventoryError>;

/// The main error type for tfinventory.
#[derive(Error, Debug)]
pub enum TfInventoryError {
    // =========================================================================
    // I/O and File System Errors
    // =========================================================================
    /// I/O error with path context.
    #[error("I/O error at '{path}' ({src_path}:{src_line}): {source}")]
    Io {
        /// The path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// File not found.
    #[error("File not found: {path} ({src_path}:{src_line})")]
    FileNotFound {
        /// The missing file path
        path: PathBuf,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // State Errors
    // =========================================================================
    /// The state document is not valid JSON or does not match any known layout.
    #[error("Failed to parse Terraform state ({src_path}:{src_line}): {message}")]
    StateParse {
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// The state document declares a format version we cannot read.
    #[error("Unsupported Terraform state version {version} ({src_path}:{src_line})")]
    UnsupportedStateVersion {
        /// The declared `version` field
        version: u64,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Template Errors
    // =========================================================================
    /// A template failed to compile or raised during evaluation.
    #[error("Template error in {role} template{} ({src_path}:{src_line}): {message}", resource_suffix(.resource))]
    Template {
        /// Which of the four templates failed
        role: TemplateRole,
        /// The resource being rendered, `None` for compile-time failures
        resource: Option<String>,
        /// Error message, including the engine's cause chain
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Resource-scoped Errors
    // =========================================================================
    /// A flat attribute key cannot be expanded.
    #[error("Malformed attribute key '{key}' in resource '{resource}' ({src_path}:{src_line}): {reason}")]
    MalformedAttributeKey {
        /// The resource owning the attribute
        resource: String,
        /// The offending flat key
        key: String,
        /// Why the key was rejected
        reason: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// The filter template rendered something other than `True` or `False`.
    #[error("Filter template returned '{output}' for resource '{resource}', expected 'True' or 'False' ({src_path}:{src_line})")]
    InvalidFilterResult {
        /// The resource being filtered
        resource: String,
        /// The trimmed rendered output
        output: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// The name template rendered an empty string.
    #[error("Inventory name template rendered an empty name for resource '{resource}' ({src_path}:{src_line})")]
    EmptyInventoryName {
        /// The resource being named
        resource: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// A host-vars line is not a `key=value` pair.
    #[error("Invalid host_vars line '{line}' for resource '{resource}', expected 'key=value' ({src_path}:{src_line})")]
    InvalidHostVarLine {
        /// The resource being rendered
        resource: String,
        /// The trimmed offending line
        line: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration parsing error.
    #[error("Failed to parse configuration ({src_path}:{src_line}): {message}")]
    ConfigParse {
        /// Error message
        message: String,
        /// The underlying error (if any)
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}' ({src_path}:{src_line}): {message}")]
    ConfigValue {
        /// The configuration key
        key: String,
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Missing required configuration.
    #[error("Missing required configuration: {key} ({src_path}:{src_line})")]
    ConfigMissing {
        /// The missing configuration key
        key: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Output Errors
    // =========================================================================
    /// Inventory serialization error.
    #[error("Failed to generate inventory output ({src_path}:{src_line}): {message}")]
    ReportGeneration {
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },
}

impl TfInventoryError {
    /// Creates an `Io` error, mapping `NotFound` to `FileNotFound`.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error, src_path: &'static str, src_line: u32) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::FileNotFound { path, src_path, src_line };
        }
        Self::Io { path, source, src_path, src_line }
    }

    /// Creates a `StateParse` error.
    #[must_use]
    pub fn state_parse(message: String, src_path: &'static str, src_line: u32) -> Self {
        Self::StateParse { message, src_path, src_line }
    }

    /// Creates a `ConfigParse` error.
    #[must_use]
    pub fn config_parse(message: String, source: Option<Box<dyn std::error::Error + Send + Sync>>, src_path: &'static str, src_line: u32) -> Self {
        Self::ConfigParse { message, source, src_path, src_line }
    }

    /// Determines if the error is scoped to a single resource or line, so the
    /// run can skip it and continue.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MalformedAttributeKey { .. }
                | Self::InvalidFilterResult { .. }
                | Self::EmptyInventoryName { .. }
                | Self::InvalidHostVarLine { .. }
        )
    }

    /// Returns the resource a recoverable error is scoped to.
    #[must_use]
    pub fn resource(&self) -> Option<&str> {
        match self {
            Self::MalformedAttributeKey { resource, .. }
            | Self::InvalidFilterResult { resource, .. }
            | Self::EmptyInventoryName { resource, .. }
            | Self::InvalidHostVarLine { resource, .. } => Some(resource),
            Self::Template { resource, .. } => resource.as_deref(),
            _ => None,
        }
    }

    /// Returns the appropriate exit code for the error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io { source, .. } if source.kind() == std::io::ErrorKind::PermissionDenied => 13,
            Self::FileNotFound { .. } => 14,
            Self::StateParse { .. } | Self::UnsupportedStateVersion { .. } => 15,
            Self::Template { .. } => 16,
            Self::ConfigParse { .. } => 18,
            Self::ConfigValue { .. } => 19,
            Self::ConfigMissing { .. } => 20,
            _ => 1,
        }
    }
}

/// Extension trait for `Result` to add context to errors.
pub trait ResultExt<T, E> {
    /// Adds a file path context to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;

    /// Converts a general error into a `ConfigParse` error with context.
    fn to_config_parse_error(self, message: String) -> Result<T>;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E>
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| {
            let source = e
                .into()
                .downcast::<std::io::Error>()
                .map_or_else(std::io::Error::other, |e| *e);
            TfInventoryError::io(path, source, file!(), line!())
        })
    }

    fn to_config_parse_error(self, message: String) -> Result<T> {
        self.map_err(|e| TfInventoryError::config_parse(message, Some(e.into()), file!(), line!()))
    }
}

fn resource_suffix(resource: &Option<String>) -> String {
    resource
        .as_ref()
        .map(|r| format!(" for resource '{r}'"))
        .unwrap_or_default()
}

impl From<serde_json::Error> for TfInventoryError {
    fn from(source: serde_json::Error) -> Self {
        Self::StateParse {
            message: format!("JSON deserialization error: {source}"),
            src_path: file!(),
            src_line: line!(),
        }
    }
}
