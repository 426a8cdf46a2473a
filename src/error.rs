//! Central error types for brrr-fragcheck.
//!
//! Uses `thiserror` for ergonomic error definitions with automatic
//! `Display` and `From` implementations.
//!
//! Every verification failure is reported as exactly one [`VerifyError`].
//! The variants mirror the failure taxonomy of a run: unattributable
//! diagnostics, diagnostics in foreign files, missing capabilities, rejected
//! expressions and configuration problems. The remaining variants are
//! plumbing (IO, parsing of config files and manifests).

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::locator::SourceLocator;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum VerifyError {
    /// A diagnostic landed on a line no written entity occupies.
    #[error("Internal error at line {line} of the synthesized unit: {message}")]
    Unattributable { line: u32, message: String },

    /// The front end reported an error in a file other than the unit.
    #[error("{file}:{line}:{column}: {message}")]
    ForeignFile {
        file: String,
        line: u32,
        column: u32,
        message: String,
    },

    /// A required method, macro overload or function is missing or has the
    /// wrong signature.
    #[error("{locator}: {message}")]
    CapabilityMissing {
        locator: SourceLocator,
        message: String,
    },

    /// User code failed to compile inside its synthetic wrapper.
    #[error("{locator}: {message}")]
    Expression {
        locator: SourceLocator,
        message: String,
    },

    /// No usable C/C++ front end could be located.
    #[error("No C/C++ front end available: {0}")]
    FrontEndUnavailable(String),

    /// The front end exited unsuccessfully without a located diagnostic.
    #[error("Front end '{program}' failed ({status}): {stderr}")]
    FrontEndFailed {
        program: String,
        status: String,
        stderr: String,
    },

    /// Configuration error (e.g., unreadable or invalid fragcheck.toml)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Tree-sitter grammar could not be loaded
    #[error("Tree-sitter error: {0}")]
    TreeSitter(String),

    /// IO operation failed (without path context - prefer IoWithPath when path is available)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// IO operation failed with path context for better error messages
    #[error("IO error at {path}: {error}")]
    IoWithPath {
        error: std::io::Error,
        path: PathBuf,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// TOML config could not be parsed
    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Convenience type alias for Results using VerifyError.
pub type Result<T> = std::result::Result<T, VerifyError>;

impl VerifyError {
    /// Create an IO error with path context.
    #[inline]
    pub fn io_with_path(error: std::io::Error, path: impl AsRef<Path>) -> Self {
        VerifyError::IoWithPath {
            error,
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The user-facing origin of a fragment failure, if it has one.
    ///
    /// Foreign-file and internal errors carry no locator: they did not come
    /// from user-authored text.
    pub fn locator(&self) -> Option<&SourceLocator> {
        match self {
            VerifyError::CapabilityMissing { locator, .. }
            | VerifyError::Expression { locator, .. } => Some(locator),
            _ => None,
        }
    }

    /// Human-readable message without the location prefix.
    pub fn message(&self) -> String {
        match self {
            VerifyError::Unattributable { message, .. }
            | VerifyError::ForeignFile { message, .. }
            | VerifyError::CapabilityMissing { message, .. }
            | VerifyError::Expression { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Stable short name of the failure class, used in JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            VerifyError::Unattributable { .. } => "internal",
            VerifyError::ForeignFile { .. } => "foreign-file",
            VerifyError::CapabilityMissing { .. } => "capability-missing",
            VerifyError::Expression { .. } => "expression",
            VerifyError::FrontEndUnavailable(_) | VerifyError::Config(_) => "configuration",
            VerifyError::FrontEndFailed { .. } => "front-end",
            _ => "io",
        }
    }
}
