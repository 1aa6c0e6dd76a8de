//! Error types for the dashboard deployment sequencer.
//!
//! Every failure in the sequence is terminal. This module names each
//! failure and maps it to the process exit code the operator sees.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the deployment sequencer.
#[derive(Debug, Error)]
pub enum DeployError {
    /// The cluster CLI could not be found on this machine.
    #[error("{tool} is not installed or not on PATH")]
    ToolNotFound {
        /// Binary that was looked up.
        tool: String,
    },

    /// The dependent workload is missing and the operator declined to continue.
    #[error("StatefulSet '{statefulset}' not found and deployment was not confirmed")]
    DependencyAbsentDeclined {
        /// Name of the missing stateful workload.
        statefulset: String,
    },

    /// Applying the manifest failed.
    #[error("Failed to apply manifest {manifest}: {stderr}")]
    ApplyFailed {
        /// Manifest that was applied.
        manifest: PathBuf,
        /// Exit code of the cluster CLI.
        code: Option<i32>,
        /// Error output of the cluster CLI.
        stderr: String,
    },

    /// The deployment did not become available in time.
    #[error("Deployment '{deployment}' did not become available within {timeout_secs}s")]
    RolloutTimeout {
        /// Deployment that was awaited.
        deployment: String,
        /// Timeout that elapsed.
        timeout_secs: u64,
    },

    /// A cluster CLI sub-command exited unsuccessfully.
    #[error("Command `{command}` failed: {stderr}")]
    CommandFailed {
        /// Rendered command line.
        command: String,
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
        /// Error output of the command.
        stderr: String,
    },

    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// An environment override holds a value of the wrong shape.
    #[error("Invalid value for environment variable {name}: {value}")]
    InvalidEnvVar {
        /// Name of the variable.
        name: String,
        /// The rejected value.
        value: String,
    },
}

/// Result type alias for sequencer operations.
pub type Result<T> = std::result::Result<T, DeployError>;

impl DeployError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns the process exit code for this error.
    ///
    /// Sub-command failures propagate the sub-command's own code; every
    /// other failure exits with 1.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ApplyFailed { code, .. } | Self::CommandFailed { code, .. } => {
                code.map_or(1, clamp_exit_code)
            }
            _ => 1,
        }
    }
}

/// Maps an arbitrary child exit code onto the 1..=255 range.
fn clamp_exit_code(code: i32) -> u8 {
    match u8::try_from(code) {
        Ok(0) | Err(_) => 1,
        Ok(c) => c,
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a validation error without a specific field.
    #[must_use]
    pub fn validation_general(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: None,
        }
    }
}
