// src/errors.rs

//! Crate-wide error aliases plus the container adapter's error taxonomy.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipestepError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid workflow file: {0}")]
    WorkflowError(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Setup failed: {0}")]
    Setup(#[from] SetupError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure to bring up the session container. Fatal to the session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error("container runtime unreachable: {0}")]
    RuntimeUnreachable(String),

    #[error("image '{image}' could not be resolved: {reason}")]
    ImageUnavailable { image: String, reason: String },

    #[error("invalid mount source '{path}': {reason}")]
    InvalidMount { path: String, reason: String },

    #[error("container failed to start: {0}")]
    StartFailed(String),
}

/// Failure to dispatch a command into the container at all.
///
/// A non-zero exit code from the command itself is *not* an
/// `ExecutionError`; it is an ordinary `StepResult`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("no container is running")]
    NoContainer,

    #[error("runtime call could not be dispatched: {0}")]
    Dispatch(String),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PipestepError>;
