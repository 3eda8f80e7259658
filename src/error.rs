//! Semantic error types for the devcell library.
//!
//! This module defines the error hierarchy for devcell, following the principle
//! of using semantic error enums (via `thiserror`) for conditions the caller
//! might inspect or map to a payload, while reserving opaque errors
//! (`eyre::Report`) for the binary boundary.
//!
//! Every error maps onto one [`ErrorKind`], the coarse taxonomy reported to
//! callers alongside the error message.

use std::path::PathBuf;
use std::sync::Arc;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message reported when an operation runs before a successful acquire.
pub const NO_CONTAINER_MESSAGE: &str = "No container running. Start the container first";

/// Coarse error taxonomy reported in error payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Operation attempted before a successful acquire.
    NoContainer,
    /// A path escapes the session's project directory.
    PermissionDenied,
    /// A file, directory or container is absent.
    NotFound,
    /// A caller-supplied argument was rejected.
    InvalidArgument,
    /// A block replacement found no occurrence of the search block.
    NoMatch,
    /// A block replacement found more than one occurrence of the search block.
    AmbiguousMatch,
    /// A move destination already exists.
    AlreadyExists,
    /// A bootstrap command exited non-zero.
    ProvisioningFailed,
    /// The sandbox did not become ready within the configured timeout.
    ReadinessTimeout,
    /// Configuration could not be loaded.
    ConfigError,
    /// Any underlying runtime, transport or I/O failure.
    RuntimeError,
}

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found at the expected path.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// The path where the configuration file was expected.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration file: {message}")]
    ParseError {
        /// A description of the parse error.
        message: String,
    },

    /// A required configuration value is missing.
    #[error("missing required configuration: {field}")]
    MissingRequired {
        /// The name of the missing field.
        field: String,
    },

    /// A configuration value failed validation.
    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue {
        /// The name of the invalid field.
        field: String,
        /// The reason the value is invalid.
        reason: String,
    },

    /// The `OrthoConfig` library returned an error during configuration loading.
    #[error("configuration loading failed: {0}")]
    OrthoConfig(Arc<ortho_config::OrthoError>),
}

/// Errors that can occur while talking to the container engine.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// Failed to connect to the container engine socket.
    #[error("failed to connect to container engine: {message}")]
    ConnectionFailed {
        /// A description of the connection failure.
        message: String,
    },

    /// The container engine socket was not found.
    #[error("container engine socket not found: {path}")]
    SocketNotFound {
        /// The path where the socket was expected.
        path: PathBuf,
    },

    /// Permission denied when accessing the container engine socket.
    #[error("permission denied accessing container socket: {path}")]
    PermissionDenied {
        /// The path to the socket.
        path: PathBuf,
    },

    /// Failed to create the tokio runtime used by blocking wrappers.
    #[error("failed to create async runtime: {message}")]
    RuntimeCreationFailed {
        /// A description of the failure.
        message: String,
    },

    /// Health check failed - engine did not respond correctly.
    #[error("container engine health check failed: {message}")]
    HealthCheckFailed {
        /// A description of the health check failure.
        message: String,
    },

    /// Health check timed out.
    #[error("container engine health check timed out after {seconds} seconds")]
    HealthCheckTimeout {
        /// The timeout duration in seconds.
        seconds: u64,
    },

    /// The named container does not exist.
    #[error("container '{container_id}' not found")]
    NotFound {
        /// The container name or ID that was looked up.
        container_id: String,
    },

    /// Failed to inspect an image or pull it from its registry.
    #[error("failed to pull image '{image}': {message}")]
    ImagePullFailed {
        /// The image reference.
        image: String,
        /// A description of the failure.
        message: String,
    },

    /// Failed to create a container.
    #[error("failed to create container: {message}")]
    CreateFailed {
        /// A description of the creation failure.
        message: String,
    },

    /// Failed to start a container.
    #[error("failed to start container '{container_id}': {message}")]
    StartFailed {
        /// The ID of the container that failed to start.
        container_id: String,
        /// A description of the start failure.
        message: String,
    },

    /// Failed to inspect a container.
    #[error("failed to inspect container '{container_id}': {message}")]
    InspectFailed {
        /// The ID of the container.
        container_id: String,
        /// A description of the failure.
        message: String,
    },

    /// Failed to execute a command in a container.
    #[error("failed to execute command in container '{container_id}': {message}")]
    ExecFailed {
        /// The ID of the container.
        container_id: String,
        /// A description of the execution failure.
        message: String,
    },

    /// Failed to read container logs.
    #[error("failed to read logs of container '{container_id}': {message}")]
    LogsFailed {
        /// The ID of the container.
        container_id: String,
        /// A description of the failure.
        message: String,
    },

    /// A bootstrap command exited non-zero while provisioning a sandbox.
    #[error("command failed: {command} (exit code {exit_code})\noutput: {output}")]
    ProvisioningFailed {
        /// The ID of the container being provisioned.
        container_id: String,
        /// The rendered command line.
        command: String,
        /// The exit code reported by the engine.
        exit_code: i64,
        /// Combined command output.
        output: String,
    },

    /// An in-sandbox command issued on the caller's behalf exited non-zero.
    #[error("command failed: {command} (exit code {exit_code})\noutput: {output}")]
    CommandFailed {
        /// The ID of the container.
        container_id: String,
        /// The rendered command line.
        command: String,
        /// The exit code reported by the engine.
        exit_code: i64,
        /// Combined command output.
        output: String,
    },

    /// The sandbox did not reach readiness in time.
    #[error("container '{container_id}' timed out after {millis} ms waiting for {waiting_for}")]
    ReadinessTimeout {
        /// The ID of the container.
        container_id: String,
        /// What the readiness loop was waiting for.
        waiting_for: String,
        /// The elapsed budget in milliseconds.
        millis: u128,
    },
}

/// Errors raised by workspace operations and session handling.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// An operation was attempted before a successful acquire.
    #[error("No container running. Start the container first")]
    NoContainer,

    /// The session identifier cannot name a container and a directory.
    #[error("invalid session id '{id}': {reason}")]
    InvalidSessionId {
        /// The rejected identifier.
        id: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A path resolves outside the session's project directory.
    #[error("access denied: path '{path}' is outside the workspace")]
    PermissionDenied {
        /// The caller-supplied path.
        path: String,
    },

    /// A path does not exist.
    #[error("path not found: {path}")]
    NotFound {
        /// The caller-supplied path.
        path: String,
    },

    /// A path exists but is not a regular file.
    #[error("file not found or is a directory: {path}")]
    NotAFile {
        /// The caller-supplied path.
        path: String,
    },

    /// A caller-supplied argument was rejected.
    #[error("invalid argument '{argument}': {reason}")]
    InvalidArgument {
        /// The argument name.
        argument: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The search block does not occur in the file.
    #[error(
        "search block not found in '{path}'; ensure whitespace and indentation match exactly"
    )]
    NoMatch {
        /// The file that was searched.
        path: String,
    },

    /// The search block occurs more than once in the file.
    #[error(
        "ambiguous match: block found {count} times in '{path}'; include more surrounding lines in the search block"
    )]
    AmbiguousMatch {
        /// The file that was searched.
        path: String,
        /// How many times the block occurs.
        count: usize,
    },

    /// A move destination already exists.
    #[error("destination already exists: {path}")]
    AlreadyExists {
        /// The caller-supplied destination.
        path: String,
    },

    /// A local filesystem operation failed.
    #[error("I/O error at '{path}': {message}")]
    Io {
        /// The path where the error occurred.
        path: Utf8PathBuf,
        /// A description of the I/O error.
        message: String,
    },

    /// A payload could not be encoded as JSON.
    #[error("failed to encode payload: {message}")]
    Encoding {
        /// A description of the encoding failure.
        message: String,
    },

    /// An operation panicked and was captured at the session boundary.
    #[error("operation '{operation}' failed unexpectedly: {message}")]
    Panicked {
        /// The operation name.
        operation: String,
        /// The panic payload, when it was a string.
        message: String,
    },
}

/// Top-level error type for devcell.
///
/// This enum aggregates all domain-specific errors into a single type used
/// throughout the library. At the binary boundary these errors are converted
/// to `eyre::Report`; at the session boundary they become error payloads.
#[derive(Debug, Error)]
pub enum DevcellError {
    /// An error occurred during configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An error occurred during container operations.
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// An error occurred during a workspace operation.
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}

impl DevcellError {
    /// Classify this error into the payload taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::ConfigError,
            Self::Container(error) => error.kind(),
            Self::Workspace(error) => error.kind(),
        }
    }
}

impl ContainerError {
    const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::ProvisioningFailed { .. } => ErrorKind::ProvisioningFailed,
            Self::ReadinessTimeout { .. } => ErrorKind::ReadinessTimeout,
            _ => ErrorKind::RuntimeError,
        }
    }
}

impl WorkspaceError {
    const fn kind(&self) -> ErrorKind {
        match self {
            Self::NoContainer => ErrorKind::NoContainer,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::NotFound { .. } | Self::NotAFile { .. } => ErrorKind::NotFound,
            Self::InvalidSessionId { .. } | Self::InvalidArgument { .. } => {
                ErrorKind::InvalidArgument
            }
            Self::NoMatch { .. } => ErrorKind::NoMatch,
            Self::AmbiguousMatch { .. } => ErrorKind::AmbiguousMatch,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::Io { .. } | Self::Encoding { .. } | Self::Panicked { .. } => {
                ErrorKind::RuntimeError
            }
        }
    }
}

/// A specialised `Result` type for devcell operations.
pub type Result<T> = std::result::Result<T, DevcellError>;
