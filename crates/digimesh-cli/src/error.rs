//! Error type for the command-line tools.

use std::path::PathBuf;

use digimesh_api_protocol::ApiError;
use digimesh_at_protocol::AtError;
use digimesh_common::{CommandError, TransportError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to open serial port {port}: {source}")]
    PortOpen {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("failed to read profile {path}: {source}")]
    ProfileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid profile: {0}")]
    Profile(String),

    #[error("invalid profile YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Incomplete(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("signal handler setup failed: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("failed to start serial reader: {0}")]
    Reader(std::io::Error),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    At(#[from] AtError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
