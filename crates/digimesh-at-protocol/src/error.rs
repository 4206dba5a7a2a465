//! Error types for the command-mode protocol.

use std::time::Duration;

use digimesh_common::{Command, CommandError, TransportError};
use thiserror::Error;

/// Errors that can occur during a command-mode exchange.
#[derive(Debug, Error)]
pub enum AtError {
    /// A step that must answer `OK` answered something else.
    #[error("{command} did not reply OK (got {reply:?})")]
    NotOk { command: Command, reply: String },

    /// No reply line arrived in time.
    #[error("timeout after {timeout:?} waiting for reply to {command}")]
    ReplyTimeout { command: Command, timeout: Duration },

    /// The `GT` reply was not a hex number.
    #[error("invalid guard time reply: {0:?}")]
    InvalidGuardTime(String),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Result type alias for command-mode operations.
pub type AtResult<T> = Result<T, AtError>;
