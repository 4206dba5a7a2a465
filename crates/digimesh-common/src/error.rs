//! Error types shared by the protocol crates.

use thiserror::Error;

use crate::command::Command;

/// Errors raised while resolving a command against the registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// No registry entry carries this wire code.
    #[error("unknown AT command: {0:?}")]
    Unknown(String),

    /// The command exists but the registry table has no entry for it.
    #[error("AT command {0:?} is not registered")]
    Unregistered(Command),

    /// The command cannot be expressed as a two-character code.
    #[error("{0:?} has no two-character wire code")]
    NoWireCode(Command),
}

/// Errors surfaced by a byte transport.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The transport is not open.
    #[error("transport is closed")]
    Closed,

    /// The underlying device failed.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other write failure reported by the transport.
    #[error("transport write failed: {0}")]
    Write(String),
}
