//! Protocol error types.

use digimesh_common::{CommandError, TransportError};
use thiserror::Error;

/// Errors that can occur when building or sending API frames.
///
/// Inbound framing problems are never reported here; the assembler recovers
/// from them on its own.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The command cannot be encoded.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Frame payload does not fit the 16-bit length field.
    #[error("frame too long: maximum {max} bytes, got {actual}")]
    FrameTooLong {
        /// Maximum allowed length.
        max: usize,
        /// Actual length requested.
        actual: usize,
    },

    /// Text could not be parsed as a 64-bit hex address.
    #[error("invalid 64-bit address: {0:?}")]
    InvalidAddress(String),

    /// The transport rejected the write.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Result type alias for API frame operations.
pub type ApiResult<T> = Result<T, ApiError>;
