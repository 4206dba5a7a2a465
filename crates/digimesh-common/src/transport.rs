//! The seam between the protocol engines and the byte transport.
//!
//! The transport owns the device and its receive thread. It hands every chunk
//! of received bytes to a [`ByteSink`] (any length, any timing) and accepts
//! outbound buffers through [`Transport::write`].

use std::sync::Arc;

use crate::error::TransportError;

/// Outbound half of a serial link.
pub trait Transport: Send + Sync {
    /// Send `bytes` to the device. Best effort; failures are transport faults.
    fn write(&self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Liveness probe.
    fn is_open(&self) -> bool;
}

/// Inbound half: receives raw bytes from the transport's receive path.
///
/// Implementations must not block for long and must never call back into
/// user code.
pub trait ByteSink: Send + Sync {
    fn deliver(&self, bytes: &[u8]);
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn write(&self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write(bytes)
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write(bytes)
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }
}

impl<S: ByteSink + ?Sized> ByteSink for Arc<S> {
    fn deliver(&self, bytes: &[u8]) {
        (**self).deliver(bytes)
    }
}
