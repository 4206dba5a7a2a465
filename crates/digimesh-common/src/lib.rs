//! Shared building blocks for the DigiMesh protocol crates.
//!
//! - [`Command`]: the AT command registry used by both the API frame protocol
//!   and the transparent command-mode protocol.
//! - [`Transport`] / [`ByteSink`]: the outbound and inbound seams to whatever
//!   owns the serial device.

mod command;
mod error;
mod transport;

pub use command::*;
pub use error::*;
pub use transport::*;
