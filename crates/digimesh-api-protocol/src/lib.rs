//! DigiMesh API Frame Protocol
//!
//! This crate speaks the binary API mode of DigiMesh radio modules (`AP=1`).
//! Every exchange with the radio is a checksummed frame:
//!
//! ```text
//! 0x7E | len_hi | len_lo | type | payload ... | checksum
//! ```
//!
//! # Protocol Overview
//!
//! - **Requests** (host → radio): local AT commands (0x08), queued AT
//!   commands (0x09) and transmit requests (0x10). A non-zero frame ID asks
//!   the radio to answer with a status or response frame carrying that ID.
//! - **Messages** (radio → host): AT command responses, modem status,
//!   transmit status, received RF data, node identification and remote command
//!   responses. Anything else is passed through as a [`RawFrame`].
//!
//! # Example
//!
//! ```rust,ignore
//! use digimesh_api_protocol::{ApiSession, ReceivePacket, TransmitRequestOptions};
//!
//! let mut session = ApiSession::new(transport);
//! serial.start_reader(session.inbox());
//!
//! session.handlers().register(|p: &ReceivePacket| println!("{}", p));
//! session.send_transmit_request(&TransmitRequestOptions::default(), b"hello", true)?;
//!
//! loop {
//!     session.drain_and_dispatch();
//! }
//! ```

mod constants;
mod dispatch;
mod error;
mod frame;
mod frame_id;
mod messages;
mod requests;
mod session;
mod types;

pub use constants::*;
pub use dispatch::*;
pub use error::*;
pub use frame::*;
pub use frame_id::*;
pub use messages::*;
pub use requests::*;
pub use session::*;
pub use types::*;
