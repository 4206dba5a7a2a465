//! DigiMesh Transparent-Mode AT Protocol
//!
//! This crate configures DigiMesh radios through their text command mode,
//! the only way to talk to a radio that is not (yet) in API mode.
//!
//! # Protocol Overview
//!
//! - **Escape**: `+++` surrounded by guard-time silence, answered by `OK`
//! - **Commands** (host → radio): `AT<code><params>\r`
//! - **Replies** (radio → host): one line per command, terminated by `\r`
//! - **Exit**: `ATCN\r`, answered by `OK`
//!
//! # Example
//!
//! ```rust,ignore
//! use digimesh_at_protocol::{CommandModeSession, SessionConfig};
//! use digimesh_common::Command;
//!
//! let mut session = CommandModeSession::new(transport, SessionConfig::default());
//! serial.start_reader(session.inbox());
//!
//! let reply = session.send_command(Command::NodeIdentifier, b"")?;
//! println!("{}", reply);
//! ```

mod codec;
mod config;
mod error;
mod responses;
mod session;

pub use codec::*;
pub use config::*;
pub use error::*;
pub use responses::*;
pub use session::*;
