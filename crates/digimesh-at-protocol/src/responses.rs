//! Replies from the radio in command mode.

use std::fmt;

/// The literal success reply.
pub const OK_REPLY: &[u8] = b"OK";

/// One reply line, tagged with the descriptor of the command that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtReply {
    /// Human name of the command, e.g. `"Node Identifier"`.
    pub descriptor: &'static str,
    /// Line contents without the terminator.
    pub payload: Vec<u8>,
}

impl AtReply {
    pub fn new(descriptor: &'static str, payload: Vec<u8>) -> Self {
        AtReply {
            descriptor,
            payload,
        }
    }

    /// True only for a payload of exactly `OK`.
    pub fn is_ok(&self) -> bool {
        self.payload == OK_REPLY
    }

    /// Payload as text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }

    /// Payload read as a hex number, the format of every numeric query.
    pub fn hex_value(&self) -> Option<u64> {
        parse_hex(&self.payload)
    }
}

/// Parse a hex reply such as `3E8`. Surrounding whitespace is ignored.
pub fn parse_hex(payload: &[u8]) -> Option<u64> {
    let text = std::str::from_utf8(payload).ok()?.trim();
    if text.is_empty() {
        return None;
    }
    u64::from_str_radix(text, 16).ok()
}

impl fmt::Display for AtReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.descriptor, self.text())
    }
}
