//! Frames received from the radio, decoded into typed messages.
//!
//! Decoding never fails. Every decoder reads fixed offsets out of the frame
//! data; bytes past the end of a short frame read as zero and missing tails
//! come back empty. Frame types without a decoder surface as
//! [`Message::Raw`].

use std::fmt;

use crate::constants::*;
use crate::frame::RawFrame;
use crate::types::format_address;

/// Size of the 0x95 header in front of the node-discovery payload: type,
/// 64-bit sender, 16-bit sender network address, receive options.
const NODE_IDENTIFICATION_HEADER_LEN: usize = 12;

/// Fixed bytes of a node-discovery payload around the identifier: network
/// address (2), address (8), NUL (1), trailer (8).
const DISCOVERY_FIXED_LEN: usize = 19;

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    AtCommandResponse(AtCommandResponse),
    ModemStatus(ModemStatus),
    TransmitStatus(TransmitStatus),
    ReceivePacket(ReceivePacket),
    ExplicitReceivePacket(ExplicitReceivePacket),
    NodeIdentificationIndicator(NodeIdentificationIndicator),
    RemoteCommandResponse(RemoteCommandResponse),
    /// Any frame type without a decoder.
    Raw(RawFrame),
}

impl Message {
    /// Decode a frame by its type byte.
    pub fn decode(frame: RawFrame) -> Message {
        let data = frame.data.as_slice();
        match frame.frame_type {
            FRAME_AT_COMMAND_RESPONSE => Message::AtCommandResponse(AtCommandResponse::decode(data)),
            FRAME_MODEM_STATUS => Message::ModemStatus(ModemStatus::decode(data)),
            FRAME_TRANSMIT_STATUS => Message::TransmitStatus(TransmitStatus::decode(data)),
            FRAME_RECEIVE_PACKET => Message::ReceivePacket(ReceivePacket::decode(data)),
            FRAME_EXPLICIT_RECEIVE_PACKET => {
                Message::ExplicitReceivePacket(ExplicitReceivePacket::decode(data))
            }
            FRAME_NODE_IDENTIFICATION_INDICATOR => {
                Message::NodeIdentificationIndicator(NodeIdentificationIndicator::decode(data))
            }
            FRAME_REMOTE_COMMAND_RESPONSE => {
                Message::RemoteCommandResponse(RemoteCommandResponse::decode(data))
            }
            _ => Message::Raw(frame),
        }
    }

    /// Short name of the variant, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Message::AtCommandResponse(_) => "AtCommandResponse",
            Message::ModemStatus(_) => "ModemStatus",
            Message::TransmitStatus(_) => "TransmitStatus",
            Message::ReceivePacket(_) => "ReceivePacket",
            Message::ExplicitReceivePacket(_) => "ExplicitReceivePacket",
            Message::NodeIdentificationIndicator(_) => "NodeIdentificationIndicator",
            Message::RemoteCommandResponse(_) => "RemoteCommandResponse",
            Message::Raw(_) => "Raw",
        }
    }
}

// ============================================================================
// Field readers
// ============================================================================

fn byte_at(data: &[u8], index: usize) -> u8 {
    data.get(index).copied().unwrap_or(0)
}

fn be_u16_at(data: &[u8], index: usize) -> u16 {
    (u16::from(byte_at(data, index)) << 8) | u16::from(byte_at(data, index + 1))
}

fn be_u64_at(data: &[u8], index: usize) -> u64 {
    (0..8).fold(0u64, |acc, i| (acc << 8) | u64::from(byte_at(data, index + i)))
}

fn tail_from(data: &[u8], index: usize) -> Vec<u8> {
    data.get(index..).map(<[u8]>::to_vec).unwrap_or_default()
}

// ============================================================================
// Message types
// ============================================================================

/// Response to a local AT command (0x88).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtCommandResponse {
    pub id: u8,
    pub command: [u8; 2],
    /// 0 = OK, 1 = error, 2 = invalid command, 3 = invalid parameter.
    pub status: u8,
    pub data: Vec<u8>,
}

impl AtCommandResponse {
    /// Decode from frame data: id, command, status, then the value.
    pub fn decode(data: &[u8]) -> Self {
        AtCommandResponse {
            id: byte_at(data, 1),
            command: [byte_at(data, 2), byte_at(data, 3)],
            status: byte_at(data, 4),
            data: tail_from(data, 5),
        }
    }

    /// The two-letter command as text.
    pub fn command_str(&self) -> String {
        String::from_utf8_lossy(&self.command).into_owned()
    }

    /// Whether the radio accepted the command.
    pub fn is_ok(&self) -> bool {
        self.status == 0
    }
}

/// Unsolicited modem status (0x8A).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModemStatus {
    pub status: u8,
}

impl ModemStatus {
    /// Decode from frame data; the status is the only field.
    pub fn decode(data: &[u8]) -> Self {
        ModemStatus {
            status: byte_at(data, 1),
        }
    }
}

/// Delivery report for a transmit request (0x8B).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmitStatus {
    pub id: u8,
    pub retry_count: u8,
    pub delivery_status: u8,
    pub discovery_status: u8,
}

impl TransmitStatus {
    /// Decode from frame data.
    pub fn decode(data: &[u8]) -> Self {
        // Bytes 2..4 are the reserved 16-bit network address.
        TransmitStatus {
            id: byte_at(data, 1),
            retry_count: byte_at(data, 4),
            delivery_status: byte_at(data, 5),
            discovery_status: byte_at(data, 6),
        }
    }

    /// Whether the destination acknowledged the packet.
    pub fn delivered(&self) -> bool {
        self.delivery_status == 0
    }
}

/// RF data received (0x90).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivePacket {
    /// First byte after the type; this is the sender address MSB.
    pub id: u8,
    pub source_address: u64,
    pub receive_options: u8,
    pub data: Vec<u8>,
}

impl ReceivePacket {
    /// Decode from frame data: 8-byte sender, reserved 16-bit address,
    /// options at 11, RF data from 12.
    pub fn decode(data: &[u8]) -> Self {
        ReceivePacket {
            id: byte_at(data, 1),
            source_address: be_u64_at(data, 1),
            receive_options: byte_at(data, 11),
            data: tail_from(data, 12),
        }
    }
}

/// RF data received with explicit addressing (0x91).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplicitReceivePacket {
    pub source_address: u64,
    pub source_endpoint: u8,
    pub destination_endpoint: u8,
    pub cluster_id: u16,
    pub profile_id: u16,
    pub receive_options: u8,
    pub data: Vec<u8>,
}

impl ExplicitReceivePacket {
    /// Decode from frame data.
    pub fn decode(data: &[u8]) -> Self {
        ExplicitReceivePacket {
            source_address: be_u64_at(data, 1),
            source_endpoint: byte_at(data, 11),
            destination_endpoint: byte_at(data, 12),
            cluster_id: be_u16_at(data, 13),
            profile_id: be_u16_at(data, 15),
            receive_options: byte_at(data, 17),
            data: tail_from(data, 18),
        }
    }
}

/// A node's identification record, from a 0x95 frame or an `ND` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentificationIndicator {
    pub source_network_address: u16,
    pub source_address: u64,
    pub network_identifier: String,
    pub parent_network_address: u16,
    pub device_type: u8,
    pub status: u8,
    pub profile_id: u16,
    pub manufacturer_id: u16,
}

impl NodeIdentificationIndicator {
    /// Decode a full 0x95 frame.
    pub fn decode(data: &[u8]) -> Self {
        let payload = data.get(NODE_IDENTIFICATION_HEADER_LEN..).unwrap_or_default();
        Self::from_discovery_payload(payload)
    }

    /// Decode a node-discovery payload, as carried in the data of an `ND`
    /// [`AtCommandResponse`]:
    ///
    /// ```text
    /// net addr (2) | address (8) | identifier (n) | NUL | parent (2) |
    /// device type | status | profile (2) | manufacturer (2)
    /// ```
    ///
    /// The identifier length is the payload length minus 19.
    pub fn from_discovery_payload(payload: &[u8]) -> Self {
        let identifier_len = payload.len().saturating_sub(DISCOVERY_FIXED_LEN);
        let identifier = payload.get(10..10 + identifier_len).unwrap_or_default();
        // Skip identifier and its NUL
        let trailer = 10 + identifier_len + 1;

        NodeIdentificationIndicator {
            source_network_address: be_u16_at(payload, 0),
            source_address: be_u64_at(payload, 2),
            network_identifier: String::from_utf8_lossy(identifier).into_owned(),
            parent_network_address: be_u16_at(payload, trailer),
            device_type: byte_at(payload, trailer + 2),
            status: byte_at(payload, trailer + 3),
            profile_id: be_u16_at(payload, trailer + 4),
            manufacturer_id: be_u16_at(payload, trailer + 6),
        }
    }

    /// Inverse of [`Self::from_discovery_payload`].
    pub fn to_discovery_payload(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(DISCOVERY_FIXED_LEN + self.network_identifier.len());
        buf.extend_from_slice(&self.source_network_address.to_be_bytes());
        buf.extend_from_slice(&self.source_address.to_be_bytes());
        buf.extend_from_slice(self.network_identifier.as_bytes());
        buf.push(0x00);
        buf.extend_from_slice(&self.parent_network_address.to_be_bytes());
        buf.push(self.device_type);
        buf.push(self.status);
        buf.extend_from_slice(&self.profile_id.to_be_bytes());
        buf.extend_from_slice(&self.manufacturer_id.to_be_bytes());
        buf
    }
}

/// Response to a remote AT command (0x97).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommandResponse {
    pub id: u8,
    pub source_address: u64,
    pub command: [u8; 2],
    pub status: u8,
    pub data: Vec<u8>,
}

impl RemoteCommandResponse {
    /// Decode from frame data; bytes 10..12 are the sender's 16-bit address.
    pub fn decode(data: &[u8]) -> Self {
        RemoteCommandResponse {
            id: byte_at(data, 1),
            source_address: be_u64_at(data, 2),
            command: [byte_at(data, 12), byte_at(data, 13)],
            status: byte_at(data, 14),
            data: tail_from(data, 15),
        }
    }
}

// ============================================================================
// Display
// ============================================================================

fn write_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    for b in bytes {
        write!(f, "{:02X}", b)?;
    }
    Ok(())
}

impl fmt::Display for AtCommandResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AT response id={} cmd={} status={} data=",
            self.id,
            self.command_str(),
            self.status
        )?;
        write_hex(f, &self.data)
    }
}

impl fmt::Display for TransmitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "transmit status id={} retries={} delivery=0x{:02X} discovery=0x{:02X}",
            self.id, self.retry_count, self.delivery_status, self.discovery_status
        )
    }
}

impl fmt::Display for ReceivePacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "receive from {} options=0x{:02X} data=",
            format_address(self.source_address),
            self.receive_options
        )?;
        write_hex(f, &self.data)
    }
}

impl fmt::Display for NodeIdentificationIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "node {} ({:?}) parent=0x{:04X} type={} status={} profile=0x{:04X} manufacturer=0x{:04X}",
            format_address(self.source_address),
            self.network_identifier,
            self.parent_network_address,
            self.device_type,
            self.status,
            self.profile_id,
            self.manufacturer_id
        )
    }
}
