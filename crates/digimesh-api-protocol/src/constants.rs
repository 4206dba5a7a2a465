//! Protocol constants
//!
//! Frame delimiters, frame type codes and fixed field values used by the
//! DigiMesh API frame protocol.

// ============================================================================
// Framing
// ============================================================================

/// First byte of every API frame.
pub const START_DELIMITER: u8 = 0x7E;

/// Bytes outside the declared length: delimiter, two length bytes, checksum.
pub const FRAME_OVERHEAD: usize = 4;

/// A valid frame's payload bytes plus checksum sum to this value (mod 256).
pub const CHECKSUM_TARGET: u8 = 0xFF;

/// Frame ID meaning "no response frame requested".
pub const NO_ACK_FRAME_ID: u8 = 0;

// ============================================================================
// Frame Types (firmware → host)
// ============================================================================

/// Response to a local AT command.
pub const FRAME_AT_COMMAND_RESPONSE: u8 = 0x88;
/// Unsolicited modem status.
pub const FRAME_MODEM_STATUS: u8 = 0x8A;
/// Delivery report for a transmit request.
pub const FRAME_TRANSMIT_STATUS: u8 = 0x8B;
/// RF data received.
pub const FRAME_RECEIVE_PACKET: u8 = 0x90;
/// RF data received with explicit addressing.
pub const FRAME_EXPLICIT_RECEIVE_PACKET: u8 = 0x91;
/// A node announced itself (commissioning button or join).
pub const FRAME_NODE_IDENTIFICATION_INDICATOR: u8 = 0x95;
/// Response to a remote AT command.
pub const FRAME_REMOTE_COMMAND_RESPONSE: u8 = 0x97;

// ============================================================================
// Frame Types (host → firmware)
// ============================================================================

/// Local AT command, applied immediately.
pub const FRAME_AT_COMMAND: u8 = 0x08;
/// Local AT command, held until an apply (`AC`) or write.
pub const FRAME_QUEUED_AT_COMMAND: u8 = 0x09;
/// Send RF data.
pub const FRAME_TRANSMIT_REQUEST: u8 = 0x10;

// ============================================================================
// Addressing and options
// ============================================================================

/// 64-bit broadcast address.
pub const BROADCAST_ADDRESS: u64 = 0x0000_0000_0000_FFFF;

/// Reserved 16-bit network address field in transmit requests.
pub const RESERVED_NETWORK_ADDRESS: [u8; 2] = [0xFF, 0xFE];

/// Broadcast radius of zero selects the maximum hop count.
pub const MAX_HOPS_BROADCAST_RADIUS: u8 = 0;

/// Transmit option bit: request a MAC acknowledgement.
pub const TX_OPTION_ENABLE_ACK: u8 = 0x01;
/// Transmit option bit: allow route discovery.
pub const TX_OPTION_ROUTE_DISCOVERY: u8 = 0x02;
