//! Frame assembly and checksum utilities.
//!
//! Every API frame on the wire has the same envelope:
//!
//! ```text
//! +------+--------+--------+------+------------------+----------+
//! | 0x7E | len_hi | len_lo | type | payload ...      | checksum |
//! +------+--------+--------+------+------------------+----------+
//! ```
//!
//! `len` counts the bytes from `type` to the end of the payload. The checksum
//! is `0xFF` minus the low byte of the sum of those bytes, so a receiver can
//! validate a frame by checking that payload plus checksum sums to `0xFF`.

use tracing::{trace, warn};

use crate::constants::*;
use crate::error::{ApiError, ApiResult};

/// One complete, checksum-validated frame as it came off the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFrame {
    /// Declared payload length (type byte + body, checksum excluded).
    pub length: u16,
    /// The frame type byte, also `data[0]`.
    pub frame_type: u8,
    /// Type byte followed by the body.
    pub data: Vec<u8>,
}

impl RawFrame {
    /// Build a frame around an already-assembled payload (type byte first).
    pub fn from_payload(data: Vec<u8>) -> ApiResult<Self> {
        let length = u16::try_from(data.len()).map_err(|_| ApiError::FrameTooLong {
            max: u16::MAX as usize,
            actual: data.len(),
        })?;
        Ok(RawFrame {
            length,
            frame_type: data.first().copied().unwrap_or_default(),
            data,
        })
    }

    /// Whether all declared payload bytes have arrived.
    pub fn is_complete(&self) -> bool {
        self.data.len() == self.length as usize
    }

    /// Checksum byte that would accompany this payload on the wire.
    pub fn checksum(&self) -> u8 {
        checksum(&self.data)
    }

    /// Serialize back to the wire envelope.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(FRAME_OVERHEAD + self.data.len());
        buf.push(START_DELIMITER);
        buf.extend_from_slice(&self.length.to_be_bytes());
        buf.extend_from_slice(&self.data);
        buf.push(self.checksum());
        buf
    }
}

/// Compute the checksum byte for a payload.
pub fn checksum(payload: &[u8]) -> u8 {
    CHECKSUM_TARGET.wrapping_sub(byte_sum(payload))
}

/// Check a payload against a received checksum byte.
pub fn checksum_is_valid(payload: &[u8], checksum: u8) -> bool {
    byte_sum(payload).wrapping_add(checksum) == CHECKSUM_TARGET
}

fn byte_sum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

// ============================================================================
// Outbound envelope
// ============================================================================

/// Builds an outbound frame: delimiter, placeholder length, payload, then
/// length and checksum filled in by [`FrameBuilder::finish`].
#[derive(Debug)]
pub struct FrameBuilder {
    buf: Vec<u8>,
}

impl FrameBuilder {
    /// Start a frame of the given type.
    pub fn new(frame_type: u8) -> Self {
        let mut buf = Vec::with_capacity(32);
        buf.push(START_DELIMITER);
        // Length placeholder
        buf.push(0x00);
        buf.push(0x00);
        buf.push(frame_type);
        FrameBuilder { buf }
    }

    /// Append one body byte.
    pub fn push(&mut self, byte: u8) -> &mut Self {
        self.buf.push(byte);
        self
    }

    /// Append body bytes.
    pub fn extend(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Append the checksum slot and fill in length and checksum.
    pub fn finish(mut self) -> ApiResult<Vec<u8>> {
        // Checksum placeholder
        self.buf.push(0x00);
        update_length(&mut self.buf)?;
        set_checksum(&mut self.buf);
        Ok(self.buf)
    }
}

/// Write the big-endian payload length (buffer length less delimiter, two
/// length bytes and checksum) into bytes 1..3.
pub(crate) fn update_length(buf: &mut [u8]) -> ApiResult<()> {
    let actual = buf.len().saturating_sub(FRAME_OVERHEAD);
    let length = u16::try_from(actual).map_err(|_| ApiError::FrameTooLong {
        max: u16::MAX as usize,
        actual,
    })?;
    buf[1..3].copy_from_slice(&length.to_be_bytes());
    Ok(())
}

/// Recompute the trailing checksum over bytes `3..len-1`.
pub(crate) fn set_checksum(buf: &mut [u8]) {
    let last = buf.len() - 1;
    buf[last] = checksum(&buf[3..last]);
}

// ============================================================================
// Inbound assembly
// ============================================================================

/// Where the assembler is within the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerState {
    /// Discarding bytes until a start delimiter.
    AwaitingStart,
    LengthHigh,
    LengthLow,
    TypeByte,
    Body,
    /// The next byte is the checksum.
    Checksum,
}

/// Counters kept by the assembler for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblerStats {
    /// Frames that passed checksum validation.
    pub frames: u64,
    /// Frames dropped because the checksum did not match.
    pub checksum_failures: u64,
    /// Frames dropped because the declared length was zero.
    pub length_errors: u64,
    /// Bytes skipped while waiting for a start delimiter.
    pub discarded_bytes: u64,
}

/// Byte-at-a-time API frame assembler.
///
/// Feed it the raw stream in any chunking; it emits each frame whose checksum
/// validates and silently drops the rest, resynchronising on the next start
/// delimiter.
#[derive(Debug)]
pub struct Assembler {
    state: AssemblerState,
    length_high: u8,
    frame: RawFrame,
    stats: AssemblerStats,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

impl Assembler {
    /// Create an assembler waiting for a start delimiter.
    pub fn new() -> Self {
        Assembler {
            state: AssemblerState::AwaitingStart,
            length_high: 0,
            frame: RawFrame::default(),
            stats: AssemblerStats::default(),
        }
    }

    /// Current parser state.
    pub fn state(&self) -> AssemblerState {
        self.state
    }

    /// Counters accumulated since creation; [`Self::reset`] keeps them.
    pub fn stats(&self) -> AssemblerStats {
        self.stats
    }

    /// Drop any partial frame and wait for the next start delimiter.
    pub fn reset(&mut self) {
        self.state = AssemblerState::AwaitingStart;
        self.length_high = 0;
        self.frame.length = 0;
        self.frame.frame_type = 0;
        self.frame.data.clear();
    }

    /// Process one byte. Returns a frame when this byte completed a valid one.
    pub fn push(&mut self, byte: u8) -> Option<RawFrame> {
        match self.state {
            AssemblerState::AwaitingStart => {
                if byte == START_DELIMITER {
                    self.state = AssemblerState::LengthHigh;
                } else {
                    self.stats.discarded_bytes += 1;
                }
            }
            AssemblerState::LengthHigh => {
                self.length_high = byte;
                self.state = AssemblerState::LengthLow;
            }
            AssemblerState::LengthLow => {
                self.frame.length = u16::from_be_bytes([self.length_high, byte]);
                if self.frame.length == 0 {
                    warn!("API frame declared zero length, resetting");
                    self.stats.length_errors += 1;
                    self.reset();
                } else {
                    self.frame.data.reserve(self.frame.length as usize);
                    self.state = AssemblerState::TypeByte;
                }
            }
            AssemblerState::TypeByte => {
                self.frame.frame_type = byte;
                self.frame.data.push(byte);
                self.state = self.after_payload_byte();
            }
            AssemblerState::Body => {
                self.frame.data.push(byte);
                self.state = self.after_payload_byte();
            }
            AssemblerState::Checksum => return self.finish(byte),
        }
        None
    }

    /// Process a chunk, returning every frame it completed in order.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<RawFrame> {
        bytes.iter().filter_map(|&b| self.push(b)).collect()
    }

    fn after_payload_byte(&self) -> AssemblerState {
        if self.frame.is_complete() {
            AssemblerState::Checksum
        } else {
            AssemblerState::Body
        }
    }

    fn finish(&mut self, checksum: u8) -> Option<RawFrame> {
        if checksum_is_valid(&self.frame.data, checksum) {
            let frame = std::mem::take(&mut self.frame);
            self.stats.frames += 1;
            trace!(
                frame_type = frame.frame_type,
                length = frame.length,
                "Assembled API frame"
            );
            self.reset();
            Some(frame)
        } else {
            warn!(
                frame_type = self.frame.frame_type,
                length = self.frame.length,
                checksum,
                "API frame checksum failed, resetting"
            );
            self.stats.checksum_failures += 1;
            self.reset();
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Modem status frame: type 0x8A, status 0x06 (coordinator started).
    const MODEM_STATUS_WIRE: [u8; 6] = [0x7E, 0x00, 0x02, 0x8A, 0x06, 0x6F];

    #[test]
    fn test_checksum_known_frame() {
        assert_eq!(checksum(&[0x8A, 0x06]), 0x6F);
        assert!(checksum_is_valid(&[0x8A, 0x06], 0x6F));
        assert!(!checksum_is_valid(&[0x8A, 0x06], 0x70));
    }

    #[test]
    fn test_assemble_single_frame() {
        let mut assembler = Assembler::new();
        let frames = assembler.feed(&MODEM_STATUS_WIRE);

        assert_eq!(frames.len(), 1);
        let frame = &frames[0];
        assert_eq!(frame.length, 2);
        assert_eq!(frame.frame_type, FRAME_MODEM_STATUS);
        assert_eq!(frame.data, vec![0x8A, 0x06]);
        assert_eq!(assembler.state(), AssemblerState::AwaitingStart);
        assert_eq!(assembler.stats().frames, 1);
    }

    #[test]
    fn test_assemble_skips_leading_garbage() {
        let mut assembler = Assembler::new();
        let mut stream = vec![0x00, 0x13, 0xA2];
        stream.extend_from_slice(&MODEM_STATUS_WIRE);

        let frames = assembler.feed(&stream);
        assert_eq!(frames.len(), 1);
        assert_eq!(assembler.stats().discarded_bytes, 3);
    }

    #[test]
    fn test_partial_frame_waits_for_more() {
        let mut assembler = Assembler::new();
        assert!(assembler.feed(&MODEM_STATUS_WIRE[..4]).is_empty());
        assert_eq!(assembler.state(), AssemblerState::Body);

        let frames = assembler.feed(&MODEM_STATUS_WIRE[4..]);
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn test_bad_checksum_is_dropped_and_next_frame_recovers() {
        let mut assembler = Assembler::new();
        let mut stream = MODEM_STATUS_WIRE.to_vec();
        stream[5] = 0x00;
        stream.extend_from_slice(&MODEM_STATUS_WIRE);

        let frames = assembler.feed(&stream);
        assert_eq!(frames.len(), 1);
        assert_eq!(assembler.stats().checksum_failures, 1);
        assert_eq!(assembler.stats().frames, 1);
    }

    #[test]
    fn test_single_byte_payload() {
        // Length 1: type byte only, then checksum.
        let wire = [0x7E, 0x00, 0x01, 0x8A, 0x75];
        let mut assembler = Assembler::new();
        let frames = assembler.feed(&wire);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, vec![0x8A]);
    }

    #[test]
    fn test_zero_length_is_rejected() {
        let mut assembler = Assembler::new();
        let mut stream = vec![0x7E, 0x00, 0x00];
        stream.extend_from_slice(&MODEM_STATUS_WIRE);

        let frames = assembler.feed(&stream);
        assert_eq!(frames.len(), 1);
        assert_eq!(assembler.stats().length_errors, 1);
    }

    #[test]
    fn test_delimiter_inside_body_is_data() {
        let frame = RawFrame::from_payload(vec![0x90, 0x7E, 0x7E]).unwrap();
        let mut assembler = Assembler::new();
        let frames = assembler.feed(&frame.to_wire());
        assert_eq!(frames, vec![frame]);
    }

    #[test]
    fn test_frame_builder_fills_length_and_checksum() {
        let mut builder = FrameBuilder::new(FRAME_MODEM_STATUS);
        builder.push(0x06);
        let wire = builder.finish().unwrap();
        assert_eq!(wire, MODEM_STATUS_WIRE.to_vec());
    }

    #[test]
    fn test_frame_builder_rejects_oversized_payload() {
        let mut builder = FrameBuilder::new(FRAME_TRANSMIT_REQUEST);
        builder.extend(&vec![0u8; u16::MAX as usize]);
        let err = builder.finish().unwrap_err();
        assert!(matches!(err, ApiError::FrameTooLong { actual, .. } if actual == 65536));
    }
}
