//! Requests the host can send in API mode.

use digimesh_common::Command;

use crate::constants::*;
use crate::error::ApiResult;
use crate::frame::{set_checksum, FrameBuilder};
use crate::types::TransmitRequestOptions;

/// Outbound API frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiRequest {
    /// Run a local AT command immediately.
    AtCommand {
        command: Command,
        /// Parameter bytes; empty to query the current value.
        params: Vec<u8>,
    },

    /// Stage a local AT command until changes are applied.
    QueuedAtCommand { command: Command, params: Vec<u8> },

    /// Send RF data.
    TransmitRequest {
        options: TransmitRequestOptions,
        payload: Vec<u8>,
    },
}

impl ApiRequest {
    /// Encode to a complete wire frame carrying `frame_id`.
    pub fn encode(&self, frame_id: u8) -> ApiResult<Vec<u8>> {
        match self {
            ApiRequest::AtCommand { command, params } => {
                encode_at_command(*command, params, frame_id)
            }
            ApiRequest::QueuedAtCommand { command, params } => {
                encode_queued_at_command(*command, params, frame_id)
            }
            ApiRequest::TransmitRequest { options, payload } => {
                encode_transmit_request(options, payload, frame_id)
            }
        }
    }

    pub fn frame_type(&self) -> u8 {
        match self {
            ApiRequest::AtCommand { .. } => FRAME_AT_COMMAND,
            ApiRequest::QueuedAtCommand { .. } => FRAME_QUEUED_AT_COMMAND,
            ApiRequest::TransmitRequest { .. } => FRAME_TRANSMIT_REQUEST,
        }
    }
}

/// `[7E][len][08][id][cmd_hi][cmd_lo][params...][cs]`
pub fn encode_at_command(command: Command, params: &[u8], frame_id: u8) -> ApiResult<Vec<u8>> {
    let code = command.wire_code()?;

    let mut builder = FrameBuilder::new(FRAME_AT_COMMAND);
    builder.push(frame_id).extend(&code).extend(params);
    builder.finish()
}

/// Same layout as [`encode_at_command`] with type `0x09`.
pub fn encode_queued_at_command(
    command: Command,
    params: &[u8],
    frame_id: u8,
) -> ApiResult<Vec<u8>> {
    let mut buf = encode_at_command(command, params, frame_id)?;
    buf[3] = FRAME_QUEUED_AT_COMMAND;
    set_checksum(&mut buf);
    Ok(buf)
}

/// `[7E][len][10][id][dest: 8 BE][FF][FE][radius][opts][payload...][cs]`
pub fn encode_transmit_request(
    options: &TransmitRequestOptions,
    payload: &[u8],
    frame_id: u8,
) -> ApiResult<Vec<u8>> {
    let mut tx_options = 0u8;
    if options.enable_ack {
        tx_options |= TX_OPTION_ENABLE_ACK;
    }
    if options.attempt_route_discovery {
        tx_options |= TX_OPTION_ROUTE_DISCOVERY;
    }

    let mut builder = FrameBuilder::new(FRAME_TRANSMIT_REQUEST);
    builder
        .push(frame_id)
        .extend(&options.destination_address.to_be_bytes())
        .extend(&RESERVED_NETWORK_ADDRESS)
        .push(options.broadcast_radius)
        .push(tx_options)
        .extend(payload);
    builder.finish()
}
