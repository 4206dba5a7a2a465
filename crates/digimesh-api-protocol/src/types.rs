//! Request option types and address helpers.

use crate::constants::{BROADCAST_ADDRESS, MAX_HOPS_BROADCAST_RADIUS};
use crate::error::{ApiError, ApiResult};

/// Addressing and delivery options for a transmit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmitRequestOptions {
    /// 64-bit destination; [`BROADCAST_ADDRESS`] reaches every node.
    pub destination_address: u64,
    /// Maximum hops for broadcasts; 0 means the network maximum.
    pub broadcast_radius: u8,
    /// Request a MAC acknowledgement from the receiver.
    pub enable_ack: bool,
    pub attempt_route_discovery: bool,
}

impl Default for TransmitRequestOptions {
    fn default() -> Self {
        TransmitRequestOptions {
            destination_address: BROADCAST_ADDRESS,
            broadcast_radius: MAX_HOPS_BROADCAST_RADIUS,
            enable_ack: true,
            attempt_route_discovery: true,
        }
    }
}

impl TransmitRequestOptions {
    /// Options addressed to a single node, everything else default.
    pub fn unicast(destination_address: u64) -> Self {
        TransmitRequestOptions {
            destination_address,
            ..Default::default()
        }
    }

    pub fn is_broadcast(&self) -> bool {
        self.destination_address == BROADCAST_ADDRESS
    }
}

/// Parse a 64-bit address written as hex, with or without a `0x` prefix.
/// Embedded `:` and spaces are ignored, so `0013A200:40A1B2C3` works too.
pub fn parse_address(text: &str) -> ApiResult<u64> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let cleaned: String = digits.chars().filter(|c| *c != ':' && *c != ' ').collect();

    if cleaned.is_empty() || cleaned.len() > 16 {
        return Err(ApiError::InvalidAddress(text.to_string()));
    }
    u64::from_str_radix(&cleaned, 16).map_err(|_| ApiError::InvalidAddress(text.to_string()))
}

/// Format a 64-bit address as 16 uppercase hex digits.
pub fn format_address(address: u64) -> String {
    format!("{:016X}", address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_broadcast() {
        let options = TransmitRequestOptions::default();
        assert_eq!(options.destination_address, 0xFFFF);
        assert_eq!(options.broadcast_radius, 0);
        assert!(options.enable_ack);
        assert!(options.attempt_route_discovery);
        assert!(options.is_broadcast());
    }

    #[test]
    fn test_parse_address_forms() {
        assert_eq!(parse_address("0013A20040A1B2C3").unwrap(), 0x0013_A200_40A1_B2C3);
        assert_eq!(parse_address("0x0013a200:40a1b2c3").unwrap(), 0x0013_A200_40A1_B2C3);
        assert_eq!(parse_address(" ffff ").unwrap(), BROADCAST_ADDRESS);
    }

    #[test]
    fn test_parse_address_rejects_garbage() {
        assert!(matches!(parse_address("xyz"), Err(ApiError::InvalidAddress(_))));
        assert!(matches!(parse_address(""), Err(ApiError::InvalidAddress(_))));
        assert!(matches!(
            parse_address("00112233445566778"),
            Err(ApiError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_format_address() {
        assert_eq!(format_address(0x0013_A200_40A1_B2C3), "0013A20040A1B2C3");
        assert_eq!(format_address(0xFFFF), "000000000000FFFF");
    }
}
