//! AT command registry.
//!
//! Every command the DigiMesh firmware understands in either protocol is a
//! variant of [`Command`]. The registry maps each one to its two-character wire
//! code and a human descriptor, and builds the transparent-mode payload:
//!
//! - the escape sequence `+++` (no terminator) for [`Command::EnterCommandMode`]
//! - `AT<code><params>\r` for everything else

use std::fmt;
use std::str::FromStr;

use crate::error::CommandError;

/// The escape sequence that switches the module into command mode.
pub const ENTER_SEQUENCE: &[u8; 3] = b"+++";

/// Terminator appended to every transparent-mode command line.
pub const LINE_TERMINATOR: u8 = b'\r';

/// Commands accepted by the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// `+++` escape sequence.
    EnterCommandMode,

    // ========== Special ==========
    /// `WR`
    Write,
    /// `FR`
    SoftwareReset,
    /// `AC`
    ApplyChanges,
    /// `VL`
    VersionLong,

    // ========== Addressing ==========
    /// `DH`
    DestinationAddressHigh,
    /// `DL`
    DestinationAddressLow,
    /// `DD`
    DeviceTypeIdentifier,
    /// `SH`
    SerialNumberHigh,
    /// `SL`
    SerialNumberLow,
    /// `HP`
    HoppingChannel,
    /// `SE`
    SourceEndpoint,
    /// `DE`
    DestinationEndpoint,
    /// `CI`
    ClusterIdentifier,
    /// `NP`
    MaxRfPayloadBytes,
    /// `CE`
    CoordinatorEndDevice,

    // ========== Serial interfacing ==========
    /// `AP`
    ApiMode,
    /// `AO`
    ApiOutputFormat,
    /// `BD`
    BaudRate,
    /// `RO`
    PacketizationTimeout,
    /// `FT`
    FlowControlThreshold,
    /// `NB`
    Parity,

    // ========== I/O ==========
    /// `CB`
    CommissioningPushbutton,

    // ========== Diagnostics ==========
    /// `VR`
    FirmwareVersion,
    /// `HV`
    HardwareVersion,
    /// `CK`
    ConfigurationCode,
    /// `ER`
    RfErrors,
    /// `GD`
    GoodPackets,
    /// `RP`
    RssiPwmTimer,
    /// `TR`
    TransmissionErrors,
    /// `TP`
    Temperature,
    /// `DB`
    ReceivedSignalStrength,

    // ========== AT command options ==========
    /// `CT`
    CommandModeTimeout,
    /// `CN`
    ExitCommandMode,
    /// `GT`
    GuardTimes,
    /// `CC`
    CommandCharacter,

    // ========== Node identification ==========
    /// `ID`
    NetworkId,
    /// `NT`
    NodeDiscoverTimeout,
    /// `NI`
    NodeIdentifier,
    /// `DN`
    DiscoverNode,
    /// `ND`
    NetworkDiscover,
    /// `NO`
    NetworkDiscoveryOptions,

    // ========== MAC level ==========
    /// `MT`
    BroadcastMultiTransmit,
    /// `RR`
    UnicastMacRetries,

    // ========== Mesh network level ==========
    /// `NH`
    NetworkHops,
    /// `NN`
    NetworkDelaySlots,
    /// `MR`
    MeshRetries,
    /// `BH`
    BroadcastRadius,
}

/// Grouping used by the firmware documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandCategory {
    /// The `+++` escape.
    Escape,
    Special,
    Addressing,
    SerialInterfacing,
    Io,
    Diagnostics,
    AtCommandOptions,
    NodeIdentification,
    Mac,
    Mesh,
}

/// One registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub command: Command,
    /// Two ASCII characters, or `+++` for the escape sequence.
    pub code: &'static str,
    pub descriptor: &'static str,
    pub category: CommandCategory,
}

const fn entry(
    command: Command,
    code: &'static str,
    descriptor: &'static str,
    category: CommandCategory,
) -> CommandSpec {
    CommandSpec {
        command,
        code,
        descriptor,
        category,
    }
}

use CommandCategory as Cat;

/// The registry table.
pub static COMMAND_TABLE: &[CommandSpec] = &[
    entry(Command::EnterCommandMode, "+++", "AT Command Startup Sequence", Cat::Escape),
    entry(Command::Write, "WR", "Write", Cat::Special),
    entry(Command::SoftwareReset, "FR", "Software Reset", Cat::Special),
    entry(Command::ApplyChanges, "AC", "Apply Changes", Cat::Special),
    entry(Command::VersionLong, "VL", "Version Long", Cat::Special),
    entry(Command::DestinationAddressHigh, "DH", "Destination Address High", Cat::Addressing),
    entry(Command::DestinationAddressLow, "DL", "Destination Address Low", Cat::Addressing),
    entry(Command::DeviceTypeIdentifier, "DD", "Device Type Identifier", Cat::Addressing),
    entry(Command::SerialNumberHigh, "SH", "Serial Number High", Cat::Addressing),
    entry(Command::SerialNumberLow, "SL", "Serial Number Low", Cat::Addressing),
    entry(Command::HoppingChannel, "HP", "Hopping Channel", Cat::Addressing),
    entry(Command::SourceEndpoint, "SE", "Source Endpoint", Cat::Addressing),
    entry(Command::DestinationEndpoint, "DE", "Destination Endpoint", Cat::Addressing),
    entry(Command::ClusterIdentifier, "CI", "Cluster Identifier", Cat::Addressing),
    entry(Command::MaxRfPayloadBytes, "NP", "Maximum RF Payload Bytes", Cat::Addressing),
    entry(Command::CoordinatorEndDevice, "CE", "Coordinator/End Device", Cat::Addressing),
    entry(Command::ApiMode, "AP", "API Mode", Cat::SerialInterfacing),
    entry(Command::ApiOutputFormat, "AO", "API Output Format", Cat::SerialInterfacing),
    entry(Command::BaudRate, "BD", "Baud Rate", Cat::SerialInterfacing),
    entry(Command::PacketizationTimeout, "RO", "Packetization Timeout", Cat::SerialInterfacing),
    entry(Command::FlowControlThreshold, "FT", "Flow Control Threshold", Cat::SerialInterfacing),
    entry(Command::Parity, "NB", "Parity", Cat::SerialInterfacing),
    entry(Command::CommissioningPushbutton, "CB", "Commissioning Pushbutton", Cat::Io),
    entry(Command::FirmwareVersion, "VR", "Firmware Version", Cat::Diagnostics),
    entry(Command::HardwareVersion, "HV", "Hardware Version", Cat::Diagnostics),
    entry(Command::ConfigurationCode, "CK", "Configuration Code", Cat::Diagnostics),
    entry(Command::RfErrors, "ER", "RF Errors", Cat::Diagnostics),
    entry(Command::GoodPackets, "GD", "Good Packets", Cat::Diagnostics),
    entry(Command::RssiPwmTimer, "RP", "RSSI PWM Timer", Cat::Diagnostics),
    entry(Command::TransmissionErrors, "TR", "Transmission Errors", Cat::Diagnostics),
    entry(Command::Temperature, "TP", "Temperature", Cat::Diagnostics),
    entry(Command::ReceivedSignalStrength, "DB", "Received Signal Strength", Cat::Diagnostics),
    entry(Command::CommandModeTimeout, "CT", "Command Mode Timeout", Cat::AtCommandOptions),
    entry(Command::ExitCommandMode, "CN", "Exit Command Mode", Cat::AtCommandOptions),
    entry(Command::GuardTimes, "GT", "Guard Times", Cat::AtCommandOptions),
    entry(Command::CommandCharacter, "CC", "Command Character", Cat::AtCommandOptions),
    entry(Command::NetworkId, "ID", "Network ID", Cat::NodeIdentification),
    entry(Command::NodeDiscoverTimeout, "NT", "Node Discover Timeout", Cat::NodeIdentification),
    entry(Command::NodeIdentifier, "NI", "Node Identifier", Cat::NodeIdentification),
    entry(Command::DiscoverNode, "DN", "Discover Node", Cat::NodeIdentification),
    entry(Command::NetworkDiscover, "ND", "Network Discover", Cat::NodeIdentification),
    entry(Command::NetworkDiscoveryOptions, "NO", "Network Discovery Options", Cat::NodeIdentification),
    entry(Command::BroadcastMultiTransmit, "MT", "Broadcast Multi-Transmit", Cat::Mac),
    entry(Command::UnicastMacRetries, "RR", "Unicast MAC Retries", Cat::Mac),
    entry(Command::NetworkHops, "NH", "Network Hops", Cat::Mesh),
    entry(Command::NetworkDelaySlots, "NN", "Network Delay Slots", Cat::Mesh),
    entry(Command::MeshRetries, "MR", "Mesh Retries", Cat::Mesh),
    entry(Command::BroadcastRadius, "BH", "Broadcast Radius", Cat::Mesh),
];

/// Find the registry entry for a wire code such as `"NI"` (case-insensitive).
pub fn lookup_code(code: &str) -> Result<&'static CommandSpec, CommandError> {
    COMMAND_TABLE
        .iter()
        .find(|spec| spec.code.eq_ignore_ascii_case(code))
        .ok_or_else(|| CommandError::Unknown(code.to_string()))
}

impl Command {
    /// Get the registry entry for this command.
    pub fn spec(self) -> Result<&'static CommandSpec, CommandError> {
        COMMAND_TABLE
            .iter()
            .find(|spec| spec.command == self)
            .ok_or(CommandError::Unregistered(self))
    }

    /// Human-readable descriptor, e.g. `"Node Identifier"`.
    pub fn descriptor(self) -> Result<&'static str, CommandError> {
        Ok(self.spec()?.descriptor)
    }

    pub fn category(self) -> Result<CommandCategory, CommandError> {
        Ok(self.spec()?.category)
    }

    /// The two wire characters placed in `AT` lines and API frames.
    ///
    /// The escape sequence has no such code.
    pub fn wire_code(self) -> Result<[u8; 2], CommandError> {
        let code = self.spec()?.code.as_bytes();
        match code {
            [hi, lo] => Ok([*hi, *lo]),
            _ => Err(CommandError::NoWireCode(self)),
        }
    }

    /// Build the transparent-mode payload for this command.
    pub fn command_mode_payload(self, params: &[u8]) -> Result<Vec<u8>, CommandError> {
        if self == Command::EnterCommandMode {
            self.spec()?;
            return Ok(ENTER_SEQUENCE.to_vec());
        }

        let [hi, lo] = self.wire_code()?;

        // 'AT' + code + params + <CR>
        let mut buf = Vec::with_capacity(5 + params.len());
        buf.extend_from_slice(b"AT");
        buf.push(hi);
        buf.push(lo);
        buf.extend_from_slice(params);
        buf.push(LINE_TERMINATOR);
        Ok(buf)
    }

    /// Iterate over every registered command in table order.
    pub fn all() -> impl Iterator<Item = Command> {
        COMMAND_TABLE.iter().map(|spec| spec.command)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.spec() {
            Ok(spec) => f.write_str(spec.code),
            Err(_) => write!(f, "{:?}", self),
        }
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup_code(s.trim()).map(|spec| spec.command)
    }
}
