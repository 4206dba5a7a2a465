//! Command-line arguments.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "digimesh", version, about = "Configure and monitor DigiMesh radios")]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). Overrides RUST_LOG.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Put a radio into API mode and apply settings through command mode.
    Configure(ConfigureArgs),
    /// Talk to a radio in API mode and log everything it reports.
    Monitor(MonitorArgs),
}

#[derive(Debug, Clone, Args)]
pub struct PortArgs {
    /// Serial device, e.g. /dev/ttyUSB0
    #[arg(short, long)]
    pub device: String,

    /// Port baud rate
    #[arg(short, long, default_value_t = 9600)]
    pub baud: u32,
}

#[derive(Debug, Clone, Args)]
pub struct ConfigureArgs {
    #[command(flatten)]
    pub port: PortArgs,

    /// Node identifier (NI) to store on the radio
    #[arg(long)]
    pub identifier: Option<String>,

    /// YAML profile with additional settings
    #[arg(long)]
    pub profile: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct MonitorArgs {
    #[command(flatten)]
    pub port: PortArgs,

    /// 64-bit destination address (hex) for test messages
    #[arg(short, long)]
    pub address: Option<String>,

    /// Broadcast test messages when no address is given
    #[arg(short = 'c', long)]
    pub broadcast: bool,

    /// Loop rate in Hz; a test message goes out every other tick
    #[arg(short, long, default_value_t = 10.0)]
    pub rate: f32,
}
