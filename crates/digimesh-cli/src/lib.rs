//! Command-line tools for DigiMesh radios.
//!
//! - `digimesh configure` uses transparent command mode to switch a radio to
//!   API mode (`AP=1`), set its node identifier and apply a settings profile.
//! - `digimesh monitor` runs an API-mode session against a radio, logs every
//!   frame it reports, and optionally sends periodic test messages.

pub mod cli;
pub mod configure;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod profile;
pub mod serial;

pub use error::{CliError, CliResult};
