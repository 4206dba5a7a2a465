//! Radio settings profiles.
//!
//! A profile is a YAML file listing AT settings to apply in one command-mode
//! batch:
//!
//! ```yaml
//! identifier: rooftop
//! settings:
//!   - command: NO
//!     value: 2          # numbers are sent in hex, as the radio expects
//!   - command: BH
//!     value: "1"        # strings are sent verbatim
//!   - command: CE       # no value: query only
//! ```

use std::fs;
use std::path::Path;

use digimesh_common::Command;
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// A settings profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    /// Node identifier (`NI`); the command line takes precedence.
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub settings: Vec<ProfileSetting>,
}

/// One `AT<command><value>` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileSetting {
    /// Two-letter command code.
    pub command: String,
    #[serde(default)]
    pub value: Option<SettingValue>,
}

/// A parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Number(u64),
    Text(String),
}

impl SettingValue {
    /// Parameter bytes as sent in command mode.
    pub fn to_params(&self) -> Vec<u8> {
        match self {
            SettingValue::Number(n) => format!("{:X}", n).into_bytes(),
            SettingValue::Text(text) => text.as_bytes().to_vec(),
        }
    }
}

impl Profile {
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| CliError::ProfileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> CliResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Resolve every setting against the command registry.
    ///
    /// The escape sequence and the enter/exit/write commands are managed by
    /// the session and rejected here.
    pub fn commands(&self) -> CliResult<Vec<(Command, Vec<u8>)>> {
        self.settings
            .iter()
            .map(|setting| {
                let command: Command = setting.command.parse()?;
                match command {
                    Command::EnterCommandMode | Command::ExitCommandMode | Command::Write => {
                        Err(CliError::Profile(format!(
                            "{} cannot appear in a profile",
                            setting.command
                        )))
                    }
                    _ => Ok((
                        command,
                        setting
                            .value
                            .as_ref()
                            .map(SettingValue::to_params)
                            .unwrap_or_default(),
                    )),
                }
            })
            .collect()
    }
}
