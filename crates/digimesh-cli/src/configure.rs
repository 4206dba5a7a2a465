//! `digimesh configure`: switch a radio to API mode and apply settings.

use digimesh_at_protocol::{AtReply, CommandModeSession, SessionConfig};
use digimesh_common::{Command, Transport};
use tracing::{error, info};

use crate::cli::ConfigureArgs;
use crate::error::{CliError, CliResult};
use crate::profile::Profile;
use crate::serial::SerialTransport;

/// Settings readback after the batch.
const VERIFY_COMMANDS: [Command; 2] = [Command::ApiMode, Command::NodeIdentifier];

/// Build the batch: `AP=1`, the identifier, profile settings, then `WR`.
pub fn configuration_batch(
    identifier: Option<&str>,
    profile: Option<&Profile>,
) -> CliResult<Vec<(Command, Vec<u8>)>> {
    let mut batch = vec![(Command::ApiMode, b"1".to_vec())];

    let identifier = identifier.or_else(|| profile.and_then(|p| p.identifier.as_deref()));
    if let Some(identifier) = identifier {
        batch.push((Command::NodeIdentifier, identifier.as_bytes().to_vec()));
    }
    if let Some(profile) = profile {
        batch.extend(profile.commands()?);
    }

    batch.push((Command::Write, Vec::new()));
    Ok(batch)
}

/// What a configuration run produced.
#[derive(Debug, Default)]
pub struct ConfigureReport {
    /// One reply per batch entry, up to the first failure.
    pub applied: Vec<AtReply>,
    /// Readback of `AP` and `NI`; `None` where the query failed.
    pub verified: Vec<Option<AtReply>>,
}

/// Apply `batch` and read back the API mode and identifier.
pub fn apply<T: Transport>(
    session: &mut CommandModeSession<T>,
    batch: &[(Command, Vec<u8>)],
) -> CliResult<ConfigureReport> {
    session.initialize()?;
    info!("Guard time is {:?}", session.guard_time());

    let outcome = session.send_batch(batch);
    let mut report = ConfigureReport {
        applied: outcome.replies,
        verified: Vec::with_capacity(VERIFY_COMMANDS.len()),
    };
    for reply in &report.applied {
        if !reply.is_ok() {
            error!("{} was not accepted: {}", reply.descriptor, reply.text());
        }
    }
    if let Some(err) = outcome.error {
        error!("Failed to send queued commands: {}", err);
        return Err(err.into());
    }

    for command in VERIFY_COMMANDS {
        match session.send_command(command, &[]) {
            Ok(reply) => report.verified.push(Some(reply)),
            Err(err) => {
                error!("Failed to read back {}: {}", command, err);
                report.verified.push(None);
            }
        }
    }
    Ok(report)
}

pub fn run(args: &ConfigureArgs) -> CliResult<()> {
    let profile = args.profile.as_deref().map(Profile::load).transpose()?;
    let batch = configuration_batch(args.identifier.as_deref(), profile.as_ref())?;

    let transport = SerialTransport::open(&args.port.device, args.port.baud)?;
    let mut session = CommandModeSession::new(transport.clone(), SessionConfig::default());
    let reader = transport.start_reader(session.inbox())?;

    let result = apply(&mut session, &batch);

    reader.stop();
    transport.close();

    let report = result?;
    for reply in &report.applied {
        println!("{}", reply);
    }
    for reply in report.verified.iter().flatten() {
        println!("{}", reply);
    }

    if report.verified.iter().any(Option::is_none) {
        return Err(CliError::Incomplete("settings could not be read back".to_string()));
    }
    Ok(())
}
