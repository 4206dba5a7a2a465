//! `digimesh monitor`: run an API-mode session, log every frame, and
//! optionally send periodic test messages.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use digimesh_api_protocol::*;
use digimesh_common::{Command, Transport};
use tracing::{debug, info};

use crate::cli::MonitorArgs;
use crate::error::{CliError, CliResult};
use crate::serial::SerialTransport;

/// Length of the test message.
const TEST_PAYLOAD_LEN: u8 = 20;

/// `NO=2`: append device type to discovery responses.
const DISCOVERY_OPTIONS: u8 = 0x02;

/// `NT=0x0F`: 1.5 s discovery timeout, in 100 ms units.
const DISCOVERY_TIMEOUT: u8 = 0x0F;

/// `"0123456789:;<=>?@ABC"`
pub fn test_payload() -> Vec<u8> {
    (0..TEST_PAYLOAD_LEN).map(|i| b'0' + i).collect()
}

/// Destination for test messages: the given address, else broadcast.
pub fn transmit_options(address: Option<&str>) -> CliResult<TransmitRequestOptions> {
    let mut options = TransmitRequestOptions::default();
    if let Some(address) = address {
        options.destination_address = parse_address(address)?;
    }
    Ok(options)
}

/// Half of one loop period for `rate` Hz.
pub fn half_period(rate: f32) -> CliResult<Duration> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(CliError::InvalidArgument(format!(
            "rate must be a positive number of Hz, got {}",
            rate
        )));
    }
    Duration::try_from_secs_f32(0.5 / rate).map_err(|err| {
        CliError::InvalidArgument(format!("rate {} Hz gives no usable period: {}", rate, err))
    })
}

pub fn modem_status_name(status: u8) -> &'static str {
    match status {
        0x00 => "hardware reset",
        0x01 => "watchdog timer reset",
        0x0B => "network woke up",
        0x0C => "network went to sleep",
        _ => "unknown",
    }
}

/// Log every message type; `ND` responses are also decoded as node records.
pub fn register_handlers(dispatcher: &mut Dispatcher) {
    dispatcher.register(|r: &AtCommandResponse| {
        if &r.command == b"ND" && !r.data.is_empty() {
            let node = NodeIdentificationIndicator::from_discovery_payload(&r.data);
            info!("Discovered {}", node);
        } else {
            info!(
                "AT response id={} {} status={} data={}",
                r.id,
                r.command_str(),
                r.status,
                hex::encode_upper(&r.data)
            );
        }
    });
    dispatcher.register(|m: &ModemStatus| {
        info!("Modem status 0x{:02X} ({})", m.status, modem_status_name(m.status));
    });
    dispatcher.register(|s: &TransmitStatus| info!("{}", s));
    dispatcher.register(|p: &ReceivePacket| {
        info!(
            "Received from {} options=0x{:02X}: {} ({})",
            format_address(p.source_address),
            p.receive_options,
            String::from_utf8_lossy(&p.data),
            hex::encode_upper(&p.data)
        );
    });
    dispatcher.register(|p: &ExplicitReceivePacket| {
        info!(
            "Received from {} endpoint {}->{} cluster=0x{:04X} profile=0x{:04X}: {}",
            format_address(p.source_address),
            p.source_endpoint,
            p.destination_endpoint,
            p.cluster_id,
            p.profile_id,
            hex::encode_upper(&p.data)
        );
    });
    dispatcher.register(|n: &NodeIdentificationIndicator| info!("Node identified: {}", n));
    dispatcher.register(|r: &RemoteCommandResponse| {
        info!(
            "Remote response id={} from {} {} status={} data={}",
            r.id,
            format_address(r.source_address),
            String::from_utf8_lossy(&r.command),
            r.status,
            hex::encode_upper(&r.data)
        );
    });
    dispatcher.register(|f: &RawFrame| {
        debug!("Frame type 0x{:02X}: {}", f.frame_type, hex::encode_upper(&f.data));
    });
}

/// Test messages go out unacknowledged: frame ID 0, no transmit status.
const TEST_MESSAGE_ACK: bool = false;

/// Discovery setup and identity queries sent before the loop starts.
pub fn send_startup_commands<T: Transport>(session: &mut ApiSession<T>) -> CliResult<()> {
    session.send_at_command(Command::NetworkDiscoveryOptions, &[DISCOVERY_OPTIONS], false)?;
    session.send_at_command(Command::NodeDiscoverTimeout, &[DISCOVERY_TIMEOUT], true)?;
    session.send_at_command(Command::ApplyChanges, &[], false)?;

    session.send_at_command(Command::SerialNumberHigh, &[], true)?;
    session.send_at_command(Command::SerialNumberLow, &[], true)?;

    info!("Calling node discovery");
    session.send_at_command(Command::NetworkDiscover, &[], true)?;
    Ok(())
}

pub fn run(args: &MonitorArgs) -> CliResult<()> {
    let options = transmit_options(args.address.as_deref())?;
    let tick = half_period(args.rate)?;
    let should_send = args.address.is_some() || args.broadcast;
    let payload = test_payload();

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let transport = SerialTransport::open(&args.port.device, args.port.baud)?;
    let mut session = ApiSession::new(transport.clone());
    let reader = transport.start_reader(session.inbox())?;
    register_handlers(session.handlers());

    let result = monitor_loop(&mut session, &running, should_send, &options, &payload, tick);

    reader.stop();
    transport.close();
    let stats = session.inbox().stats();
    info!(
        "Frames: {} accepted, {} checksum failures, {} bytes discarded",
        stats.frames, stats.checksum_failures, stats.discarded_bytes
    );
    result
}

fn monitor_loop<T: Transport>(
    session: &mut ApiSession<T>,
    running: &AtomicBool,
    should_send: bool,
    options: &TransmitRequestOptions,
    payload: &[u8],
    tick: Duration,
) -> CliResult<()> {
    send_startup_commands(session)?;

    let mut send = false;
    while running.load(Ordering::SeqCst) {
        let payload = should_send.then_some(payload);
        monitor_step(session, &mut send, options, payload)?;
        thread::sleep(tick);
    }
    info!("Stopping");
    Ok(())
}

/// One loop tick: every other tick sends `payload` if there is one, then
/// received frames are dispatched.
fn monitor_step<T: Transport>(
    session: &mut ApiSession<T>,
    send: &mut bool,
    options: &TransmitRequestOptions,
    payload: Option<&[u8]>,
) -> CliResult<()> {
    if *send {
        if let Some(payload) = payload {
            session.send_transmit_request(options, payload, TEST_MESSAGE_ACK)?;
        }
    }
    *send = !*send;

    session.drain_and_dispatch();
    Ok(())
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use digimesh_common::TransportError;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        writes: Mutex<Vec<Vec<u8>>>,
    }

    impl Transport for Recorder {
        fn write(&self, bytes: &[u8]) -> Result<(), TransportError> {
            self.writes.lock().push(bytes.to_vec());
            Ok(())
        }

        fn is_open(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_every_other_tick_sends_unacked_message() {
        let recorder = Arc::new(Recorder::default());
        let mut session = ApiSession::new(recorder.clone());
        let options = TransmitRequestOptions::default();
        let payload = test_payload();

        let mut send = false;
        for _ in 0..4 {
            monitor_step(&mut session, &mut send, &options, Some(payload.as_slice()))
                .unwrap();
        }

        let writes = recorder.writes.lock();
        assert_eq!(writes.len(), 2);
        for frame in writes.iter() {
            assert_eq!(frame[3], FRAME_TRANSMIT_REQUEST);
            // Frame ID 0: no transmit status will follow.
            assert_eq!(frame[4], NO_ACK_FRAME_ID);
            assert_eq!(&frame[frame.len() - 21..frame.len() - 1], &payload[..]);
        }
    }

    #[test]
    fn test_listen_only_ticks_send_nothing() {
        let recorder = Arc::new(Recorder::default());
        let mut session = ApiSession::new(recorder.clone());

        let mut send = false;
        for _ in 0..4 {
            monitor_step(&mut session, &mut send, &TransmitRequestOptions::default(), None)
                .unwrap();
        }
        assert!(recorder.writes.lock().is_empty());
    }

    #[test]
    fn test_payload_is_ascii_run() {
        let payload = test_payload();
        assert_eq!(payload.len(), 20);
        assert_eq!(&payload[..10], b"0123456789");
        assert_eq!(payload[19], b'C');
    }

    #[test]
    fn test_transmit_options() {
        assert!(transmit_options(None).unwrap().is_broadcast());

        let options = transmit_options(Some("0013A20040A1B2C3")).unwrap();
        assert_eq!(options.destination_address, 0x0013_A200_40A1_B2C3);
        assert!(options.enable_ack);

        assert!(matches!(
            transmit_options(Some("nope")),
            Err(CliError::Api(ApiError::InvalidAddress(_)))
        ));
    }

    #[test]
    fn test_half_period() {
        let tick = half_period(10.0).unwrap();
        assert!((tick.as_secs_f64() - 0.05).abs() < 1e-6);
        assert!(half_period(0.0).is_err());
        assert!(half_period(f32::NAN).is_err());
        assert!(matches!(half_period(1e-45), Err(CliError::InvalidArgument(_))));
    }
}
