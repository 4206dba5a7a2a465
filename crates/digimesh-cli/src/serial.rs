//! Serial port transport.
//!
//! Writes go straight to the port under a lock. Reads happen on a dedicated
//! thread that hands every chunk to a [`ByteSink`] until it is stopped or the
//! port fails.

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use digimesh_common::{ByteSink, Transport, TransportError};
use parking_lot::Mutex;
use serialport::SerialPort;
use tracing::{debug, info, warn};

use crate::error::{CliError, CliResult};

/// Read timeout; bounds how long the reader takes to notice a stop request.
const READ_TIMEOUT: Duration = Duration::from_millis(50);

const READ_BUFFER_SIZE: usize = 256;

/// An open serial device.
pub struct SerialTransport {
    name: String,
    port: Mutex<Box<dyn SerialPort>>,
    open: AtomicBool,
}

impl SerialTransport {
    /// Open `path` at `baud`, 8N1.
    pub fn open(path: &str, baud: u32) -> CliResult<Arc<Self>> {
        info!("Opening {} at {} baud", path, baud);
        let port = serialport::new(path, baud)
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|source| CliError::PortOpen {
                port: path.to_string(),
                source,
            })?;

        Ok(Arc::new(SerialTransport {
            name: path.to_string(),
            port: Mutex::new(port),
            open: AtomicBool::new(true),
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Spawn the receive thread, delivering into `sink`.
    pub fn start_reader(self: &Arc<Self>, sink: Arc<dyn ByteSink>) -> CliResult<SerialReader> {
        let mut reader = self
            .port
            .lock()
            .try_clone()
            .map_err(|source| CliError::PortOpen {
                port: self.name.clone(),
                source,
            })?;
        let stop = Arc::new(AtomicBool::new(false));
        let transport = self.clone();
        let thread_stop = stop.clone();

        let handle = thread::Builder::new()
            .name(format!("serial-rx {}", self.name))
            .spawn(move || {
                if let Err(err) = pump(&mut reader, sink.as_ref(), &thread_stop) {
                    warn!("Serial read on {} failed: {}", transport.name, err);
                }
                transport.open.store(false, Ordering::SeqCst);
                debug!("Serial reader for {} exiting", transport.name);
            })
            .map_err(CliError::Reader)?;

        Ok(SerialReader {
            stop,
            handle: Some(handle),
        })
    }

    /// Mark the port closed; later writes fail with `Closed`.
    pub fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            info!("Closed {}", self.name);
        }
    }
}

impl Transport for SerialTransport {
    fn write(&self, bytes: &[u8]) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::Closed);
        }
        let mut port = self.port.lock();
        port.write_all(bytes)?;
        port.flush()?;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("name", &self.name)
            .field("open", &self.is_open())
            .finish()
    }
}

/// Handle to a running receive thread. Stops and joins it on drop.
pub struct SerialReader {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SerialReader {
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Serial reader thread panicked");
            }
        }
    }
}

impl Drop for SerialReader {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Copy from `reader` into `sink` until `stop` is set or the stream ends.
///
/// Read timeouts and interruptions are retried; any other error ends the
/// pump.
pub fn pump<R: Read + ?Sized>(reader: &mut R, sink: &dyn ByteSink, stop: &AtomicBool) -> io::Result<()> {
    let mut buf = [0u8; READ_BUFFER_SIZE];
    while !stop.load(Ordering::SeqCst) {
        match reader.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(n) => sink.deliver(&buf[..n]),
            Err(ref e)
                if e.kind() == io::ErrorKind::TimedOut || e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
