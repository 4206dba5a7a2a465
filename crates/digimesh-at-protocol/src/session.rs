//! Command-mode session.
//!
//! In transparent mode the radio only listens for commands after the escape
//! sequence `+++`, framed by a period of silence (the guard time) on the
//! serial line. Every exchange here therefore looks like:
//!
//! ```text
//! <guard silence> +++ -> OK
//! AT<cmd><params>\r -> <reply>       (one or more)
//! ATCN\r -> OK
//! ```
//!
//! The first exchange initialises the session: it reads the radio's guard
//! time with `ATGT` and uses it for every later silence.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use digimesh_common::{ByteSink, Command, Transport, TransportError};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace, warn};

use crate::codec::LineCodec;
use crate::config::SessionConfig;
use crate::error::{AtError, AtResult};
use crate::responses::{parse_hex, AtReply};

#[derive(Debug, Default)]
struct InboxState {
    codec: LineCodec,
    replies: VecDeque<Vec<u8>>,
}

/// Receive side of a command-mode session. Hand this to the transport.
#[derive(Debug, Default)]
pub struct LineInbox {
    state: Mutex<InboxState>,
    reply_ready: Condvar,
}

impl LineInbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait up to `timeout` for the next reply line. A timeout too large to
    /// form a deadline waits indefinitely.
    pub fn wait_reply(&self, timeout: Duration) -> Option<Vec<u8>> {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.state.lock();
        while state.replies.is_empty() {
            match deadline {
                Some(deadline) => {
                    if self.reply_ready.wait_until(&mut state, deadline).timed_out() {
                        break;
                    }
                }
                None => self.reply_ready.wait(&mut state),
            }
        }
        state.replies.pop_front()
    }

    /// Drop every queued reply and any partial line. Returns the dropped lines.
    pub fn clear(&self) -> Vec<Vec<u8>> {
        let mut state = self.state.lock();
        state.codec.clear();
        state.replies.drain(..).collect()
    }

    /// Number of complete lines waiting.
    pub fn pending(&self) -> usize {
        self.state.lock().replies.len()
    }
}

impl ByteSink for LineInbox {
    fn deliver(&self, bytes: &[u8]) {
        let mut state = self.state.lock();
        state.codec.push(bytes);

        let mut added = false;
        while let Some(line) = state.codec.decode_line() {
            trace!("LineInbox: reply {:?}", String::from_utf8_lossy(&line));
            state.replies.push_back(line);
            added = true;
        }
        if added {
            self.reply_ready.notify_all();
        }
    }
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Guard time not yet read from the radio.
    Uninitialized,
    Ready,
}

/// Result of a batched exchange.
///
/// Replies received before a failure are kept.
#[derive(Debug)]
pub struct BatchOutcome {
    pub replies: Vec<AtReply>,
    pub error: Option<AtError>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Collapse to a plain result, discarding partial replies on failure.
    pub fn into_result(self) -> AtResult<Vec<AtReply>> {
        match self.error {
            None => Ok(self.replies),
            Some(err) => Err(err),
        }
    }
}

/// A command-mode connection to one radio.
pub struct CommandModeSession<T: Transport> {
    transport: T,
    inbox: Arc<LineInbox>,
    config: SessionConfig,
    guard_time: Duration,
    state: SessionState,
}

impl<T: Transport> CommandModeSession<T> {
    /// Create a session writing to `transport`. Wire the transport's receive
    /// path to [`Self::inbox`].
    pub fn new(transport: T, config: SessionConfig) -> Self {
        CommandModeSession {
            transport,
            inbox: Arc::new(LineInbox::new()),
            guard_time: config.guard_time,
            config,
            state: SessionState::Uninitialized,
        }
    }

    /// The sink the transport should deliver received bytes to.
    pub fn inbox(&self) -> Arc<LineInbox> {
        self.inbox.clone()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Current guard time; the radio's `GT` value once initialised.
    pub fn guard_time(&self) -> Duration {
        self.guard_time
    }

    /// Enter command mode, read the guard time, and leave again.
    pub fn initialize(&mut self) -> AtResult<()> {
        debug!("CommandMode: initializing (guard {:?})", self.guard_time);

        self.enter_command_mode()?;

        let reply = self.request(Command::GuardTimes, &[])?;
        let millis = parse_hex(&reply.payload)
            .ok_or_else(|| AtError::InvalidGuardTime(reply.text()))?;
        self.guard_time = Duration::from_millis(millis);
        debug!("CommandMode: guard time is {:?}", self.guard_time);

        self.exit_command_mode()?;

        self.state = SessionState::Ready;
        Ok(())
    }

    /// Run one command and return its reply.
    pub fn send_command(&mut self, command: Command, params: &[u8]) -> AtResult<AtReply> {
        self.ensure_initialized()?;
        self.enter_command_mode()?;
        let reply = self.request(command, params)?;
        self.exit_command_mode()?;
        Ok(reply)
    }

    /// Run several commands inside a single enter/exit, one reply each.
    pub fn send_batch(&mut self, commands: &[(Command, Vec<u8>)]) -> BatchOutcome {
        let mut replies = Vec::with_capacity(commands.len());
        let error = self.run_batch(commands, &mut replies).err();
        if let Some(err) = &error {
            warn!(
                "CommandMode: batch stopped after {} of {} replies: {}",
                replies.len(),
                commands.len(),
                err
            );
        }
        BatchOutcome { replies, error }
    }

    fn run_batch(
        &mut self,
        commands: &[(Command, Vec<u8>)],
        replies: &mut Vec<AtReply>,
    ) -> AtResult<()> {
        self.ensure_initialized()?;
        self.enter_command_mode()?;
        for (command, params) in commands {
            replies.push(self.request(*command, params)?);
        }
        self.exit_command_mode()
    }

    fn ensure_initialized(&mut self) -> AtResult<()> {
        if self.state == SessionState::Uninitialized {
            self.initialize()?;
        }
        Ok(())
    }

    /// Guard silence, `+++`, expect `OK`.
    fn enter_command_mode(&mut self) -> AtResult<()> {
        self.guard_silence();
        self.expect_ok(Command::EnterCommandMode, &[])
    }

    fn exit_command_mode(&mut self) -> AtResult<()> {
        self.expect_ok(Command::ExitCommandMode, &[])
    }

    /// Sleep out the guard time, then drop every line received so far. Only
    /// replies to this exchange's writes may follow.
    fn guard_silence(&self) {
        thread::sleep(self.guard_time);
        for line in self.inbox.clear() {
            debug!(
                "CommandMode: discarding stale line {:?}",
                String::from_utf8_lossy(&line)
            );
        }
    }

    fn expect_ok(&mut self, command: Command, params: &[u8]) -> AtResult<()> {
        let reply = self.request(command, params)?;
        if reply.is_ok() {
            Ok(())
        } else {
            warn!("CommandMode: {} replied {:?}, expected OK", command, reply.text());
            Err(AtError::NotOk {
                command,
                reply: reply.text(),
            })
        }
    }

    /// Send one command and wait for exactly one reply line.
    fn request(&mut self, command: Command, params: &[u8]) -> AtResult<AtReply> {
        let descriptor = command.descriptor()?;
        let payload = command.command_mode_payload(params)?;

        if !self.transport.is_open() {
            return Err(TransportError::Closed.into());
        }
        trace!("CommandMode: -> {:?}", String::from_utf8_lossy(&payload));
        self.transport.write(&payload)?;

        let timeout = self.config.reply_timeout;
        let line = self
            .inbox
            .wait_reply(timeout)
            .ok_or(AtError::ReplyTimeout { command, timeout })?;

        let reply = AtReply::new(descriptor, line);
        debug!("CommandMode: {} <- {:?}", command, reply.text());
        Ok(reply)
    }
}

impl<T: Transport + std::fmt::Debug> std::fmt::Debug for CommandModeSession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandModeSession")
            .field("transport", &self.transport)
            .field("state", &self.state)
            .field("guard_time", &self.guard_time)
            .finish()
    }
}
