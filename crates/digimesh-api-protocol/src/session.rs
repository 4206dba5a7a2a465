//! API-mode session: inbound queue, outbound requests, dispatch.
//!
//! The transport's receive thread feeds bytes into an [`ApiInbox`], which
//! assembles frames and queues them. The control thread owns the
//! [`ApiSession`], sends requests through it and periodically calls
//! [`ApiSession::drain_and_dispatch`] to run the registered handlers.

use std::collections::VecDeque;
use std::sync::Arc;

use digimesh_common::{ByteSink, Command, Transport, TransportError};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::dispatch::{DispatchSummary, Dispatcher};
use crate::error::ApiResult;
use crate::frame::{Assembler, AssemblerStats, RawFrame};
use crate::frame_id::FrameIdAllocator;
use crate::requests::ApiRequest;
use crate::types::TransmitRequestOptions;

#[derive(Debug, Default)]
struct InboxState {
    assembler: Assembler,
    queue: VecDeque<RawFrame>,
}

/// Receive side of an API session. Hand this to the transport.
#[derive(Debug, Default)]
pub struct ApiInbox {
    state: Mutex<InboxState>,
}

impl ApiInbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every queued frame, leaving the queue empty.
    pub fn take_frames(&self) -> VecDeque<RawFrame> {
        std::mem::take(&mut self.state.lock().queue)
    }

    /// Number of complete frames waiting to be drained.
    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub fn stats(&self) -> AssemblerStats {
        self.state.lock().assembler.stats()
    }
}

impl ByteSink for ApiInbox {
    fn deliver(&self, bytes: &[u8]) {
        let mut state = self.state.lock();
        let InboxState { assembler, queue } = &mut *state;
        for &byte in bytes {
            if let Some(frame) = assembler.push(byte) {
                trace!(frame_type = frame.frame_type, "ApiInbox: queued frame");
                queue.push_back(frame);
            }
        }
    }
}

/// An API-mode connection to one radio.
pub struct ApiSession<T: Transport> {
    transport: T,
    inbox: Arc<ApiInbox>,
    frame_ids: FrameIdAllocator,
    dispatcher: Dispatcher,
}

impl<T: Transport> ApiSession<T> {
    /// Create a session writing to `transport`. Wire the transport's receive
    /// path to [`Self::inbox`].
    pub fn new(transport: T) -> Self {
        ApiSession {
            transport,
            inbox: Arc::new(ApiInbox::new()),
            frame_ids: FrameIdAllocator::new(),
            dispatcher: Dispatcher::new(),
        }
    }

    /// The sink the transport should deliver received bytes to.
    pub fn inbox(&self) -> Arc<ApiInbox> {
        self.inbox.clone()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Handler registry for inbound messages.
    pub fn handlers(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    /// Deliver every queued frame to its handler, in arrival order.
    ///
    /// The queue lock is released before any handler runs; the receive
    /// thread keeps queueing while handlers execute.
    pub fn drain_and_dispatch(&mut self) -> DispatchSummary {
        let frames = self.inbox.take_frames();
        if frames.is_empty() {
            return DispatchSummary::default();
        }
        let summary = self.dispatcher.dispatch_all(frames);
        trace!(
            delivered = summary.delivered,
            unhandled = summary.unhandled,
            "ApiSession: drained inbox"
        );
        summary
    }

    /// Encode and write a request. Returns the frame ID used (0 when
    /// `ack` is false).
    ///
    /// Nothing is written and no ID is consumed if encoding fails.
    pub fn send(&mut self, request: &ApiRequest, ack: bool) -> ApiResult<u8> {
        if !self.transport.is_open() {
            return Err(TransportError::Closed.into());
        }

        let frame_id = if ack { self.frame_ids.peek() } else { 0 };
        let buf = request.encode(frame_id)?;
        self.frame_ids.for_request(ack);

        debug!(
            frame_type = request.frame_type(),
            frame_id,
            len = buf.len(),
            "ApiSession: sending frame"
        );
        self.transport.write(&buf)?;
        Ok(frame_id)
    }

    pub fn send_at_command(&mut self, command: Command, params: &[u8], ack: bool) -> ApiResult<u8> {
        let request = ApiRequest::AtCommand {
            command,
            params: params.to_vec(),
        };
        self.send(&request, ack)
    }

    /// Stage a setting; it takes effect on `AC` or `WR`.
    pub fn send_queued_at_command(
        &mut self,
        command: Command,
        params: &[u8],
        ack: bool,
    ) -> ApiResult<u8> {
        let request = ApiRequest::QueuedAtCommand {
            command,
            params: params.to_vec(),
        };
        self.send(&request, ack)
    }

    pub fn send_transmit_request(
        &mut self,
        options: &TransmitRequestOptions,
        payload: &[u8],
        ack: bool,
    ) -> ApiResult<u8> {
        let request = ApiRequest::TransmitRequest {
            options: *options,
            payload: payload.to_vec(),
        };
        self.send(&request, ack)
    }
}

impl<T: Transport + std::fmt::Debug> std::fmt::Debug for ApiSession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiSession")
            .field("transport", &self.transport)
            .field("next_frame_id", &self.frame_ids.peek())
            .field("pending", &self.inbox.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Debug, Default)]
    struct Loopback {
        written: Mutex<Vec<Vec<u8>>>,
        closed: AtomicBool,
    }

    impl Transport for Loopback {
        fn write(&self, bytes: &[u8]) -> Result<(), TransportError> {
            self.written.lock().push(bytes.to_vec());
            Ok(())
        }

        fn is_open(&self) -> bool {
            !self.closed.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_send_returns_frame_ids() {
        let mut session = ApiSession::new(Loopback::default());
        assert_eq!(session.send_at_command(Command::SerialNumberHigh, &[], true).unwrap(), 1);
        assert_eq!(session.send_at_command(Command::SerialNumberLow, &[], false).unwrap(), 0);
        assert_eq!(session.send_at_command(Command::NetworkDiscover, &[], true).unwrap(), 2);

        let written = session.transport().written.lock();
        assert_eq!(written.len(), 3);
        assert_eq!(written[1][4], 0);
        assert_eq!(written[2][4], 2);
    }

    #[test]
    fn test_failed_encode_writes_nothing() {
        let mut session = ApiSession::new(Loopback::default());
        let err = session
            .send_at_command(Command::EnterCommandMode, &[], true)
            .unwrap_err();
        assert!(matches!(err, ApiError::Command(_)));
        assert!(session.transport().written.lock().is_empty());

        // The ID was not consumed.
        assert_eq!(session.send_at_command(Command::ApiMode, &[], true).unwrap(), 1);
    }

    #[test]
    fn test_closed_transport_fails_fast() {
        let transport = Loopback::default();
        transport.closed.store(true, Ordering::SeqCst);
        let mut session = ApiSession::new(transport);

        let err = session
            .send_transmit_request(&TransmitRequestOptions::default(), b"x", false)
            .unwrap_err();
        assert!(matches!(err, ApiError::Transport(TransportError::Closed)));
        assert!(session.transport().written.lock().is_empty());
    }

    #[test]
    fn test_inbox_queues_until_drained() {
        let mut session = ApiSession::new(Loopback::default());
        let inbox = session.inbox();
        inbox.deliver(&[0x7E, 0x00, 0x02, 0x8A, 0x06]);
        assert_eq!(inbox.pending(), 0);
        inbox.deliver(&[0x6F]);
        assert_eq!(inbox.pending(), 1);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        session
            .handlers()
            .register(move |m: &crate::messages::ModemStatus| sink.lock().push(m.status));

        let summary = session.drain_and_dispatch();
        assert_eq!(summary.delivered, 1);
        assert_eq!(*seen.lock(), vec![6]);
        assert_eq!(inbox.pending(), 0);
        assert_eq!(session.drain_and_dispatch(), DispatchSummary::default());
    }
}
