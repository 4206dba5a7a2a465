//! Handler registry for decoded frames.
//!
//! Each message type has exactly one handler slot, selected at compile time
//! through [`Dispatchable`]. Registering a handler for a type that already has
//! one replaces it.
//!
//! A raw handler, when set, takes precedence over everything else: frames are
//! handed to it undecoded and the typed slots are not consulted.

use tracing::warn;

use crate::frame::RawFrame;
use crate::messages::*;

/// A boxed handler for messages of type `T`.
pub type Handler<T> = Box<dyn FnMut(&T) + Send>;

/// Outcome of delivering a batch of frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Frames that reached a handler.
    pub delivered: usize,
    /// Frames dropped because nothing was registered for them.
    pub unhandled: usize,
}

impl DispatchSummary {
    pub fn total(&self) -> usize {
        self.delivered + self.unhandled
    }
}

/// Handler slots, one per message type.
#[derive(Default)]
pub struct Dispatcher {
    at_command_response: Option<Handler<AtCommandResponse>>,
    modem_status: Option<Handler<ModemStatus>>,
    transmit_status: Option<Handler<TransmitStatus>>,
    receive_packet: Option<Handler<ReceivePacket>>,
    explicit_receive_packet: Option<Handler<ExplicitReceivePacket>>,
    node_identification: Option<Handler<NodeIdentificationIndicator>>,
    remote_command_response: Option<Handler<RemoteCommandResponse>>,
    unrecognized: Option<Handler<RawFrame>>,
    raw: Option<Handler<RawFrame>>,
}

/// Types that own a handler slot in the [`Dispatcher`].
///
/// [`RawFrame`] maps to the slot for frame types that have no decoder.
pub trait Dispatchable: Sized + 'static {
    fn slot(dispatcher: &mut Dispatcher) -> &mut Option<Handler<Self>>;
}

macro_rules! dispatchable {
    ($ty:ty, $field:ident) => {
        impl Dispatchable for $ty {
            fn slot(dispatcher: &mut Dispatcher) -> &mut Option<Handler<Self>> {
                &mut dispatcher.$field
            }
        }
    };
}

dispatchable!(AtCommandResponse, at_command_response);
dispatchable!(ModemStatus, modem_status);
dispatchable!(TransmitStatus, transmit_status);
dispatchable!(ReceivePacket, receive_packet);
dispatchable!(ExplicitReceivePacket, explicit_receive_packet);
dispatchable!(NodeIdentificationIndicator, node_identification);
dispatchable!(RemoteCommandResponse, remote_command_response);
dispatchable!(RawFrame, unrecognized);

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for messages of type `T`, replacing any previous.
    pub fn register<T, F>(&mut self, handler: F)
    where
        T: Dispatchable,
        F: FnMut(&T) + Send + 'static,
    {
        *T::slot(self) = Some(Box::new(handler));
    }

    /// Remove the handler for `T`. Returns whether one was registered.
    pub fn unregister<T: Dispatchable>(&mut self) -> bool {
        T::slot(self).take().is_some()
    }

    pub fn is_registered<T: Dispatchable>(&mut self) -> bool {
        T::slot(self).is_some()
    }

    /// Receive every frame undecoded, bypassing the typed handlers.
    pub fn set_raw_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&RawFrame) + Send + 'static,
    {
        self.raw = Some(Box::new(handler));
    }

    pub fn clear_raw_handler(&mut self) {
        self.raw = None;
    }

    /// Deliver one frame. Returns `true` if a handler received it.
    pub fn dispatch(&mut self, frame: RawFrame) -> bool {
        if let Some(raw) = self.raw.as_mut() {
            raw(&frame);
            return true;
        }

        let frame_type = frame.frame_type;
        let message = Message::decode(frame);
        let delivered = match &message {
            Message::AtCommandResponse(m) => call(&mut self.at_command_response, m),
            Message::ModemStatus(m) => call(&mut self.modem_status, m),
            Message::TransmitStatus(m) => call(&mut self.transmit_status, m),
            Message::ReceivePacket(m) => call(&mut self.receive_packet, m),
            Message::ExplicitReceivePacket(m) => call(&mut self.explicit_receive_packet, m),
            Message::NodeIdentificationIndicator(m) => call(&mut self.node_identification, m),
            Message::RemoteCommandResponse(m) => call(&mut self.remote_command_response, m),
            Message::Raw(m) => call(&mut self.unrecognized, m),
        };

        if !delivered {
            warn!(
                frame_type,
                message = message.name(),
                "No handler registered for API frame"
            );
        }
        delivered
    }

    /// Deliver frames in order and count the outcome.
    pub fn dispatch_all<I>(&mut self, frames: I) -> DispatchSummary
    where
        I: IntoIterator<Item = RawFrame>,
    {
        let mut summary = DispatchSummary::default();
        for frame in frames {
            if self.dispatch(frame) {
                summary.delivered += 1;
            } else {
                summary.unhandled += 1;
            }
        }
        summary
    }
}

fn call<T>(slot: &mut Option<Handler<T>>, message: &T) -> bool {
    match slot.as_mut() {
        Some(handler) => {
            handler(message);
            true
        }
        None => false,
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("at_command_response", &self.at_command_response.is_some())
            .field("modem_status", &self.modem_status.is_some())
            .field("transmit_status", &self.transmit_status.is_some())
            .field("receive_packet", &self.receive_packet.is_some())
            .field("explicit_receive_packet", &self.explicit_receive_packet.is_some())
            .field("node_identification", &self.node_identification.is_some())
            .field("remote_command_response", &self.remote_command_response.is_some())
            .field("unrecognized", &self.unrecognized.is_some())
            .field("raw", &self.raw.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn frame(data: Vec<u8>) -> RawFrame {
        RawFrame::from_payload(data).unwrap()
    }

    #[test]
    fn test_typed_handler_receives_message() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let mut dispatcher = Dispatcher::new();
        dispatcher.register(move |m: &ModemStatus| sink.lock().unwrap().push(m.status));

        assert!(dispatcher.dispatch(frame(vec![0x8A, 0x00])));
        assert!(dispatcher.dispatch(frame(vec![0x8A, 0x06])));
        assert_eq!(*seen.lock().unwrap(), vec![0, 6]);
    }

    #[test]
    fn test_unhandled_frames_are_counted() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(|_: &ModemStatus| {});

        let summary = dispatcher.dispatch_all(vec![
            frame(vec![0x8A, 0x00]),
            frame(vec![0x8B, 0x01]),
            frame(vec![0x42]),
        ]);
        assert_eq!(summary, DispatchSummary { delivered: 1, unhandled: 2 });
        assert_eq!(summary.total(), 3);
    }

    #[test]
    fn test_unrecognized_type_goes_to_raw_frame_slot() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let mut dispatcher = Dispatcher::new();
        dispatcher.register(move |f: &RawFrame| sink.lock().unwrap().push(f.frame_type));

        assert!(dispatcher.dispatch(frame(vec![0x42])));
        assert!(!dispatcher.dispatch(frame(vec![0x8A, 0x00])));
        assert_eq!(*seen.lock().unwrap(), vec![0x42]);
    }

    #[test]
    fn test_raw_handler_suppresses_typed_dispatch() {
        let typed = Arc::new(Mutex::new(0));
        let raw = Arc::new(Mutex::new(Vec::new()));
        let (typed_sink, raw_sink) = (typed.clone(), raw.clone());

        let mut dispatcher = Dispatcher::new();
        dispatcher.register(move |_: &ModemStatus| *typed_sink.lock().unwrap() += 1);
        dispatcher.set_raw_handler(move |f| raw_sink.lock().unwrap().push(f.clone()));

        let input = frame(vec![0x8A, 0x02]);
        assert!(dispatcher.dispatch(input.clone()));
        assert_eq!(*typed.lock().unwrap(), 0);
        assert_eq!(*raw.lock().unwrap(), vec![input]);

        dispatcher.clear_raw_handler();
        dispatcher.dispatch(frame(vec![0x8A, 0x02]));
        assert_eq!(*typed.lock().unwrap(), 1);
    }

    #[test]
    fn test_register_replaces_previous_handler() {
        let hits = Arc::new(Mutex::new(Vec::new()));
        let (first, second) = (hits.clone(), hits.clone());

        let mut dispatcher = Dispatcher::new();
        dispatcher.register(move |_: &ModemStatus| first.lock().unwrap().push("first"));
        dispatcher.register(move |_: &ModemStatus| second.lock().unwrap().push("second"));
        dispatcher.dispatch(frame(vec![0x8A, 0x00]));

        assert_eq!(*hits.lock().unwrap(), vec!["second"]);
        assert!(dispatcher.unregister::<ModemStatus>());
        assert!(!dispatcher.is_registered::<ModemStatus>());
    }
}
