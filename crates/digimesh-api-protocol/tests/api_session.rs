//! Integration tests for the API frame protocol: assembly under arbitrary
//! chunking, request encoding, decoding and session dispatch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use digimesh_api_protocol::*;
use digimesh_common::{ByteSink, Command, Transport, TransportError};
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Records every write; stands in for the serial port.
#[derive(Debug, Default)]
struct RecordingTransport {
    writes: Mutex<Vec<Vec<u8>>>,
    closed: AtomicBool,
}

impl Transport for RecordingTransport {
    fn write(&self, bytes: &[u8]) -> Result<(), TransportError> {
        self.writes.lock().push(bytes.to_vec());
        Ok(())
    }

    fn is_open(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }
}

/// Build an inbound frame as the radio would send it.
fn device_frame(frame_type: u8, body: &[u8]) -> Vec<u8> {
    let mut builder = FrameBuilder::new(frame_type);
    builder.extend(body);
    builder.finish().expect("frame fits")
}

fn receive_packet_frame(source: u64, options: u8, data: &[u8]) -> Vec<u8> {
    let mut body = source.to_be_bytes().to_vec();
    body.extend_from_slice(&[0xFF, 0xFE, options]);
    body.extend_from_slice(data);
    device_frame(FRAME_RECEIVE_PACKET, &body)
}

fn sample_stream() -> (Vec<u8>, Vec<RawFrame>) {
    let wires = vec![
        device_frame(FRAME_MODEM_STATUS, &[0x06]),
        encode_at_command(Command::NodeIdentifier, b"gateway", 3).unwrap(),
        receive_packet_frame(0x0013_A200_40A1_B2C3, 0x01, b"0123456789"),
        device_frame(FRAME_TRANSMIT_STATUS, &[0x04, 0xFF, 0xFE, 0x00, 0x00, 0x00]),
        device_frame(0x42, &[]),
    ];

    let mut stream = vec![0x11, 0x22];
    let mut expected = Vec::new();
    for wire in wires {
        expected.push(RawFrame::from_payload(wire[3..wire.len() - 1].to_vec()).unwrap());
        stream.extend_from_slice(&wire);
        stream.push(0x00);
    }
    (stream, expected)
}

// ============================================================================
// Assembler
// ============================================================================

#[test]
fn test_assembler_is_chunking_invariant() {
    let (stream, expected) = sample_stream();

    let mut whole = Assembler::new();
    assert_eq!(whole.feed(&stream), expected);

    let mut rng = ChaCha8Rng::seed_from_u64(0x7E);
    for _ in 0..50 {
        let mut assembler = Assembler::new();
        let mut frames = Vec::new();
        let mut rest = stream.as_slice();
        while !rest.is_empty() {
            let take = rng.gen_range(1..=rest.len().min(17));
            let (chunk, tail) = rest.split_at(take);
            frames.extend(assembler.feed(chunk));
            rest = tail;
        }
        assert_eq!(frames, expected);
        assert_eq!(assembler.stats(), whole.stats());
    }
}

#[test]
fn test_encoded_requests_round_trip_through_assembler() {
    let requests = vec![
        ApiRequest::AtCommand {
            command: Command::NetworkDiscover,
            params: vec![],
        },
        ApiRequest::QueuedAtCommand {
            command: Command::NodeIdentifier,
            params: b"relay-7".to_vec(),
        },
        ApiRequest::TransmitRequest {
            options: TransmitRequestOptions::unicast(0x0013_A200_0000_0042),
            payload: vec![0x7E; 40],
        },
    ];

    let mut assembler = Assembler::new();
    for (i, request) in requests.iter().enumerate() {
        let wire = request.encode(i as u8 + 1).unwrap();
        let frames = assembler.feed(&wire);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].frame_type, request.frame_type());
        assert_eq!(frames[0].data, wire[3..wire.len() - 1].to_vec());
    }
}

#[test]
fn test_single_byte_corruption_fails_checksum() {
    let wire = receive_packet_frame(0x0013_A200_0000_0001, 0x00, b"payload");

    for index in 3..wire.len() - 1 {
        let mut corrupted = wire.clone();
        corrupted[index] ^= 0x5A;

        let mut assembler = Assembler::new();
        assert!(assembler.feed(&corrupted).is_empty(), "byte {} not caught", index);
        assert_eq!(assembler.stats().checksum_failures, 1);
    }
}

// ============================================================================
// Encoding
// ============================================================================

#[test]
fn test_frame_ids_wrap_over_300_acked_requests() {
    let mut session = ApiSession::new(RecordingTransport::default());

    let ids: Vec<u8> = (0..300)
        .map(|_| session.send_at_command(Command::Temperature, &[], true).unwrap())
        .collect();

    let expected: Vec<u8> = (1..=255u8).chain(1..=45u8).collect();
    assert_eq!(ids, expected);
    assert!(!ids.contains(&0));

    let writes = session.transport().writes.lock();
    for (wire, id) in writes.iter().zip(&ids) {
        assert_eq!(wire[4], *id);
    }
}

#[test]
fn test_unacked_requests_leave_counter_alone() {
    let mut session = ApiSession::new(RecordingTransport::default());
    for _ in 0..10 {
        assert_eq!(
            session
                .send_queued_at_command(Command::ApiMode, &[1], false)
                .unwrap(),
            0
        );
    }
    assert_eq!(session.send_at_command(Command::ApplyChanges, &[], true).unwrap(), 1);
}

#[test]
fn test_broadcast_without_ack() {
    let mut session = ApiSession::new(RecordingTransport::default());
    let id = session
        .send_transmit_request(&TransmitRequestOptions::default(), b"0123", false)
        .unwrap();
    assert_eq!(id, 0);

    let writes = session.transport().writes.lock();
    let wire = &writes[0];
    assert_eq!(wire[3], FRAME_TRANSMIT_REQUEST);
    assert_eq!(wire[4], 0);
    assert_eq!(&wire[5..13], &0xFFFFu64.to_be_bytes());
    assert_eq!(&wire[13..15], &[0xFF, 0xFE]);
    assert_eq!(wire[16], TX_OPTION_ENABLE_ACK | TX_OPTION_ROUTE_DISCOVERY);
    assert_eq!(&wire[17..21], b"0123");
    assert_eq!(wire.len(), 22);
}

#[test]
fn test_oversized_transmit_is_rejected_before_write() {
    let mut session = ApiSession::new(RecordingTransport::default());
    let payload = vec![0u8; 70_000];
    let err = session
        .send_transmit_request(&TransmitRequestOptions::default(), &payload, true)
        .unwrap_err();

    assert!(matches!(err, ApiError::FrameTooLong { .. }));
    assert!(session.transport().writes.lock().is_empty());
}

// ============================================================================
// Decoding and dispatch
// ============================================================================

#[test]
fn test_receive_packet_decode() {
    let wire = receive_packet_frame(0x0013_A200_40A1_B2C3, 0x02, b"hello");
    let mut assembler = Assembler::new();
    let frame = assembler.feed(&wire).remove(0);

    let Message::ReceivePacket(packet) = Message::decode(frame) else {
        panic!("expected receive packet");
    };
    assert_eq!(packet.id, 0x00);
    assert_eq!(packet.source_address, 0x0013_A200_40A1_B2C3);
    assert_eq!(packet.receive_options, 0x02);
    assert_eq!(packet.data, b"hello");
}

#[test]
fn test_node_discovery_response_round_trip() {
    let node = NodeIdentificationIndicator {
        source_network_address: 0xFFFE,
        source_address: 0x0013_A200_4155_7E01,
        network_identifier: "rooftop".to_string(),
        parent_network_address: 0xFFFE,
        device_type: 0,
        status: 0,
        profile_id: 0xC105,
        manufacturer_id: 0x101E,
    };

    let mut body = vec![0x05, b'N', b'D', 0x00];
    body.extend_from_slice(&node.to_discovery_payload());
    let wire = device_frame(FRAME_AT_COMMAND_RESPONSE, &body);

    let mut session = ApiSession::new(RecordingTransport::default());
    let found = Arc::new(Mutex::new(Vec::new()));
    let sink = found.clone();
    session.handlers().register(move |r: &AtCommandResponse| {
        if &r.command == b"ND" {
            sink.lock()
                .push(NodeIdentificationIndicator::from_discovery_payload(&r.data));
        }
    });

    session.inbox().deliver(&wire);
    assert_eq!(session.drain_and_dispatch().delivered, 1);
    assert_eq!(*found.lock(), vec![node]);
}

#[test]
fn test_drain_preserves_order_and_counts_unhandled() {
    let (stream, _) = sample_stream();
    let mut session = ApiSession::new(RecordingTransport::default());

    let order = Arc::new(Mutex::new(Vec::new()));
    let (a, b, c) = (order.clone(), order.clone(), order.clone());
    session.handlers().register(move |_: &ModemStatus| a.lock().push("modem"));
    session.handlers().register(move |_: &ReceivePacket| b.lock().push("rx"));
    session.handlers().register(move |_: &TransmitStatus| c.lock().push("tx-status"));

    session.inbox().deliver(&stream);
    let summary = session.drain_and_dispatch();

    // The echoed AT command (0x08) and the 0x42 frame have no handler.
    assert_eq!(summary, DispatchSummary { delivered: 3, unhandled: 2 });
    assert_eq!(*order.lock(), vec!["modem", "rx", "tx-status"]);
}

#[test]
fn test_receive_thread_and_control_thread() {
    let mut session = ApiSession::new(RecordingTransport::default());
    let inbox = session.inbox();

    let count = Arc::new(Mutex::new(0usize));
    let sink = count.clone();
    session
        .handlers()
        .register(move |_: &ReceivePacket| *sink.lock() += 1);

    let producer = thread::spawn(move || {
        let wire = receive_packet_frame(0x0013_A200_0000_0009, 0, b"tick");
        for _ in 0..200 {
            for chunk in wire.chunks(5) {
                inbox.deliver(chunk);
            }
        }
    });

    let mut delivered = 0;
    while !producer.is_finished() {
        delivered += session.drain_and_dispatch().delivered;
        thread::yield_now();
    }
    producer.join().unwrap();
    delivered += session.drain_and_dispatch().delivered;

    assert_eq!(delivered, 200);
    assert_eq!(*count.lock(), 200);
}
