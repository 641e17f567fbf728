//! Scenarios against a real or virtual CAN interface.
//!
//! Set `CANLINK_TEST_IFACE` (e.g. `vcan0`) to run them; they skip otherwise.
#![cfg(target_os = "linux")]

use std::time::Duration;

use canlink_frame::{chunk_message, CanFrame, Delivery, FrameError, FrameReader, FrameWriter};
use canlink_transport::{CanSocket, ChannelConfig, FilterMode, FilterRule, SetupStage};

const READ_TIMEOUT: Duration = Duration::from_millis(200);

fn iface_name() -> Option<String> {
    std::env::var("CANLINK_TEST_IFACE").ok()
}

#[test]
fn filter_delivers_only_matching_identifier() {
    let iface = match iface_name() {
        Some(name) => name,
        None => {
            eprintln!("skipping: set CANLINK_TEST_IFACE");
            return;
        }
    };

    let rx_cfg = ChannelConfig::raw(FilterMode::Only(FilterRule::standard(0x123)))
        .with_read_timeout(Some(READ_TIMEOUT));
    let rx = CanSocket::open(&iface, &rx_cfg).expect("filtered socket should open");
    let injector_cfg = ChannelConfig::raw(FilterMode::AcceptAll).with_loopback(true);
    let injector = CanSocket::open(&iface, &injector_cfg).expect("injector should open");

    let mut writer = FrameWriter::new(&injector);
    writer
        .write_frame(&CanFrame::new(0x456, b"blocked").unwrap())
        .unwrap();
    writer
        .write_frame(&CanFrame::new(0x123, b"passed").unwrap())
        .unwrap();

    let mut reader = FrameReader::raw(&rx);
    match reader.read().expect("matching frame should arrive") {
        Delivery::Frame(frame) => {
            assert_eq!(frame.id(), 0x123);
            assert_eq!(frame.data(), b"passed");
        }
        other => panic!("unexpected delivery: {other:?}"),
    }
    assert!(matches!(reader.read(), Err(FrameError::TimedOut)));
}

#[test]
fn chunked_message_arrives_in_order() {
    let iface = match iface_name() {
        Some(name) => name,
        None => {
            eprintln!("skipping: set CANLINK_TEST_IFACE");
            return;
        }
    };

    let rx_cfg = ChannelConfig::raw(FilterMode::Only(FilterRule::standard(0x321)))
        .with_read_timeout(Some(READ_TIMEOUT));
    let rx = CanSocket::open(&iface, &rx_cfg).expect("receiver should open");
    let tx_cfg = ChannelConfig::raw(FilterMode::AcceptAll).with_loopback(true);
    let tx = CanSocket::open(&iface, &tx_cfg).expect("sender should open");

    let message = b"hello world hello can";
    let mut writer = FrameWriter::new(&tx);
    for frame in chunk_message(0x321, message).unwrap() {
        writer.write_frame(&frame).unwrap();
    }

    let mut reader = FrameReader::raw(&rx);
    let mut joined = Vec::new();
    for _ in 0..3 {
        joined.extend_from_slice(reader.read().unwrap().payload());
    }
    assert_eq!(joined, message);
}

#[test]
fn isotp_hundred_byte_message_reassembled() {
    let iface = match iface_name() {
        Some(name) => name,
        None => {
            eprintln!("skipping: set CANLINK_TEST_IFACE");
            return;
        }
    };

    let tester = match CanSocket::open(&iface, &ChannelConfig::isotp(0x7E0, 0x7E8)) {
        Ok(sock) => sock,
        Err(err) if err.stage() == Some(SetupStage::Socket) => {
            eprintln!("skipping: can-isotp not available: {err}");
            return;
        }
        Err(err) => panic!("iso-tp open failed: {err}"),
    };
    let ecu_cfg =
        ChannelConfig::isotp(0x7E8, 0x7E0).with_read_timeout(Some(Duration::from_secs(2)));
    let ecu = CanSocket::open(&iface, &ecu_cfg).expect("peer iso-tp socket should open");

    let payload: Vec<u8> = (0..100).collect();
    let sender = std::thread::spawn(move || {
        let mut writer = FrameWriter::new(tester);
        writer.write_message(&payload).expect("iso-tp send");
        payload
    });

    let mut reader = FrameReader::isotp(&ecu);
    let delivery = reader.read().expect("message should be reassembled");
    let payload = sender.join().expect("sender thread");

    assert!(matches!(delivery, Delivery::Message(_)));
    assert_eq!(delivery.payload().len(), 100);
    assert_eq!(delivery.payload(), payload.as_slice());
}
