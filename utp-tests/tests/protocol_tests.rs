//! Integration tests for uTP packet handling

use bytes::Bytes;
use utp_protocol::packet::{
    PacketError, PacketHeader, PacketType, UtpPacket, HEADER_SIZE, PROTOCOL_VERSION,
};
use utp_protocol::sequence::SeqNumber;

fn header(packet_type: PacketType) -> PacketHeader {
    PacketHeader {
        packet_type,
        version: PROTOCOL_VERSION,
        extension: 0,
        connection_id: 0xABCD,
        timestamp_micros: 123_456,
        timestamp_difference_micros: 7_890,
        window_size: 48_000,
        sequence_number: SeqNumber::new(65_534),
        acknowledge_number: SeqNumber::new(65_533),
    }
}

#[test]
fn test_data_packet_roundtrip() {
    let payload = Bytes::from_static(b"Hello, uTP!");
    let packet = UtpPacket::new(header(PacketType::Data), payload.clone());

    let serialized = packet.to_bytes();
    let deserialized = UtpPacket::from_bytes(&serialized).unwrap();

    assert_eq!(deserialized.header.packet_type, PacketType::Data);
    assert_eq!(deserialized.header.connection_id, 0xABCD);
    assert_eq!(deserialized.header.timestamp_micros, 123_456);
    assert_eq!(deserialized.header.timestamp_difference_micros, 7_890);
    assert_eq!(deserialized.header.window_size, 48_000);
    assert_eq!(deserialized.header.sequence_number, SeqNumber::new(65_534));
    assert_eq!(deserialized.header.acknowledge_number, SeqNumber::new(65_533));
    assert_eq!(deserialized.payload, payload);
}

#[test]
fn test_every_packet_type_roundtrips() {
    for packet_type in [
        PacketType::Data,
        PacketType::State,
        PacketType::Fin,
        PacketType::Reset,
        PacketType::Syn,
    ] {
        let payload = if packet_type == PacketType::Data {
            Bytes::from_static(b"payload")
        } else {
            Bytes::new()
        };
        let packet = UtpPacket::new(header(packet_type), payload);

        let decoded = UtpPacket::from_bytes(&packet.to_bytes()).unwrap();
        assert_eq!(decoded, packet);
    }
}

#[test]
fn test_header_is_twenty_bytes() {
    let packet = UtpPacket::new(header(PacketType::State), Bytes::new());
    assert_eq!(packet.to_bytes().len(), HEADER_SIZE);
    assert_eq!(packet.wire_size(), 20);
}

#[test]
fn test_truncated_input_rejected() {
    let packet = UtpPacket::new(header(PacketType::Data), Bytes::from_static(b"x"));
    let bytes = packet.to_bytes();

    for cut in 0..HEADER_SIZE {
        let err = UtpPacket::from_bytes(&bytes[..cut]).unwrap_err();
        assert!(matches!(err, PacketError::InsufficientData { .. }));
    }
}

#[test]
fn test_payload_only_on_data() {
    let packet = UtpPacket::new(header(PacketType::Fin), Bytes::new());
    let mut bytes = packet.to_bytes().to_vec();
    bytes.extend_from_slice(b"trailing");

    let err = UtpPacket::from_bytes(&bytes).unwrap_err();
    assert!(matches!(err, PacketError::UnexpectedPayload { .. }));
}

#[test]
fn test_type_and_version_share_first_byte() {
    let packet = UtpPacket::new(header(PacketType::Syn), Bytes::new());
    let bytes = packet.to_bytes();

    assert_eq!(bytes[0] >> 4, PacketType::Syn.as_u8());
    assert_eq!(bytes[0] & 0x0F, PROTOCOL_VERSION);
}
