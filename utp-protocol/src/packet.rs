//! uTP Packet Structures and Serialization
//!
//! This module implements the uTP packet format: a 20-byte fixed header
//! followed by optional payload data. The header carries the packet type and
//! protocol version packed into one byte, the connection identifier, a
//! microsecond send timestamp, the echoed one-way delay, the advertised
//! window, and the 16-bit sequence/acknowledge numbers.

use crate::sequence::SeqNumber;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fmt;
use thiserror::Error;

/// Size of the uTP packet header in bytes
pub const HEADER_SIZE: usize = 20;

/// Protocol version carried in the low nibble of the first header byte
pub const PROTOCOL_VERSION: u8 = 1;

/// Smallest packet the protocol will ever transmit (header + minimal payload)
pub const MIN_PACKET_SIZE: usize = 150;

/// Largest datagram placed on the wire, chosen to stay under a 1500-byte MTU
pub const MAX_PACKET_SIZE: usize = 1400;

/// Maximum payload carried by a single DATA packet
pub const MAX_PAYLOAD_SIZE: usize = MAX_PACKET_SIZE - HEADER_SIZE;

/// uTP packet types (high nibble of the first header byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    /// Stream payload
    Data = 0,
    /// Acknowledgement without payload
    State = 1,
    /// End of stream
    Fin = 2,
    /// Forced teardown
    Reset = 3,
    /// Connection request
    Syn = 4,
}

impl PacketType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(PacketType::Data),
            1 => Some(PacketType::State),
            2 => Some(PacketType::Fin),
            3 => Some(PacketType::Reset),
            4 => Some(PacketType::Syn),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Whether packets of this type occupy the send window and await
    /// acknowledgement. STATE packets are pure acknowledgements and RESET
    /// is fire-and-forget; neither is ever confirmed by the remote.
    #[inline]
    pub fn is_acknowledgeable(self) -> bool {
        matches!(self, PacketType::Data | PacketType::Fin | PacketType::Syn)
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PacketType::Data => "ST_DATA",
            PacketType::State => "ST_STATE",
            PacketType::Fin => "ST_FIN",
            PacketType::Reset => "ST_RESET",
            PacketType::Syn => "ST_SYN",
        };
        write!(f, "{}", name)
    }
}

/// uTP packet header (20 bytes, network byte order)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketHeader {
    /// Packet type (high nibble of byte 0)
    pub packet_type: PacketType,
    /// Protocol version (low nibble of byte 0)
    pub version: u8,
    /// Extension indicator, 0 when no extensions are present
    pub extension: u8,
    /// Connection identifier as expected by the receiver
    pub connection_id: u16,
    /// Sender's local clock at transmission, in microseconds
    pub timestamp_micros: u32,
    /// Last one-way delay the sender measured, echoed back
    pub timestamp_difference_micros: u32,
    /// Bytes the sender currently has in flight
    pub window_size: u32,
    /// Sequence number, wraps modulo 65536
    pub sequence_number: SeqNumber,
    /// Acknowledge number, wraps modulo 65536
    pub acknowledge_number: SeqNumber,
}

impl PacketHeader {
    /// Stamp the fields that are only known at the moment of transmission.
    ///
    /// Called immediately before a packet is written to the wire; a
    /// retransmission re-stamps timestamp and delay but keeps its original
    /// acknowledge number.
    pub fn renew(&mut self, acknowledge_number: SeqNumber, timestamp_micros: u32, delay_micros: u32) {
        self.acknowledge_number = acknowledge_number;
        self.timestamp_micros = timestamp_micros;
        self.timestamp_difference_micros = delay_micros;
    }

    /// Parse a header from bytes (network byte order)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PacketError> {
        if bytes.len() < HEADER_SIZE {
            return Err(PacketError::InsufficientData {
                expected: HEADER_SIZE,
                actual: bytes.len(),
            });
        }

        let mut buf = &bytes[..HEADER_SIZE];
        let type_and_version = buf.get_u8();
        let version = type_and_version & 0x0F;
        if version != PROTOCOL_VERSION {
            return Err(PacketError::UnsupportedVersion(version));
        }

        let type_nibble = type_and_version >> 4;
        let packet_type =
            PacketType::from_u8(type_nibble).ok_or(PacketError::UnknownPacketType(type_nibble))?;

        Ok(PacketHeader {
            packet_type,
            version,
            extension: buf.get_u8(),
            connection_id: buf.get_u16(),
            timestamp_micros: buf.get_u32(),
            timestamp_difference_micros: buf.get_u32(),
            window_size: buf.get_u32(),
            sequence_number: SeqNumber::new(buf.get_u16()),
            acknowledge_number: SeqNumber::new(buf.get_u16()),
        })
    }

    /// Serialize the header to bytes (network byte order)
    pub fn to_bytes(&self, buf: &mut BytesMut) {
        buf.put_u8((self.packet_type.as_u8() << 4) | (self.version & 0x0F));
        buf.put_u8(self.extension);
        buf.put_u16(self.connection_id);
        buf.put_u32(self.timestamp_micros);
        buf.put_u32(self.timestamp_difference_micros);
        buf.put_u32(self.window_size);
        buf.put_u16(self.sequence_number.as_raw());
        buf.put_u16(self.acknowledge_number.as_raw());
    }
}

/// A uTP packet: header plus payload
///
/// Only DATA packets carry payload bytes; for every other type the payload
/// is empty and decoding rejects trailing bytes as inconsistent input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtpPacket {
    /// Packet header
    pub header: PacketHeader,
    /// Payload data (empty for non-DATA packets)
    pub payload: Bytes,
}

impl UtpPacket {
    /// Create a new packet
    pub fn new(header: PacketHeader, payload: Bytes) -> Self {
        UtpPacket { header, payload }
    }

    /// Get the packet type
    #[inline]
    pub fn packet_type(&self) -> PacketType {
        self.header.packet_type
    }

    /// Total size of the packet on the wire (header + payload)
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Serialize the packet to bytes
    pub fn to_bytes(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.wire_size());
        self.header.to_bytes(&mut buf);
        buf.put_slice(&self.payload);
        buf
    }

    /// Parse a packet from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PacketError> {
        let header = PacketHeader::from_bytes(bytes)?;

        let payload = if bytes.len() > HEADER_SIZE {
            if header.packet_type != PacketType::Data {
                return Err(PacketError::UnexpectedPayload {
                    packet_type: header.packet_type,
                    length: bytes.len() - HEADER_SIZE,
                });
            }
            Bytes::copy_from_slice(&bytes[HEADER_SIZE..])
        } else {
            Bytes::new()
        };

        Ok(UtpPacket { header, payload })
    }
}

/// Packet parsing and validation errors
#[derive(Error, Debug)]
pub enum PacketError {
    #[error("Insufficient data: expected {expected} bytes, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    #[error("Unknown packet type: {0}")]
    UnknownPacketType(u8),

    #[error("Unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    #[error("{length} payload bytes on a {packet_type} packet")]
    UnexpectedPayload {
        packet_type: PacketType,
        length: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_header(packet_type: PacketType) -> PacketHeader {
        PacketHeader {
            packet_type,
            version: PROTOCOL_VERSION,
            extension: 0,
            connection_id: 4660,
            timestamp_micros: 1_000_000,
            timestamp_difference_micros: 50_000,
            window_size: 12_000,
            sequence_number: SeqNumber::new(100),
            acknowledge_number: SeqNumber::new(99),
        }
    }

    #[test]
    fn test_packet_type_nibbles() {
        assert_eq!(PacketType::from_u8(0), Some(PacketType::Data));
        assert_eq!(PacketType::from_u8(1), Some(PacketType::State));
        assert_eq!(PacketType::from_u8(2), Some(PacketType::Fin));
        assert_eq!(PacketType::from_u8(3), Some(PacketType::Reset));
        assert_eq!(PacketType::from_u8(4), Some(PacketType::Syn));
        assert_eq!(PacketType::from_u8(5), None);
    }

    #[test]
    fn test_header_roundtrip() {
        let header = test_header(PacketType::Data);

        let mut buf = BytesMut::new();
        header.to_bytes(&mut buf);
        assert_eq!(buf.len(), HEADER_SIZE);

        let decoded = PacketHeader::from_bytes(&buf).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_data_packet_roundtrip() {
        let payload = Bytes::from_static(b"Hello, uTP!");
        let packet = UtpPacket::new(test_header(PacketType::Data), payload.clone());

        let bytes = packet.to_bytes();
        assert_eq!(bytes.len(), HEADER_SIZE + payload.len());

        let decoded = UtpPacket::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_control_packet_roundtrip() {
        for packet_type in [
            PacketType::Syn,
            PacketType::State,
            PacketType::Fin,
            PacketType::Reset,
        ] {
            let packet = UtpPacket::new(test_header(packet_type), Bytes::new());
            let bytes = packet.to_bytes();
            assert_eq!(bytes.len(), HEADER_SIZE);

            let decoded = UtpPacket::from_bytes(&bytes).unwrap();
            assert_eq!(decoded, packet);
        }
    }

    #[test]
    fn test_truncated_header() {
        let header = test_header(PacketType::Data);
        let mut buf = BytesMut::new();
        header.to_bytes(&mut buf);

        let err = PacketHeader::from_bytes(&buf[..HEADER_SIZE - 1]).unwrap_err();
        assert!(matches!(err, PacketError::InsufficientData { .. }));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let mut buf = BytesMut::new();
        test_header(PacketType::Data).to_bytes(&mut buf);
        buf[0] = (9 << 4) | PROTOCOL_VERSION;

        let err = PacketHeader::from_bytes(&buf).unwrap_err();
        assert!(matches!(err, PacketError::UnknownPacketType(9)));
    }

    #[test]
    fn test_wrong_version_rejected() {
        let mut buf = BytesMut::new();
        test_header(PacketType::Data).to_bytes(&mut buf);
        buf[0] = PacketType::Data.as_u8() << 4; // version 0

        let err = PacketHeader::from_bytes(&buf).unwrap_err();
        assert!(matches!(err, PacketError::UnsupportedVersion(0)));
    }

    #[test]
    fn test_payload_on_state_packet_rejected() {
        let mut buf = BytesMut::new();
        test_header(PacketType::State).to_bytes(&mut buf);
        buf.put_slice(b"bogus");

        let err = UtpPacket::from_bytes(&buf).unwrap_err();
        assert!(matches!(err, PacketError::UnexpectedPayload { .. }));
    }

    #[test]
    fn test_renew_keeps_sequence_number() {
        let mut header = test_header(PacketType::Data);
        header.renew(SeqNumber::new(123), 42, 7);

        assert_eq!(header.acknowledge_number, SeqNumber::new(123));
        assert_eq!(header.timestamp_micros, 42);
        assert_eq!(header.timestamp_difference_micros, 7);
        assert_eq!(header.sequence_number, SeqNumber::new(100));
    }

    #[test]
    fn test_acknowledgeable_types() {
        assert!(PacketType::Data.is_acknowledgeable());
        assert!(PacketType::Syn.is_acknowledgeable());
        assert!(PacketType::Fin.is_acknowledgeable());
        assert!(!PacketType::State.is_acknowledgeable());
        assert!(!PacketType::Reset.is_acknowledgeable());
    }
}
