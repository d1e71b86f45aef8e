//! uTP Protocol Core Implementation
//!
//! This crate implements the core of the uTP micro-transport protocol:
//! packet structures and wire serialization, the connection state machine,
//! acknowledgement tracking, loss detection, retransmission timing,
//! delay-based congestion control, adaptive payload sizing and in-order
//! reassembly of the inbound byte stream. All socket I/O stays behind the
//! [`DatagramSender`] seam so many connections can multiplex one channel.

pub mod ack;
pub mod congestion;
pub mod connection;
pub mod delay;
pub mod loss;
pub mod packet;
pub mod packet_size;
pub mod reorder;
pub mod sequence;
pub mod stream;
pub mod timeout;

pub use ack::AckTracker;
pub use congestion::CongestionWindow;
pub use connection::{
    Connection, ConnectionConfig, ConnectionState, DatagramSender, UtpError,
    DEFAULT_CONNECT_TIMEOUT,
};
pub use delay::DelayEstimator;
pub use loss::LossDetector;
pub use packet::{
    PacketError, PacketHeader, PacketType, UtpPacket, HEADER_SIZE, MAX_PACKET_SIZE,
    MAX_PAYLOAD_SIZE, MIN_PACKET_SIZE, PROTOCOL_VERSION,
};
pub use packet_size::PayloadSizer;
pub use reorder::InboundReorderer;
pub use sequence::SeqNumber;
pub use stream::{StreamState, UtpInputStream, UtpOutputStream};
pub use timeout::RetransmissionTimer;
