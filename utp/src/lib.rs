//! uTP - Micro Transport Protocol
//!
//! High-level Rust API for the uTP reliable transport over UDP.

pub use utp_io as io;
pub use utp_protocol as protocol;

// Re-export commonly used types
pub use protocol::{Connection, PacketType, SeqNumber, UtpError, UtpPacket};
