//! Duplicate-Acknowledgement Loss Detection
//!
//! Watches the acknowledge numbers on inbound packets for the classic
//! fast-retransmit signal: the remote repeatedly acknowledging the same
//! cumulative point means it keeps receiving later data while an earlier
//! packet is missing. After a threshold of repeats the gap packet is
//! reported for immediate resend, without waiting for the retransmission
//! timeout.

use crate::packet::UtpPacket;
use crate::sequence::SeqNumber;

/// Consecutive duplicates required before the gap is reported
const DUPLICATE_ACK_THRESHOLD: u32 = 3;

/// Duplicate-acknowledgement detector
pub struct LossDetector {
    /// Most recent acknowledge number observed
    last_acknowledge_number: Option<SeqNumber>,
    /// How many times in a row it has repeated
    duplicate_count: u32,
}

impl LossDetector {
    pub fn new() -> Self {
        LossDetector {
            last_acknowledge_number: None,
            duplicate_count: 0,
        }
    }

    /// Inspect an inbound packet's acknowledge number.
    ///
    /// Returns the sequence number of the presumed-lost packet (the one
    /// directly after the repeated acknowledgement) once the duplicate
    /// threshold is reached. The caller resends it only if it is still
    /// outstanding.
    pub fn on_received_packet(&mut self, packet: &UtpPacket) -> Option<SeqNumber> {
        let ack = packet.header.acknowledge_number;

        if self.last_acknowledge_number == Some(ack) {
            self.duplicate_count += 1;
            if self.duplicate_count >= DUPLICATE_ACK_THRESHOLD {
                self.duplicate_count = 0;
                return Some(ack.next());
            }
        } else {
            self.last_acknowledge_number = Some(ack);
            self.duplicate_count = 0;
        }

        None
    }
}

impl Default for LossDetector {
    fn default() -> Self {
        Self::new()
    }
}
