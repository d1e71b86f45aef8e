//! Acknowledgement Tracking
//!
//! Tracks packets that have been transmitted but not yet confirmed and,
//! for every inbound acknowledge number, determines which of them are newly
//! confirmed. Confirmation is cumulative: an acknowledge number confirms
//! every outstanding packet at or before it, with comparisons aware of the
//! 16-bit wraparound. A packet is reported as confirmed at most once.

use crate::packet::UtpPacket;
use crate::sequence::SeqNumber;

/// Outstanding-packet tracker
pub struct AckTracker {
    /// Sent, unconfirmed packets in send order
    outstanding: Vec<UtpPacket>,
}

impl AckTracker {
    pub fn new() -> Self {
        AckTracker {
            outstanding: Vec::new(),
        }
    }

    /// Register a transmitted packet.
    ///
    /// Only packet types the remote acknowledges are tracked. A
    /// retransmission replaces the stored copy so later round-trip samples
    /// reflect the latest transmission.
    pub fn on_sent_packet(&mut self, packet: &UtpPacket) {
        if !packet.packet_type().is_acknowledgeable() {
            return;
        }

        let seq = packet.header.sequence_number;
        if let Some(existing) = self
            .outstanding
            .iter_mut()
            .find(|p| p.header.sequence_number == seq)
        {
            *existing = packet.clone();
        } else {
            self.outstanding.push(packet.clone());
        }
    }

    /// Consume an inbound packet's acknowledge number and return the
    /// outstanding packets it newly confirms, in send order.
    pub fn on_received_packet(&mut self, packet: &UtpPacket) -> Vec<UtpPacket> {
        let ack = packet.header.acknowledge_number;

        let mut confirmed = Vec::new();
        self.outstanding.retain(|sent| {
            if sent.header.sequence_number.le(ack) {
                confirmed.push(sent.clone());
                false
            } else {
                true
            }
        });

        confirmed
    }

    /// Look up an outstanding packet by sequence number
    pub fn get(&self, seq: SeqNumber) -> Option<&UtpPacket> {
        self.outstanding
            .iter()
            .find(|p| p.header.sequence_number == seq)
    }

    /// Iterate the outstanding packets in send order
    pub fn outstanding(&self) -> impl Iterator<Item = &UtpPacket> {
        self.outstanding.iter()
    }

    /// Whether nothing is awaiting confirmation
    pub fn is_empty(&self) -> bool {
        self.outstanding.is_empty()
    }

    /// Number of packets awaiting confirmation
    pub fn len(&self) -> usize {
        self.outstanding.len()
    }
}

impl Default for AckTracker {
    fn default() -> Self {
        Self::new()
    }
}
