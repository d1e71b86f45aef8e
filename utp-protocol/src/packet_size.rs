//! Adaptive Payload Sizing
//!
//! Tracks how many bytes are placed into one outbound packet. The size
//! starts at the protocol minimum, grows one step at a time once enough
//! bytes have been delivered cleanly at the current size, shrinks when a
//! loss is observed, and falls back to the minimum after a timeout.

use crate::packet::{HEADER_SIZE, MAX_PACKET_SIZE, MIN_PACKET_SIZE};

/// Bytes added to the packet size per growth step
const SIZE_INCREASE_STEP: usize = 150;

/// Packets'-worth of confirmed bytes required before a growth step
const GROWTH_BUDGET_PACKETS: usize = 10;

/// Adaptive packet size tracker
pub struct PayloadSizer {
    /// Current total packet size (header included)
    packet_size: usize,
    /// Confirmed bytes accumulated toward the next growth step
    confirmed_since_growth: usize,
}

impl PayloadSizer {
    pub fn new() -> Self {
        PayloadSizer {
            packet_size: MIN_PACKET_SIZE,
            confirmed_since_growth: 0,
        }
    }

    /// Total bytes a packet currently occupies on the wire
    pub fn packet_size(&self) -> usize {
        self.packet_size
    }

    /// Bytes of payload a packet currently holds
    pub fn payload_size(&self) -> usize {
        self.packet_size - HEADER_SIZE
    }

    /// Feed the bytes confirmed by an inbound packet. Once a growth
    /// budget's worth has been delivered without loss, step the size up.
    pub fn on_received_packet(&mut self, confirmed_bytes: usize) {
        if self.packet_size >= MAX_PACKET_SIZE {
            return;
        }

        self.confirmed_since_growth += confirmed_bytes;
        if self.confirmed_since_growth >= GROWTH_BUDGET_PACKETS * self.packet_size {
            self.packet_size = (self.packet_size + SIZE_INCREASE_STEP).min(MAX_PACKET_SIZE);
            self.confirmed_since_growth = 0;
        }
    }

    /// A packet was lost: shrink by a quarter, never below the minimum.
    pub fn on_packet_loss(&mut self) {
        self.packet_size = (self.packet_size * 3 / 4).max(MIN_PACKET_SIZE);
        self.confirmed_since_growth = 0;
    }

    /// The retransmission timeout fired: fall back to the minimum.
    pub fn on_timeout(&mut self) {
        self.packet_size = MIN_PACKET_SIZE;
        self.confirmed_since_growth = 0;
    }
}

impl Default for PayloadSizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_minimum() {
        let sizer = PayloadSizer::new();
        assert_eq!(sizer.packet_size(), MIN_PACKET_SIZE);
        assert_eq!(sizer.payload_size(), MIN_PACKET_SIZE - HEADER_SIZE);
    }

    #[test]
    fn test_grows_after_budget() {
        let mut sizer = PayloadSizer::new();

        sizer.on_received_packet(GROWTH_BUDGET_PACKETS * MIN_PACKET_SIZE);
        assert_eq!(sizer.packet_size(), MIN_PACKET_SIZE + SIZE_INCREASE_STEP);
    }

    #[test]
    fn test_growth_is_capped() {
        let mut sizer = PayloadSizer::new();

        for _ in 0..1000 {
            sizer.on_received_packet(GROWTH_BUDGET_PACKETS * MAX_PACKET_SIZE);
        }
        assert_eq!(sizer.packet_size(), MAX_PACKET_SIZE);
    }

    #[test]
    fn test_loss_shrinks_and_never_below_minimum() {
        let mut sizer = PayloadSizer::new();
        for _ in 0..1000 {
            sizer.on_received_packet(GROWTH_BUDGET_PACKETS * MAX_PACKET_SIZE);
        }

        loop {
            let before = sizer.packet_size();
            sizer.on_packet_loss();
            assert!(sizer.packet_size() <= before);
            if sizer.packet_size() == MIN_PACKET_SIZE {
                break;
            }
        }

        sizer.on_packet_loss();
        assert_eq!(sizer.packet_size(), MIN_PACKET_SIZE);
    }

    #[test]
    fn test_loss_resets_growth_budget() {
        let mut sizer = PayloadSizer::new();

        sizer.on_received_packet(GROWTH_BUDGET_PACKETS * MIN_PACKET_SIZE - 1);
        sizer.on_packet_loss();
        sizer.on_received_packet(1);
        assert_eq!(sizer.packet_size(), MIN_PACKET_SIZE);
    }

    #[test]
    fn test_timeout_resets_to_minimum() {
        let mut sizer = PayloadSizer::new();
        for _ in 0..10 {
            sizer.on_received_packet(GROWTH_BUDGET_PACKETS * MAX_PACKET_SIZE);
        }
        assert!(sizer.packet_size() > MIN_PACKET_SIZE);

        sizer.on_timeout();
        assert_eq!(sizer.packet_size(), MIN_PACKET_SIZE);
    }
}
